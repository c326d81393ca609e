//! Dynamic metadata form.
//!
//! The form is built in two passes. Pass one creates a control for every
//! field in schema order. Pass two wires dependent dropdowns and auto fields
//! to their parent controls, which by then all exist.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

use super::controls::{AutoDisplay, Control, InputControl, InputType, SelectControl};
use super::dependent::populate_dependent_select;
use crate::domain::{FieldKind, FieldSpec, FormSchema};
use crate::error::{WizardError, WizardResult};
use crate::services::Draft;

/// Choice value that unlocks a free-text write-in.
pub const OTHER_CHOICE: &str = "Other";

/// Suffix of the metadata key holding an `Other` write-in.
pub const OTHER_SUFFIX: &str = "_other";

/// One field of the form with its control and validation marker.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub spec: FieldSpec,
    pub control: Control,
    /// Set when the last validation found the field blank.
    pub invalid: bool,
}

impl FormField {
    /// Inline error text, present for required fields only.
    pub fn error_message(&self) -> Option<String> {
        self.spec
            .required
            .then(|| format!("{} is required", self.spec.label))
    }

    /// Whether the inline error is currently shown.
    pub fn error_visible(&self) -> bool {
        self.invalid
    }
}

#[derive(Debug, Clone)]
pub struct MetadataForm {
    fields: Vec<FormField>,
    index: HashMap<String, usize>,
    /// Parent index → indices of fields wired to it, in schema order.
    dependents: HashMap<usize, Vec<usize>>,
    lookups: HashMap<usize, BTreeMap<String, String>>,
    other_values: BTreeMap<String, String>,
}

/// Build the metadata form, restoring values from `draft`.
///
/// `today` seeds date fields that have no saved value.
pub fn build_form(
    schema: &FormSchema,
    draft: &Draft,
    today: NaiveDate,
) -> WizardResult<MetadataForm> {
    let mut form = MetadataForm {
        fields: Vec::with_capacity(schema.metadata_fields.len()),
        index: HashMap::new(),
        dependents: HashMap::new(),
        lookups: HashMap::new(),
        other_values: BTreeMap::new(),
    };

    // Pass 1: create every control
    for spec in &schema.metadata_fields {
        if form.index.contains_key(&spec.id) {
            return Err(WizardError::Schema(format!("duplicate field id '{}'", spec.id)));
        }
        if let Some(parent) = spec.kind.parent() {
            if !form.index.contains_key(parent) {
                return Err(WizardError::Schema(format!(
                    "field '{}' depends on '{}', which is not an earlier field",
                    spec.id, parent
                )));
            }
        }

        let saved = draft.get(&spec.id).map(String::as_str);
        let control = create_control(spec, saved, today, schema);

        if spec.kind.is_choice() {
            let other_key = format!("{}{}", spec.id, OTHER_SUFFIX);
            if let Some(other) = draft.get(&other_key) {
                form.other_values.insert(spec.id.clone(), other.clone());
            }
        }

        form.index.insert(spec.id.clone(), form.fields.len());
        form.fields.push(FormField {
            spec: spec.clone(),
            control,
            invalid: false,
        });
    }

    // Pass 2: wire children to parents and populate from restored values
    for i in 0..form.fields.len() {
        let Some(parent) = form.fields[i].spec.kind.parent() else {
            continue;
        };
        let parent_idx = form.index[parent];
        form.dependents.entry(parent_idx).or_default().push(i);

        if let FieldKind::Auto { lookup_from, .. } = &form.fields[i].spec.kind {
            let table = schema.lookup_table(lookup_from).unwrap_or_else(|| {
                warn!(
                    field = %form.fields[i].spec.id,
                    table = %lookup_from,
                    "Lookup table missing"
                );
                BTreeMap::new()
            });
            form.lookups.insert(i, table);
        }

        // A dependent select under a blank parent keeps its "Select <parent> first" placeholder
        let is_dependent = matches!(form.fields[i].spec.kind, FieldKind::DependentSelect { .. });
        if is_dependent && form.fields[parent_idx].control.value().is_empty() {
            continue;
        }
        let saved = draft.get(&form.fields[i].spec.id).cloned();
        form.refresh(i, saved.as_deref());
    }

    debug!(
        fields = form.fields.len(),
        restored = draft.len(),
        "Metadata form built"
    );
    Ok(form)
}

fn create_control(
    spec: &FieldSpec,
    saved: Option<&str>,
    today: NaiveDate,
    schema: &FormSchema,
) -> Control {
    match &spec.kind {
        FieldKind::Text => Control::Input(InputControl {
            input_type: InputType::Text,
            value: saved.unwrap_or_default().to_string(),
            placeholder: label_placeholder(&spec.label),
        }),
        FieldKind::Email => Control::Input(InputControl {
            input_type: InputType::Email,
            value: saved.unwrap_or_default().to_string(),
            placeholder: label_placeholder(&spec.label),
        }),
        FieldKind::Date => Control::Input(InputControl {
            input_type: InputType::Date,
            value: saved
                .map(str::to_string)
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            placeholder: String::new(),
        }),
        FieldKind::Select { options } => Control::Select(SelectControl::with_choices(
            &select_placeholder(&spec.label),
            options,
            saved,
        )),
        FieldKind::DependentSelect { depends_on, .. } => {
            let parent_label = schema
                .field(depends_on)
                .map(|p| p.label.as_str())
                .unwrap_or(depends_on);
            Control::Select(SelectControl::disabled_placeholder(&format!(
                "Select {parent_label} first"
            )))
        }
        FieldKind::Auto { .. } => Control::Auto(AutoDisplay::resolve(None)),
    }
}

fn label_placeholder(label: &str) -> String {
    format!("Enter {}", label.to_lowercase())
}

fn select_placeholder(label: &str) -> String {
    format!("Select {}...", label.to_lowercase())
}

impl MetadataForm {
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    pub fn control(&self, id: &str) -> Option<&Control> {
        self.field(id).map(|f| &f.control)
    }

    pub fn value(&self, id: &str) -> Option<&str> {
        self.control(id).map(Control::value)
    }

    /// Change a field the way a user would, updating wired children.
    pub fn set_value(&mut self, id: &str, value: &str) -> WizardResult<()> {
        let i = *self
            .index
            .get(id)
            .ok_or_else(|| WizardError::InvalidInput(format!("Unknown field '{id}'")))?;

        let field = &mut self.fields[i];
        match &mut field.control {
            Control::Input(input) => input.value = value.to_string(),
            Control::Select(select) => {
                if !select.enabled {
                    return Err(WizardError::InvalidInput(format!(
                        "{} has no options yet",
                        field.spec.label
                    )));
                }
                if !select.select(value) {
                    return Err(WizardError::InvalidInput(format!(
                        "'{value}' is not an option for {}",
                        field.spec.label
                    )));
                }
            }
            Control::Auto(_) => {
                return Err(WizardError::InvalidInput(format!(
                    "{} is filled in automatically",
                    field.spec.label
                )));
            }
        }

        if !value.trim().is_empty() {
            field.invalid = false;
        }
        self.propagate(i);
        Ok(())
    }

    /// Set the write-in text for a choice field whose value is `Other`.
    pub fn set_other(&mut self, id: &str, text: &str) -> WizardResult<()> {
        let field = self
            .field(id)
            .ok_or_else(|| WizardError::InvalidInput(format!("Unknown field '{id}'")))?;
        if !field.spec.kind.is_choice() {
            return Err(WizardError::InvalidInput(format!(
                "{} does not accept a write-in",
                field.spec.label
            )));
        }
        self.other_values.insert(id.to_string(), text.to_string());
        Ok(())
    }

    /// Whether the write-in input for `id` should be shown.
    pub fn other_visible(&self, id: &str) -> bool {
        self.field(id)
            .is_some_and(|f| f.spec.kind.is_choice() && f.control.value() == OTHER_CHOICE)
    }

    /// Current values keyed by field id, auto fields included.
    pub fn values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        for field in &self.fields {
            values.insert(field.spec.id.clone(), field.control.value().to_string());
            if self.other_visible(&field.spec.id) {
                if let Some(other) = self.other_values.get(&field.spec.id) {
                    values.insert(format!("{}{}", field.spec.id, OTHER_SUFFIX), other.clone());
                }
            }
        }
        values
    }

    /// Mark required inputs that are blank after trimming.
    pub fn validate(&mut self) -> WizardResult<()> {
        let mut invalid = Vec::new();
        for field in &mut self.fields {
            if matches!(field.control, Control::Auto(_)) || !field.spec.required {
                field.invalid = false;
                continue;
            }
            field.invalid = field.control.value().trim().is_empty();
            if field.invalid {
                invalid.push(field.spec.id.clone());
            }
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            debug!(fields = ?invalid, "Metadata validation failed");
            Err(WizardError::Validation { fields: invalid })
        }
    }

    /// Re-derive every child of `parent` and, transitively, their children.
    fn propagate(&mut self, parent: usize) {
        let children = self.dependents.get(&parent).cloned().unwrap_or_default();
        for child in children {
            self.refresh(child, None);
            self.propagate(child);
        }
    }

    /// Re-derive a wired field from its parent's current value.
    fn refresh(&mut self, i: usize, saved: Option<&str>) {
        let Some(parent) = self.fields[i].spec.kind.parent() else {
            return;
        };
        let parent_value = self.fields[self.index[parent]].control.value().to_string();

        let field = &mut self.fields[i];
        match (&field.spec.kind, &mut field.control) {
            (FieldKind::DependentSelect { options_map, .. }, Control::Select(select)) => {
                let placeholder = select_placeholder(&field.spec.label);
                populate_dependent_select(select, &placeholder, options_map, &parent_value, saved);
            }
            (FieldKind::Auto { .. }, Control::Auto(auto)) => {
                let mapped = self
                    .lookups
                    .get(&i)
                    .and_then(|t| t.get(&parent_value))
                    .map(String::as_str);
                *auto = AutoDisplay::resolve(mapped);
            }
            _ => {}
        }
    }
}
