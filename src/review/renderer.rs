//! Editable review of a returned assessment.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{AssessmentResult, ChoiceSpec, FormSchema};
use crate::error::{WizardError, WizardResult};
use crate::form::SelectControl;

const CHOICE_PLACEHOLDER: &str = "Select...";

/// Dropdown for one AI-inferred field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredChoice {
    pub id: String,
    pub label: String,
    pub control: SelectControl,
    /// Set once the reviewer picks a value.
    pub changed: bool,
}

/// Read-only line for an inferred key no dropdown covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredLine {
    pub key: String,
    pub label: String,
    /// HTML-escaped value.
    pub value_html: String,
}

/// Free-text block for one assessment category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBlock {
    pub id: String,
    pub name: String,
    pub hint: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewForm {
    pub inferred: Vec<InferredChoice>,
    pub extra_lines: Vec<InferredLine>,
    pub categories: Vec<CategoryBlock>,
    pub rating_label: String,
    pub rating: SelectControl,
    pub final_comments_label: String,
    pub final_comments: String,
    pub assessor_comments: String,
    original_inferred: BTreeMap<String, String>,
    overall_notes: String,
}

/// Turn an assessment into editable review controls.
pub fn render_review(result: &AssessmentResult, schema: &FormSchema) -> ReviewForm {
    let inferred = schema
        .ai_inferred_fields
        .iter()
        .map(|spec| inferred_choice(spec, result.inferred_metadata.get(&spec.id)))
        .collect();

    let extra_lines = result
        .inferred_metadata
        .iter()
        .filter(|(key, _)| !schema.ai_inferred_fields.iter().any(|f| &f.id == *key))
        .map(|(key, value)| InferredLine {
            key: key.clone(),
            label: format_key(key),
            value_html: escape_html(value),
        })
        .collect();

    let categories = schema
        .categories
        .iter()
        .map(|category| CategoryBlock {
            id: category.id.clone(),
            name: category.name.clone(),
            hint: category.hint().to_string(),
            text: result.assessments.get(&category.id).cloned().unwrap_or_default(),
        })
        .collect();

    let mut rating =
        SelectControl::with_choices(CHOICE_PLACEHOLDER, &schema.overall_rating.options, None);
    if !rating.select(&result.accessibility_rating) {
        rating.select_ignore_case(&result.accessibility_rating);
    }

    ReviewForm {
        inferred,
        extra_lines,
        categories,
        rating_label: schema.overall_rating.label.clone(),
        rating,
        final_comments_label: schema.final_comments.label.clone(),
        final_comments: result.final_comments.clone(),
        assessor_comments: String::new(),
        original_inferred: result.inferred_metadata.clone(),
        overall_notes: result.overall_notes.clone(),
    }
}

fn inferred_choice(spec: &ChoiceSpec, inferred: Option<&String>) -> InferredChoice {
    let mut control = SelectControl::with_choices(CHOICE_PLACEHOLDER, &spec.options, None);
    if let Some(value) = inferred {
        control.select_ignore_case(value);
    }
    InferredChoice {
        id: spec.id.clone(),
        label: spec.label.clone(),
        control,
        changed: false,
    }
}

/// `additional_context` → `Additional Context`.
pub fn format_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut word_start = true;
    for c in key.chars().map(|c| if c == '_' { ' ' } else { c }) {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = c.is_whitespace();
    }
    out
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl ReviewForm {
    pub fn set_inferred(&mut self, id: &str, value: &str) -> WizardResult<()> {
        let choice = self
            .inferred
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| WizardError::InvalidInput(format!("Unknown inferred field '{id}'")))?;
        if !choice.control.select(value) {
            return Err(WizardError::InvalidInput(format!(
                "'{value}' is not an option for {}",
                choice.label
            )));
        }
        choice.changed = true;
        Ok(())
    }

    pub fn set_category_text(&mut self, id: &str, text: &str) -> WizardResult<()> {
        let block = self
            .categories
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| WizardError::InvalidInput(format!("Unknown category '{id}'")))?;
        block.text = text.to_string();
        Ok(())
    }

    pub fn category_text(&self, id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.text.as_str())
    }

    pub fn set_rating(&mut self, value: &str) -> WizardResult<()> {
        if self.rating.select(value) {
            Ok(())
        } else {
            Err(WizardError::InvalidInput(format!("'{value}' is not a rating option")))
        }
    }

    pub fn set_final_comments(&mut self, text: &str) {
        self.final_comments = text.to_string();
    }

    pub fn set_assessor_comments(&mut self, text: &str) {
        self.assessor_comments = text.to_string();
    }

    /// Inferred metadata as edited: the service's mapping with every
    /// reviewer-changed dropdown written over it.
    pub fn inferred_metadata(&self) -> BTreeMap<String, String> {
        let mut inferred = self.original_inferred.clone();
        for choice in self.inferred.iter().filter(|c| c.changed) {
            inferred.insert(choice.id.clone(), choice.control.value().to_string());
        }
        inferred
    }

    pub fn assessments(&self) -> BTreeMap<String, String> {
        self.categories
            .iter()
            .map(|b| (b.id.clone(), b.text.clone()))
            .collect()
    }

    pub fn overall_notes(&self) -> &str {
        &self.overall_notes
    }
}
