//! Headless form controls.
//!
//! Each control is a plain value describing what a front end should draw.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub disabled: bool,
}

impl SelectOption {
    pub fn choice(value: &str) -> Self {
        Self {
            value: value.to_string(),
            label: value.to_string(),
            disabled: false,
        }
    }

    /// A disabled, valueless prompt entry.
    pub fn placeholder(label: &str) -> Self {
        Self {
            value: String::new(),
            label: label.to_string(),
            disabled: true,
        }
    }
}

/// A dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectControl {
    pub options: Vec<SelectOption>,
    pub selected: Option<usize>,
    pub enabled: bool,
}

impl SelectControl {
    /// A disabled dropdown holding a single selected placeholder.
    pub fn disabled_placeholder(label: &str) -> Self {
        Self {
            options: vec![SelectOption::placeholder(label)],
            selected: Some(0),
            enabled: false,
        }
    }

    /// An enabled dropdown: placeholder followed by `choices` in order.
    /// `saved` is pre-selected when it matches a choice.
    pub fn with_choices(placeholder: &str, choices: &[String], saved: Option<&str>) -> Self {
        let mut control = Self {
            options: Vec::with_capacity(choices.len() + 1),
            selected: None,
            enabled: true,
        };
        control.options.push(SelectOption::placeholder(placeholder));
        control
            .options
            .extend(choices.iter().map(|c| SelectOption::choice(c)));

        if !saved.is_some_and(|s| control.select(s)) {
            control.selected = Some(0);
        }
        control
    }

    /// Current value. A selected placeholder reads as empty.
    pub fn value(&self) -> &str {
        self.selected
            .and_then(|i| self.options.get(i))
            .map(|o| o.value.as_str())
            .unwrap_or("")
    }

    /// Select the enabled option whose value equals `value`.
    pub fn select(&mut self, value: &str) -> bool {
        match self
            .options
            .iter()
            .position(|o| !o.disabled && o.value == value)
        {
            Some(i) => {
                self.selected = Some(i);
                true
            }
            None => false,
        }
    }

    /// Select the enabled option matching `value` ignoring ASCII case.
    pub fn select_ignore_case(&mut self, value: &str) -> bool {
        match self
            .options
            .iter()
            .position(|o| !o.disabled && o.value.eq_ignore_ascii_case(value.trim()))
        {
            Some(i) => {
                self.selected = Some(i);
                true
            }
            None => false,
        }
    }

    /// Values of all selectable options, in order.
    pub fn choices(&self) -> impl Iterator<Item = &str> {
        self.options
            .iter()
            .filter(|o| !o.disabled)
            .map(|o| o.value.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Email,
    Date,
}

/// A single-line input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputControl {
    pub input_type: InputType,
    pub value: String,
    pub placeholder: String,
}

/// Read-only text derived from another control through a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoDisplay {
    /// What the reader sees; `Unknown` for unmapped parent values.
    pub text: String,
    /// What gets submitted; empty for unmapped parent values.
    pub value: String,
}

/// Text shown by an auto field whose parent value is not in the lookup table.
pub const UNKNOWN_LOOKUP: &str = "Unknown";

impl AutoDisplay {
    pub fn resolve(mapped: Option<&str>) -> Self {
        match mapped {
            Some(v) => Self {
                text: v.to_string(),
                value: v.to_string(),
            },
            None => Self {
                text: UNKNOWN_LOOKUP.to_string(),
                value: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum Control {
    Input(InputControl),
    Select(SelectControl),
    Auto(AutoDisplay),
}

impl Control {
    pub fn value(&self) -> &str {
        match self {
            Self::Input(input) => &input.value,
            Self::Select(select) => select.value(),
            Self::Auto(auto) => &auto.value,
        }
    }

    pub fn as_select(&self) -> Option<&SelectControl> {
        match self {
            Self::Select(select) => Some(select),
            _ => None,
        }
    }
}
