//! Form schema served by `GET /api/config`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The full form description: metadata inputs, AI-inferred choices,
/// assessment categories, rating options and lookup tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSchema {
    pub metadata_fields: Vec<FieldSpec>,
    #[serde(default)]
    pub ai_inferred_fields: Vec<ChoiceSpec>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub overall_rating: RatingSpec,
    #[serde(default)]
    pub final_comments: FinalCommentsSpec,
    /// Every other top-level key. Lookup tables (e.g. `floor_owners`) live here.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FormSchema {
    /// Resolve a named lookup table. Non-string entries are skipped.
    pub fn lookup_table(&self, name: &str) -> Option<BTreeMap<String, String>> {
        let table = self.extra.get(name)?.as_object()?;
        Some(
            table
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
        )
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.metadata_fields.iter().find(|f| f.id == id)
    }
}

/// One metadata input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

/// How a metadata input is rendered, keyed by the schema's `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    Date,
    Select {
        #[serde(default)]
        options: Vec<String>,
    },
    DependentSelect {
        depends_on: String,
        #[serde(default)]
        options_map: BTreeMap<String, Vec<String>>,
    },
    Auto {
        lookup_from: String,
        lookup_key: String,
    },
}

impl FieldKind {
    /// Parent field id for fields wired to another control.
    pub fn parent(&self) -> Option<&str> {
        match self {
            Self::DependentSelect { depends_on, .. } => Some(depends_on),
            Self::Auto { lookup_key, .. } => Some(lookup_key),
            Self::Text | Self::Email | Self::Date | Self::Select { .. } => None,
        }
    }

    /// Whether the field offers an `Other` write-in.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select { .. } | Self::DependentSelect { .. })
    }
}

/// An enumerable choice the assessment service infers from the photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceSpec {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub guidance: String,
}

impl Category {
    /// First line of the guidance text, shown as a hint above the text block.
    pub fn hint(&self) -> &str {
        self.guidance.lines().next().unwrap_or("").trim()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RatingSpec {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinalCommentsSpec {
    #[serde(default)]
    pub label: String,
}
