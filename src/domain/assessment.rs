//! Assessment wire types for `/api/assess` and `/api/submit`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Media type of every processed photo.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// A processed photo ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Base64 (standard alphabet, padded) encoded bytes.
    pub data: String,
    pub media_type: String,
    pub width: u32,
    pub height: u32,
}

/// Body of `POST /api/assess`.
#[derive(Debug, Clone, Serialize)]
pub struct AssessRequest {
    pub image: String,
    pub media_type: String,
    pub metadata: BTreeMap<String, String>,
}

impl AssessRequest {
    pub fn new(image: &ImagePayload, metadata: BTreeMap<String, String>) -> Self {
        Self {
            image: image.data.clone(),
            media_type: image.media_type.clone(),
            metadata,
        }
    }
}

/// Response of `POST /api/assess`.
///
/// The service falls back to a partial object when the model output cannot
/// be parsed, so every field defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssessmentResult {
    #[serde(default, deserialize_with = "lenient_map")]
    pub inferred_metadata: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub assessments: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub accessibility_rating: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub final_comments: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub overall_notes: String,
}

/// Body of `POST /api/submit`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionPayload {
    pub metadata: BTreeMap<String, String>,
    pub assessments: BTreeMap<String, String>,
    pub inferred_metadata: BTreeMap<String, String>,
    pub accessibility_rating: String,
    pub final_comments: String,
    pub assessor_comments: String,
    pub overall_notes: String,
    pub image: String,
    pub media_type: String,
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(serde_json::Value::deserialize(deserializer)?))
}

fn lenient_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, value_to_string(v)))
        .collect())
}
