//! Unified wizard error handling
//!
//! Every failure the wizard can hit maps to one variant here, and every
//! variant knows the banner text shown to the person filling the form.

use thiserror::Error;

/// Banner text for any configuration load failure.
pub const CONFIG_LOAD_MESSAGE: &str =
    "Failed to load the assessment form. Please restart and try again.";

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Config load failed: {0}")]
    ConfigLoad(String),

    #[error("Validation failed for: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("Image processing failed: {0}")]
    Image(String),

    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot {action} from {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl WizardError {
    /// Build a remote error from a non-success status and the response body.
    ///
    /// A body of the form `{"error": "..."}` is surfaced verbatim, anything
    /// else falls back to the generic status message.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct ErrorBody {
            error: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Server error ({status})"));

        Self::Remote { status, message }
    }

    /// Text for the user-visible banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigLoad(_) => CONFIG_LOAD_MESSAGE.to_string(),
            Self::Validation { .. } => "Please fill in all required fields.".to_string(),
            Self::Image(msg) => format!("Could not process the photo: {msg}"),
            Self::Remote { message, .. } => message.clone(),
            Self::Transport(msg) => format!("Network error: {msg}"),
            Self::Schema(msg) => format!("The assessment form is misconfigured: {msg}"),
            Self::InvalidInput(msg) => msg.clone(),
            Self::InvalidTransition { action, .. } => format!("Cannot {action} right now."),
            // Never shown: draft persistence is best-effort
            Self::Persistence(_) => String::new(),
        }
    }

    /// Validation failures are marked inline and never raise a banner.
    pub fn shows_banner(&self) -> bool {
        !matches!(self, Self::Validation { .. } | Self::Persistence(_))
    }
}

impl From<image::ImageError> for WizardError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

pub type WizardResult<T> = Result<T, WizardError>;
