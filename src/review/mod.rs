//! Step 3: reviewing and submitting the assessment.

pub mod renderer;
pub mod submission;

pub use renderer::{
    escape_html, format_key, render_review, CategoryBlock, InferredChoice, InferredLine, ReviewForm,
};
pub use submission::build_submission;
