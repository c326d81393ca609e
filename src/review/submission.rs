use std::collections::BTreeMap;

use super::renderer::ReviewForm;
use crate::domain::{ImagePayload, SubmissionPayload};

/// Assemble the submit body from the metadata values, the edited review
/// and the photo sent for assessment.
pub fn build_submission(
    metadata: BTreeMap<String, String>,
    review: &ReviewForm,
    image: &ImagePayload,
) -> SubmissionPayload {
    SubmissionPayload {
        metadata,
        assessments: review.assessments(),
        inferred_metadata: review.inferred_metadata(),
        accessibility_rating: review.rating.value().to_string(),
        final_comments: review.final_comments.clone(),
        assessor_comments: review.assessor_comments.clone(),
        overall_notes: review.overall_notes().to_string(),
        image: image.data.clone(),
        media_type: image.media_type.clone(),
    }
}
