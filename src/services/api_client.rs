//! Client for the sign assessment service.
//!
//! Provides type-safe methods for:
//! - Form schema retrieval
//! - Photo assessment
//! - Final submission

use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::domain::{AssessRequest, AssessmentResult, FormSchema, SubmissionPayload};
use crate::error::{WizardError, WizardResult};

/// Header name for request ID
pub const X_REQUEST_ID: &str = "x-request-id";

/// Client for the assessment service.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session_id: Uuid,
    sequence: Arc<AtomicU64>,
}

impl ApiClient {
    /// Create a new assessment service client.
    pub fn new(base_url: &str, timeout_seconds: u64) -> WizardResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| WizardError::Transport(format!("failed to create HTTP client: {e}")))?;

        let session_id = Uuid::new_v4();
        tracing::info!(base_url = base_url, session_id = %session_id, "API client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id,
            sequence: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Correlation id for the next request: `<session>-<n>`.
    fn next_request_id(&self) -> String {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", self.session_id, n)
    }

    /// Fetch the form schema. Any failure is a configuration load failure.
    #[instrument(skip(self))]
    pub async fn get_config(&self) -> WizardResult<FormSchema> {
        let url = format!("{}/api/config", self.base_url);
        debug!(url = %url, "Fetching form config");

        let response = self
            .client
            .get(&url)
            .header(X_REQUEST_ID, self.next_request_id())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Config request failed");
                WizardError::ConfigLoad(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Config request rejected");
            return Err(WizardError::ConfigLoad(format!("status {status}")));
        }

        response.json::<FormSchema>().await.map_err(|e| {
            error!(error = %e, "Failed to parse form config");
            WizardError::ConfigLoad(format!("invalid config document: {e}"))
        })
    }

    /// Send a photo and metadata for assessment.
    #[instrument(skip(self, request), fields(metadata_fields = request.metadata.len()))]
    pub async fn assess(&self, request: &AssessRequest) -> WizardResult<AssessmentResult> {
        let response = self.post("/api/assess", request).await?;
        Self::decode(response).await
    }

    /// Submit the reviewed assessment. The response body is ignored.
    #[instrument(skip(self, payload))]
    pub async fn submit(&self, payload: &SubmissionPayload) -> WizardResult<()> {
        self.post("/api/submit", payload).await?;
        Ok(())
    }

    /// POST a JSON body and return the response if it has a success status.
    async fn post<T: Serialize>(&self, path: &str, body: &T) -> WizardResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let request_id = self.next_request_id();

        debug!(url = %url, request_id = %request_id, "Assessment service request");

        let response = self
            .client
            .post(&url)
            .header(X_REQUEST_ID, &request_id)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %url, "Assessment service request failed");
                WizardError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = WizardError::from_response(status.as_u16(), &body);
        warn!(status = %status, error = %err, "Assessment service error");
        Err(err)
    }

    async fn decode<R: DeserializeOwned>(response: Response) -> WizardResult<R> {
        response.json::<R>().await.map_err(|e| {
            error!(error = %e, "Failed to parse assessment service response");
            WizardError::Transport(format!("invalid response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_sequential_per_session() {
        let client = ApiClient::new("http://localhost:5000/", 5).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");

        let first = client.next_request_id();
        let second = client.clone().next_request_id();
        let prefix = client.session_id.to_string();
        assert_eq!(first, format!("{prefix}-1"));
        assert_eq!(second, format!("{prefix}-2"));
    }
}
