// SPDX-License-Identifier: AGPL-3.0-or-later

//! Face-match collaborator: compares the photo on an identity document
//! against a live selfie.
//!
//! Two implementations sit behind [`FaceMatcher`]: a remote comparison
//! service reached over HTTPS, and an in-process stub used when no endpoint
//! is configured (and by tests, which can pin the outcome).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::config::Config;

/// Per-call timeout for the remote comparison service.
const FACE_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a document-photo vs. selfie comparison.
#[derive(Debug, Clone, Deserialize)]
pub struct FaceMatch {
    pub verified: bool,
    pub confidence: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum FaceMatchError {
    #[error("Face verification service unavailable: {0}")]
    Unavailable(String),

    #[error("Face verification failed: {0}")]
    Service(String),
}

impl From<FaceMatchError> for crate::error::ApiError {
    fn from(err: FaceMatchError) -> Self {
        match err {
            FaceMatchError::Unavailable(_) => crate::error::ApiError::network(err.to_string()),
            FaceMatchError::Service(_) => crate::error::ApiError::internal(err.to_string()),
        }
    }
}

/// Face comparison strategy, chosen at startup from configuration.
#[derive(Clone)]
pub enum FaceMatcher {
    Remote(RemoteFaceClient),
    Stub(StubFaceMatcher),
}

impl FaceMatcher {
    /// Remote client when `FACE_ENDPOINT` is configured, stub otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.face_endpoint {
            Some(endpoint) => Self::Remote(RemoteFaceClient::new(
                endpoint.clone(),
                config.face_api_key.clone(),
            )),
            None => Self::Stub(StubFaceMatcher::default()),
        }
    }

    pub async fn compare(
        &self,
        id_image: &[u8],
        selfie: &[u8],
    ) -> Result<FaceMatch, FaceMatchError> {
        match self {
            Self::Remote(client) => client.compare(id_image, selfie).await,
            Self::Stub(stub) => Ok(stub.outcome()),
        }
    }
}

/// Client for the remote face-comparison service.
#[derive(Clone)]
pub struct RemoteFaceClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteFaceClient {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FACE_REQUEST_TIMEOUT)
            .build()
            .expect("failed to build face-match HTTP client");
        Self {
            http,
            endpoint,
            api_key,
        }
    }

    async fn compare(&self, id_image: &[u8], selfie: &[u8]) -> Result<FaceMatch, FaceMatchError> {
        info!(
            id_bytes = id_image.len(),
            selfie_bytes = selfie.len(),
            "requesting face comparison"
        );

        let form = reqwest::multipart::Form::new()
            .part(
                "idImage",
                reqwest::multipart::Part::bytes(id_image.to_vec()).file_name("id.jpg"),
            )
            .part(
                "selfieImage",
                reqwest::multipart::Part::bytes(selfie.to_vec()).file_name("selfie.jpg"),
            );

        let mut request = self.http.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FaceMatchError::Unavailable("request timed out".to_string())
            } else {
                FaceMatchError::Unavailable(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(FaceMatchError::Service(format!(
                "comparison service returned HTTP {}",
                response.status()
            )));
        }

        response
            .json::<FaceMatch>()
            .await
            .map_err(|e| FaceMatchError::Service(format!("invalid response: {e}")))
    }
}

/// In-process matcher with a settable outcome. Default: verified, 0.97.
#[derive(Clone)]
pub struct StubFaceMatcher {
    outcome: Arc<Mutex<FaceMatch>>,
}

impl Default for StubFaceMatcher {
    fn default() -> Self {
        Self {
            outcome: Arc::new(Mutex::new(FaceMatch {
                verified: true,
                confidence: 0.97,
                reason: None,
            })),
        }
    }
}

impl StubFaceMatcher {
    pub fn outcome(&self) -> FaceMatch {
        self.outcome.lock().expect("stub matcher lock poisoned").clone()
    }

    /// Pin the outcome returned by subsequent comparisons.
    pub fn set_outcome(&self, verified: bool, confidence: f64, reason: Option<&str>) {
        let mut outcome = self.outcome.lock().expect("stub matcher lock poisoned");
        *outcome = FaceMatch {
            verified,
            confidence,
            reason: reason.map(str::to_string),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_defaults_to_verified() {
        let matcher = FaceMatcher::Stub(StubFaceMatcher::default());
        let result = matcher.compare(b"id", b"selfie").await.unwrap();
        assert!(result.verified);
        assert!(result.confidence > 0.9);
    }

    #[tokio::test]
    async fn stub_outcome_can_be_pinned() {
        let stub = StubFaceMatcher::default();
        stub.set_outcome(false, 0.31, Some("Face mismatch"));
        let matcher = FaceMatcher::Stub(stub);

        let result = matcher.compare(b"id", b"selfie").await.unwrap();
        assert!(!result.verified);
        assert_eq!(result.reason.as_deref(), Some("Face mismatch"));
    }

    #[test]
    fn face_match_deserializes_without_reason() {
        let m: FaceMatch =
            serde_json::from_str(r#"{"verified":true,"confidence":0.88}"#).unwrap();
        assert!(m.verified);
        assert!(m.reason.is_none());
    }
}
