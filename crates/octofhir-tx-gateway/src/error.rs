//! Mediation error types.

use std::time::Duration;

use octofhir_tx_api::ApiError;
use octofhir_tx_core::CoreError;
use thiserror::Error;

/// Failures talking to the downstream FHIR engine.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("Downstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to connect to downstream: {0}")]
    Connect(String),

    #[error("Invalid downstream URL: {0}")]
    InvalidUrl(String),

    #[error("Downstream request failed: {0}")]
    Transport(String),
}

impl DownstreamError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failures talking to the external validator.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("validator request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to connect to validator: {0}")]
    Connect(String),

    #[error("validator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("validator request failed: {0}")]
    Transport(String),

    #[error("invalid validator response: {0}")]
    InvalidResponse(String),
}

impl ValidatorError {
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Internal mediation failure: anything outside the defined mediation control flow.
#[derive(Debug, Error)]
pub enum MediationError {
    #[error("Document error: {0}")]
    Document(#[from] CoreError),

    #[error(transparent)]
    Downstream(#[from] DownstreamError),

    #[error("Failed to read request body: {0}")]
    Body(String),
}

impl From<MediationError> for ApiError {
    fn from(err: MediationError) -> Self {
        match err {
            MediationError::Downstream(DownstreamError::Timeout(_)) => {
                ApiError::gateway_timeout(err.to_string())
            }
            MediationError::Downstream(_) => ApiError::bad_gateway(err.to_string()),
            MediationError::Body(_) => ApiError::bad_request(err.to_string()),
            MediationError::Document(_) => ApiError::internal(err.to_string()),
        }
    }
}
