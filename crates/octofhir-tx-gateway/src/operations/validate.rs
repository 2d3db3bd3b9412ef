//! `$validate` through an external validator.
//!
//! The resource is re-encoded as pretty JSON and posted to the configured
//! validator endpoint. The validator's `OperationOutcome` comes back to the
//! client in the client's own format, with a leading informational issue
//! marking the mediation. The downstream engine never sees `$validate`
//! while the validator is enabled.

use std::time::Duration;

use axum::{
    http::{StatusCode, header},
    response::Response,
};
use octofhir_tx_api::encoded_response;
use octofhir_tx_core::{FhirFormat, Issue, IssueSeverity, OperationOutcome, to_canonical_json};
use tracing::{debug, info, instrument, warn};

use crate::context::RequestContext;
use crate::error::{MediationError, ValidatorError};

/// Diagnostic of the issue added to every relayed outcome.
pub const MEDIATION_MARKER: &str = "Validated by external validator wrapper";

/// Content type sent with the canonical JSON document.
const VALIDATOR_CONTENT_TYPE: &str = "application/json; utf-8";

/// Client for the external validator. The endpoint is fixed at startup.
#[derive(Debug, Clone)]
pub struct ValidatorClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl ValidatorClient {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts a canonical JSON document and reads back an `OperationOutcome`.
    ///
    /// Timeouts, connection failures, non-2xx answers and undecodable bodies
    /// are all errors.
    #[instrument(skip(self, canonical), fields(endpoint = %self.endpoint))]
    pub async fn validate(
        &self,
        canonical: String,
    ) -> Result<(StatusCode, OperationOutcome), ValidatorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, VALIDATOR_CONTENT_TYPE)
            .header(header::ACCEPT, "application/json")
            .body(canonical)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ValidatorError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ValidatorError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            return Err(ValidatorError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }

        let document = serde_json::from_slice(&body)
            .map_err(|e| ValidatorError::InvalidResponse(e.to_string()))?;
        let outcome = OperationOutcome::from_resource(&document)
            .map_err(|e| ValidatorError::InvalidResponse(e.to_string()))?;
        info!(status = %status, issues = outcome.issue.len(), "Validator answered");
        Ok((status, outcome))
    }
}

/// What the proxy does with a `$validate` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyDecision {
    /// Not a structured document; forward downstream untouched.
    PassThrough,
    /// Answer the client directly.
    Respond {
        status: StatusCode,
        format: FhirFormat,
        outcome: OperationOutcome,
    },
}

impl ProxyDecision {
    /// Encodes the outcome in the client's format.
    pub fn into_response(self) -> Result<Option<Response>, MediationError> {
        match self {
            Self::PassThrough => Ok(None),
            Self::Respond {
                status,
                format,
                outcome,
            } => {
                let body = format.encode(&outcome.to_resource()?)?;
                Ok(Some(encoded_response(status, format.media_type(), body)))
            }
        }
    }
}

/// Runs `$validate` through the external validator.
pub async fn mediate(
    validator: &ValidatorClient,
    ctx: &RequestContext,
) -> Result<ProxyDecision, MediationError> {
    let Some(format) = ctx.format() else {
        debug!(content_type = ?ctx.content_type(), "Unstructured $validate body, forwarding downstream");
        return Ok(ProxyDecision::PassThrough);
    };
    if !ctx.has_body() {
        debug!(%format, "Empty $validate body, forwarding downstream");
        return Ok(ProxyDecision::PassThrough);
    }

    let resource = format.decode(&ctx.body)?;
    let canonical = to_canonical_json(&resource)?;

    let decision = match validator.validate(canonical).await {
        Ok((status, outcome)) => relay(status, outcome, format),
        Err(e) => {
            warn!(error = %e, "External validation failed");
            upstream_failure(&e, format)
        }
    };
    Ok(decision)
}

/// Marks a validator outcome and picks the client status.
pub fn relay(status: StatusCode, outcome: OperationOutcome, format: FhirFormat) -> ProxyDecision {
    let outcome = mark_outcome(outcome);
    let status = if outcome.has_failures() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        status
    };
    ProxyDecision::Respond {
        status,
        format,
        outcome,
    }
}

/// Appends the mediation marker and swaps it into first position.
///
/// The first issue of a relayed outcome is always the marker; the issue
/// that was first moves to the end.
pub fn mark_outcome(mut outcome: OperationOutcome) -> OperationOutcome {
    outcome.issue.push(Issue::new(
        IssueSeverity::Information,
        "informational",
        MEDIATION_MARKER,
    ));
    let last = outcome.issue.len() - 1;
    outcome.issue.swap(0, last);
    outcome
}

fn upstream_failure(err: &ValidatorError, format: FhirFormat) -> ProxyDecision {
    ProxyDecision::Respond {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        format,
        outcome: OperationOutcome::single(Issue::new(
            IssueSeverity::Error,
            "exception",
            format!("Error validating request: {err}"),
        )),
    }
}
