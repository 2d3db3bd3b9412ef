//! `$validate-code` mediation
//!
//! Requests go through [`inference`] before reaching the downstream engine.
//! For value sets the downstream answer then goes through [`fallback`].

pub mod fallback;
pub mod inference;

use axum::http::{HeaderValue, StatusCode, header};
use octofhir_tx_core::Parameters;
use tracing::{debug, info};

use crate::context::RequestContext;
use crate::downstream::{DownstreamClient, DownstreamResponse};
use crate::error::MediationError;

pub use fallback::{FallbackDecision, OVERRIDE_MESSAGE};
pub use inference::{Inference, ValidateCodeTarget, rewrite_request};

/// Mediates one `$validate-code` call end to end.
pub async fn validate_code(
    downstream: &DownstreamClient,
    ctx: &RequestContext,
    target: ValidateCodeTarget,
) -> Result<DownstreamResponse, MediationError> {
    let forwarded = rewrite_request(ctx, target);
    let response = downstream.forward(&forwarded).await?;
    match target {
        ValidateCodeTarget::ValueSet => apply_fallback(ctx, response),
        ValidateCodeTarget::CodeSystem => Ok(response),
    }
}

/// Runs the fallback mediator over a downstream answer.
///
/// `original` is the client's request before inference. Answers or requests
/// that cannot be read are relayed unchanged.
pub fn apply_fallback(
    original: &RequestContext,
    response: DownstreamResponse,
) -> Result<DownstreamResponse, MediationError> {
    let Some(format) = response.format() else {
        return Ok(response);
    };
    let Ok(answer) = format.decode(&response.body) else {
        debug!("Downstream $validate-code answer not decodable, relaying as-is");
        return Ok(response);
    };
    let request = original
        .format()
        .and_then(|f| f.decode(&original.body).ok())
        .and_then(|doc| Parameters::from_resource(&doc).ok());
    let Some(request) = request else {
        debug!("Original $validate-code request not readable, skipping fallback");
        return Ok(response);
    };

    match fallback::mediate(&request, &answer) {
        FallbackDecision::Keep(reason) => {
            debug!(reason, "Fallback validation not applied");
            Ok(response)
        }
        FallbackDecision::Override(document) => {
            info!(downstream_status = %response.status, "Fallback validation overrode negative result");
            let body = format.encode(&document)?;
            let mut overridden = response.with_body(StatusCode::OK, body);
            overridden.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(format.media_type()),
            );
            Ok(overridden)
        }
    }
}
