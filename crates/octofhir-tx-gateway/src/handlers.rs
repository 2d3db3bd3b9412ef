use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use octofhir_tx_api::ApiError;
use serde::Serialize;
use tracing::debug;

use crate::context::{MediatedOperation, RequestContext};
use crate::error::MediationError;
use crate::operations::{ValidateCodeTarget, capability, terminology, validate};
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ready" }))
}

/// Entry point for every FHIR request: classify, mediate, forward.
pub async fn dispatch(State(state): State<AppState>, req: Request<Body>) -> Response {
    match mediate(&state, req).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                MediationError::Document(core) => {
                    tracing::error!(error = %e, category = %core.category(), "Mediation failed");
                }
                _ => tracing::error!(error = %e, "Mediation failed"),
            }
            ApiError::from(e).into_response()
        }
    }
}

async fn mediate(state: &AppState, req: Request<Body>) -> Result<Response, MediationError> {
    let ctx = read_context(req, state.body_limit).await?;
    let operation = ctx.classify();
    debug!(?operation, method = %ctx.method, path = %ctx.path, "Dispatching request");

    let response = match operation {
        MediatedOperation::ValueSetValidateCode => {
            terminology::validate_code(&state.downstream, &ctx, ValidateCodeTarget::ValueSet)
                .await?
        }
        MediatedOperation::CodeSystemValidateCode => {
            terminology::validate_code(&state.downstream, &ctx, ValidateCodeTarget::CodeSystem)
                .await?
        }
        MediatedOperation::Validate => {
            if let Some(validator) = &state.validator
                && let Some(response) = validate::mediate(validator, &ctx).await?.into_response()?
            {
                return Ok(response);
            }
            state.downstream.forward(&ctx).await?
        }
        MediatedOperation::Capabilities => {
            let response = state.downstream.forward(&ctx).await?;
            capability::adapt(&ctx, response, &state.capability)?
        }
        MediatedOperation::PassThrough => state.downstream.forward(&ctx).await?,
    };
    Ok(response.into_response())
}

async fn read_context(req: Request<Body>, limit: usize) -> Result<RequestContext, MediationError> {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| MediationError::Body(e.to_string()))?;
    Ok(RequestContext::new(
        parts.method,
        parts.uri.path(),
        parts.uri.query().map(str::to_string),
        parts.headers,
        body,
    ))
}
