use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::context::{MediatedOperation, OperationTarget};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Keeps an incoming `X-Request-Id` or assigns a new one, and mirrors it on the response.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    let req_id_value = match req.headers().get(&header_name) {
        Some(value) => value.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            // forwarded downstream with the request
            req.headers_mut()
                .insert(header_name.clone(), generated.clone());
            generated
        }
    };

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

// Content negotiation: mediated operations answer in FHIR JSON/XML only, so
// their Accept must allow one of those. Pass-through calls are relayed as-is.
pub async fn content_negotiation(req: Request<Body>, next: Next) -> Response {
    let target = OperationTarget::classify(req.uri().path());
    if MediatedOperation::classify(req.method(), &target).is_mediated()
        && let Err(e) = octofhir_tx_api::validate_accept(req.headers())
    {
        return e.into_response();
    }
    next.run(req).await
}
