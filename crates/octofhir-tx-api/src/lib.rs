use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FHIR_JSON: &str = "application/fhir+json";
pub const FHIR_XML: &str = "application/fhir+xml";

/// Minimal FHIR OperationOutcome representation for API error responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str, // always "OperationOutcome"
    pub issue: Vec<OperationOutcomeIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcomeIssue {
    /// FHIR issue severity: fatal | error | warning | information
    pub severity: &'static str,
    /// FHIR issue type code (subset used): invalid | not-supported | exception | timeout
    pub code: &'static str,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

impl OperationOutcome {
    pub fn single(
        severity: &'static str,
        code: &'static str,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: "OperationOutcome",
            issue: vec![OperationOutcomeIssue {
                severity,
                code,
                diagnostics: Some(diagnostics.into()),
            }],
        }
    }
}

/// High-level API errors to be mapped to HTTP responses and FHIR OperationOutcome
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Bad gateway: {0}")]
    BadGateway(String),
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unsupported_media_type(msg: impl Into<String>) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }
    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::BadGateway(msg.into())
    }
    pub fn gateway_timeout(msg: impl Into<String>) -> Self {
        Self::GatewayTimeout(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_operation_outcome(&self) -> OperationOutcome {
        match self {
            ApiError::BadRequest(msg) => OperationOutcome::single("error", "invalid", msg),
            ApiError::UnsupportedMediaType(msg) => {
                OperationOutcome::single("error", "not-supported", msg)
            }
            ApiError::BadGateway(msg) => OperationOutcome::single("error", "exception", msg),
            ApiError::GatewayTimeout(msg) => OperationOutcome::single("error", "timeout", msg),
            ApiError::Internal(msg) => OperationOutcome::single("fatal", "exception", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let outcome = self.to_operation_outcome();
        ApiResponse::new(outcome, status).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn into_response_sets_status_and_content_type() {
        let resp = ApiError::bad_request("Invalid parameter").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, &HeaderValue::from_static(FHIR_JSON));
    }

    #[test]
    fn operation_outcome_shape() {
        let outcome = ApiError::bad_gateway("connection refused").to_operation_outcome();
        assert_eq!(outcome.resource_type, "OperationOutcome");
        assert_eq!(outcome.issue.len(), 1);
        assert_eq!(outcome.issue[0].code, "exception");
        assert_eq!(outcome.issue[0].diagnostics.as_deref(), Some("connection refused"));
    }

    #[test]
    fn api_error_variants_map_to_status_and_codes() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                ApiError::bad_request("x"),
                StatusCode::BAD_REQUEST,
                "invalid",
            ),
            (
                ApiError::unsupported_media_type("x"),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "not-supported",
            ),
            (
                ApiError::bad_gateway("x"),
                StatusCode::BAD_GATEWAY,
                "exception",
            ),
            (
                ApiError::gateway_timeout("x"),
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
            ),
            (
                ApiError::internal("x"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "exception",
            ),
        ];
        for (err, status, code) in cases.into_iter() {
            assert_eq!(err.status_code(), status);
            let oo = err.to_operation_outcome();
            assert_eq!(oo.issue[0].code, code);
        }
    }

    #[test]
    fn internal_errors_are_fatal() {
        let oo = ApiError::internal("boom").to_operation_outcome();
        assert_eq!(oo.issue[0].severity, "fatal");
    }
}

// -------------------------
// API Response Wrapper
// -------------------------

/// A JSON body served as `application/fhir+json`.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub value: T,
    pub status: StatusCode,
}

impl<T> ApiResponse<T> {
    pub fn new(value: T, status: StatusCode) -> Self {
        Self { value, status }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = match serde_json::to_vec(&self.value) {
            Ok(b) => b,
            Err(_) => serde_json::to_vec(&OperationOutcome::single(
                "fatal",
                "exception",
                "Serialization failure",
            ))
            .unwrap_or_else(|_| b"{}".to_vec()),
        };
        axum::http::Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON))
            .body(axum::body::Body::from(body))
            .unwrap_or_else(|_| fallback_response())
    }
}

/// Builds a raw FHIR response with an explicit media type.
///
/// Used when the body is already encoded (for example as FHIR XML) and must
/// be relayed without another serialization pass.
pub fn encoded_response(status: StatusCode, media_type: &'static str, body: Vec<u8>) -> Response {
    axum::http::Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, HeaderValue::from_static(media_type))
        .body(axum::body::Body::from(body))
        .unwrap_or_else(|_| fallback_response())
}

fn fallback_response() -> Response {
    let mut resp = Response::new(axum::body::Body::from("{}"));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(FHIR_JSON));
    resp
}


// -------------------------
// Content Negotiation
// -------------------------
fn is_fhir_media_type(val: &str) -> bool {
    val.contains("application/fhir+json")
        || val.contains("application/json")
        || val.contains("application/fhir+xml")
        || val.contains("application/xml")
}

/// Validate the Accept header: allow FHIR JSON and XML flavours plus wildcards
pub fn validate_accept(headers: &HeaderMap) -> Result<(), ApiError> {
    if let Some(accept) = headers.get(header::ACCEPT) {
        let val = accept.to_str().unwrap_or("").to_ascii_lowercase();
        let allowed = is_fhir_media_type(&val) || val.contains("*/*");
        if !allowed {
            return Err(ApiError::unsupported_media_type(format!(
                "Unsupported Accept: {val}. Only FHIR JSON or XML media types are supported."
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod content_negotiation_tests {
    use super::*;

    #[test]
    fn accept_allows_json_and_xml() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(FHIR_JSON));
        assert!(validate_accept(&headers).is_ok());
        headers.insert(header::ACCEPT, HeaderValue::from_static(FHIR_XML));
        assert!(validate_accept(&headers).is_ok());
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(validate_accept(&headers).is_ok());
    }

    #[test]
    fn accept_allows_wildcard() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        assert!(validate_accept(&headers).is_ok());
    }

    #[test]
    fn accept_rejects_html() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        let err = validate_accept(&headers).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
