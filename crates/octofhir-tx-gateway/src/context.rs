//! Request context threaded through the mediation stages.
//!
//! A [`RequestContext`] is built once per inbound call and never mutated.
//! Stages that rewrite the request return a new context via
//! [`RequestContext::with_body`].

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};
use octofhir_tx_core::FhirFormat;

/// `(resource type, id, operation)` parsed from the request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationTarget {
    pub resource_type: Option<String>,
    pub id: Option<String>,
    /// Operation name without the `$` prefix.
    pub operation: Option<String>,
    /// Set for `GET /metadata`
    pub metadata: bool,
}

impl OperationTarget {
    /// Classifies a FHIR path relative to the gateway base.
    ///
    /// Recognized shapes: `metadata`, `$op`, `Type/$op`, `Type/id/$op`,
    /// `Type`, `Type/id`. Anything else has no classification.
    pub fn classify(path: &str) -> Self {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let op = |s: &str| operation_name(s).map(str::to_string);
        let resource = |s: &str| {
            s.starts_with(|c: char| c.is_ascii_uppercase())
                .then(|| s.to_string())
        };

        match segments.as_slice() {
            ["metadata"] => Self {
                metadata: true,
                ..Self::default()
            },
            [first] if operation_name(first).is_some() => Self {
                operation: op(first),
                ..Self::default()
            },
            [ty, second] if operation_name(second).is_some() => Self {
                resource_type: resource(ty),
                operation: op(second),
                ..Self::default()
            },
            [ty, id, third] if operation_name(third).is_some() => Self {
                resource_type: resource(ty),
                id: Some((*id).to_string()),
                operation: op(third),
                ..Self::default()
            },
            [ty] => Self {
                resource_type: resource(ty),
                ..Self::default()
            },
            [ty, id] => Self {
                resource_type: resource(ty),
                id: Some((*id).to_string()),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    pub fn is_operation(&self, resource_type: &str, operation: &str) -> bool {
        self.resource_type.as_deref() == Some(resource_type)
            && self.operation.as_deref() == Some(operation)
    }
}

/// `$name` or its percent-encoded form `%24name`.
fn operation_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('$')
        .or_else(|| segment.strip_prefix("%24"))
}

/// Mediated operations the gateway recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediatedOperation {
    ValueSetValidateCode,
    CodeSystemValidateCode,
    Validate,
    Capabilities,
    PassThrough,
}

impl MediatedOperation {
    /// Classifies a call from its method and path alone.
    pub fn classify(method: &Method, target: &OperationTarget) -> Self {
        match *method {
            Method::POST if target.is_operation("ValueSet", "validate-code") => {
                Self::ValueSetValidateCode
            }
            Method::POST if target.is_operation("CodeSystem", "validate-code") => {
                Self::CodeSystemValidateCode
            }
            Method::POST if target.operation.as_deref() == Some("validate") => Self::Validate,
            Method::GET if target.metadata => Self::Capabilities,
            _ => Self::PassThrough,
        }
    }

    pub fn is_mediated(&self) -> bool {
        *self != Self::PassThrough
    }
}

/// Immutable view of one inbound call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path relative to the gateway root, e.g. `/ValueSet/$validate-code`
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub target: OperationTarget,
    pub body: Bytes,
}

impl RequestContext {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let path = path.into();
        let target = OperationTarget::classify(&path);
        Self {
            method,
            path,
            query,
            headers,
            target,
            body,
        }
    }

    /// A copy of this context carrying a replacement body.
    pub fn with_body(&self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let mut headers = self.headers.clone();
        headers.remove(header::CONTENT_LENGTH);
        Self {
            body,
            headers,
            ..self.clone()
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Structured-document format declared by `Content-Type`.
    pub fn format(&self) -> Option<FhirFormat> {
        self.content_type().and_then(FhirFormat::from_content_type)
    }

    pub fn has_body(&self) -> bool {
        !self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn classify(&self) -> MediatedOperation {
        MediatedOperation::classify(&self.method, &self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ctx(method: Method, path: &str) -> RequestContext {
        RequestContext::new(method, path, None, HeaderMap::new(), Bytes::new())
    }

    #[test]
    fn classifies_operation_paths() {
        let t = OperationTarget::classify("/ValueSet/$validate-code");
        assert_eq!(t.resource_type.as_deref(), Some("ValueSet"));
        assert_eq!(t.operation.as_deref(), Some("validate-code"));
        assert_eq!(t.id, None);

        let t = OperationTarget::classify("/CodeSystem/loinc/$validate-code");
        assert_eq!(t.id.as_deref(), Some("loinc"));

        let t = OperationTarget::classify("/ValueSet/%24validate-code");
        assert_eq!(t.operation.as_deref(), Some("validate-code"));

        let t = OperationTarget::classify("/$validate");
        assert_eq!(t.resource_type, None);
        assert_eq!(t.operation.as_deref(), Some("validate"));

        assert!(OperationTarget::classify("/metadata").metadata);
        assert_eq!(
            OperationTarget::classify("/Patient/123/_history/2"),
            OperationTarget::default()
        );
    }

    #[test]
    fn classifies_mediated_operations() {
        assert_eq!(
            ctx(Method::POST, "/ValueSet/$validate-code").classify(),
            MediatedOperation::ValueSetValidateCode
        );
        assert_eq!(
            ctx(Method::POST, "/ValueSet/vs1/$validate-code").classify(),
            MediatedOperation::ValueSetValidateCode
        );
        assert_eq!(
            ctx(Method::GET, "/ValueSet/$validate-code").classify(),
            MediatedOperation::PassThrough
        );
        assert_eq!(
            ctx(Method::POST, "/CodeSystem/$validate-code").classify(),
            MediatedOperation::CodeSystemValidateCode
        );
        assert_eq!(
            ctx(Method::POST, "/Patient/$validate").classify(),
            MediatedOperation::Validate
        );
        assert_eq!(
            ctx(Method::POST, "/$validate").classify(),
            MediatedOperation::Validate
        );
        assert_eq!(
            ctx(Method::GET, "/metadata").classify(),
            MediatedOperation::Capabilities
        );
        assert_eq!(
            ctx(Method::GET, "/Patient/1").classify(),
            MediatedOperation::PassThrough
        );
    }

    #[test]
    fn with_body_returns_a_new_context() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("2"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/fhir+json"));
        let original = RequestContext::new(
            Method::POST,
            "/ValueSet/$validate-code",
            None,
            headers,
            Bytes::from_static(b"{}"),
        );
        let rewritten = original.with_body(b"{\"a\":1}".to_vec());
        assert_eq!(original.body, Bytes::from_static(b"{}"));
        assert_eq!(rewritten.body, Bytes::from_static(b"{\"a\":1}"));
        assert!(rewritten.headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(rewritten.format(), Some(FhirFormat::Json));
        assert_eq!(rewritten.target, original.target);
    }

    #[test]
    fn reads_query_parameters() {
        let c = RequestContext::new(
            Method::GET,
            "/metadata",
            Some("mode=terminology&_format=json".into()),
            HeaderMap::new(),
            Bytes::new(),
        );
        assert_eq!(c.query_param("mode").as_deref(), Some("terminology"));
        assert_eq!(c.query_param("missing"), None);
    }
}
