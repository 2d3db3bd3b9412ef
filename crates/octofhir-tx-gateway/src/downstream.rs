//! Forwarding to the downstream FHIR engine.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use octofhir_tx_core::FhirFormat;
use tracing::{debug, info, instrument};
use url::Url;

use crate::context::RequestContext;
use crate::error::DownstreamError;

/// HTTP client bound to the downstream engine's FHIR base.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

/// A buffered downstream response.
#[derive(Debug, Clone)]
pub struct DownstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DownstreamClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, DownstreamError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| DownstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Target URL for a gateway-relative path and query.
    pub fn target_url(&self, path: &str, query: Option<&str>) -> String {
        let mut target = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(q);
        }
        target
    }

    /// Sends `ctx` to the downstream engine and buffers the answer.
    #[instrument(skip(self, ctx), fields(method = %ctx.method, path = %ctx.path))]
    pub async fn forward(&self, ctx: &RequestContext) -> Result<DownstreamResponse, DownstreamError> {
        let target = self.target_url(&ctx.path, ctx.query.as_deref());
        debug!(target_url = %target, "Forwarding request downstream");

        let response = self
            .client
            .request(ctx.method.clone(), &target)
            .headers(forwardable_headers(&ctx.headers))
            .body(ctx.body.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DownstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| DownstreamError::from_reqwest(e, self.timeout))?;

        info!(status = %status, bytes = body.len(), "Downstream request completed");
        Ok(DownstreamResponse {
            status,
            headers,
            body,
        })
    }
}

impl DownstreamResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn format(&self) -> Option<FhirFormat> {
        self.content_type().and_then(FhirFormat::from_content_type)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// A copy of this response with a replacement body. Headers are kept
    /// except the ones describing the old body's length and encoding.
    pub fn with_body(&self, status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = self.headers.clone();
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::CONTENT_ENCODING);
        headers.remove(header::ETAG);
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

impl IntoResponse for DownstreamResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        for (name, value) in self.headers.iter() {
            if !is_hop_by_hop_header(name.as_str()) && name != header::CONTENT_LENGTH {
                headers.append(name.clone(), value.clone());
            }
        }
        response
    }
}

/// Request headers that may travel to the downstream engine.
///
/// The body may have been rewritten, so `Content-Length` is recomputed by
/// the client, and `Accept-Encoding` is dropped so mediated answers arrive
/// uncompressed.
fn forwardable_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in incoming.iter() {
        if is_hop_by_hop_header(name.as_str())
            || name == header::CONTENT_LENGTH
            || name == header::ACCEPT_ENCODING
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Checks if a header is a hop-by-hop header that should not be forwarded.
///
/// Hop-by-hop headers are defined in RFC 2616 Section 13.5.1.
pub(crate) fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host"
    )
}
