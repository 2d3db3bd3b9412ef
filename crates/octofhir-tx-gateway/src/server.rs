use std::net::SocketAddr;

use axum::{Router, middleware, routing::get};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, CapabilityConfig};
use crate::downstream::DownstreamClient;
use crate::operations::ValidatorClient;
use crate::{handlers, middleware as app_middleware};

/// Shared, read-only state handed to every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub downstream: DownstreamClient,
    /// `None` when `$validate` is forwarded to the downstream engine.
    pub validator: Option<ValidatorClient>,
    pub capability: CapabilityConfig,
    pub body_limit: usize,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let downstream = DownstreamClient::new(
            client.clone(),
            &cfg.downstream.base_url,
            cfg.downstream_timeout(),
        )?;
        let validator = cfg.validator.enabled.then(|| {
            ValidatorClient::new(client, cfg.validator.endpoint.clone(), cfg.validator_timeout())
        });
        Ok(Self {
            downstream,
            validator,
            capability: cfg.capability.clone(),
            body_limit: cfg.server.body_limit_bytes,
        })
    }
}

pub struct TxGatewayServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg)?;
    tracing::info!(
        public_url = %cfg.base_url(),
        downstream = %state.downstream.base_url(),
        validator = state.validator.as_ref().map(ValidatorClient::endpoint).unwrap_or("disabled"),
        "Mediation targets configured"
    );

    let app = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Every FHIR interaction goes through classification
        .fallback(handlers::dispatch)
        .with_state(state)
        // Middleware stack (outermost first: request id -> trace -> compression/cors -> content negotiation)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(app_middleware::request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<_>| {
                            use tracing::field::Empty;
                            let req_id = req
                                .extensions()
                                .get::<axum::http::HeaderValue>()
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(app_middleware::content_negotiation)),
        );
    Ok(app)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<TxGatewayServer> {
        let app = build_app(&self.config)?;
        Ok(TxGatewayServer {
            addr: self.addr,
            app,
        })
    }
}

impl TxGatewayServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
