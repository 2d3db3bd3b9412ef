pub mod config;
pub mod context;
pub mod downstream;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod operations;
pub mod server;

pub use config::{
    AppConfig, CapabilityConfig, DownstreamConfig, LoggingConfig, ServerConfig, ValidatorConfig,
};
pub use context::{MediatedOperation, OperationTarget, RequestContext};
pub use downstream::{DownstreamClient, DownstreamResponse};
pub use error::{DownstreamError, MediationError, ValidatorError};
pub use observability::{init_tracing, shutdown_tracing};
pub use server::{AppState, ServerBuilder, TxGatewayServer, build_app};
