use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

/// Environment variable that overrides `validator.endpoint` at startup.
pub const VALIDATOR_URL_ENV: &str = "VALIDATOR_URL";

pub const DEFAULT_VALIDATOR_ENDPOINT: &str = "http://127.0.0.1:4567/validate";
pub const TERMINOLOGY_SERVER_PROFILE: &str =
    "http://hl7.org/fhir/CapabilityStatement/terminology-server";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// FHIR engine that receives mediated and pass-through requests
    #[serde(default)]
    pub downstream: DownstreamConfig,
    /// External `$validate` service
    #[serde(default)]
    pub validator: ValidatorConfig,
    #[serde(default)]
    pub capability: CapabilityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        if self.downstream.timeout_ms == 0 || self.validator.timeout_ms == 0 {
            return Err("downstream and validator timeouts must be > 0".into());
        }
        url::Url::parse(&self.downstream.base_url)
            .map_err(|e| format!("downstream.base_url is not a valid URL: {e}"))?;
        if self.validator.enabled {
            url::Url::parse(&self.validator.endpoint)
                .map_err(|e| format!("validator.endpoint is not a valid URL: {e}"))?;
        }
        if self.capability.software_name.trim().is_empty() {
            return Err("capability.software_name must not be empty".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn downstream_timeout(&self) -> Duration {
        Duration::from_millis(self.downstream.timeout_ms)
    }

    pub fn validator_timeout(&self) -> Duration {
        Duration::from_millis(self.validator.timeout_ms)
    }

    /// Returns the public base URL of the gateway.
    /// If `base_url` is configured, returns that; otherwise computes from host:port.
    pub fn base_url(&self) -> String {
        self.server
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.server.host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL for the gateway, used in logs.
    /// If not set, defaults to http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8090
}
fn default_body_limit() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamConfig {
    /// FHIR base of the downstream engine, e.g. `http://127.0.0.1:8080/fhir`
    #[serde(default = "default_downstream_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_downstream_base_url() -> String {
    "http://127.0.0.1:8080/fhir".into()
}
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_downstream_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// When disabled, `$validate` is forwarded to the downstream engine
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_validator_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}
fn default_validator_endpoint() -> String {
    DEFAULT_VALIDATOR_ENDPOINT.into()
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_validator_endpoint(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Written to `CapabilityStatement.software.name`
    #[serde(default = "default_software_name")]
    pub software_name: String,
    /// Appended to `CapabilityStatement.instantiates`
    #[serde(default = "default_instantiates")]
    pub instantiates: String,
}

fn default_software_name() -> String {
    "OctoFHIR Terminology Gateway".into()
}
fn default_instantiates() -> String {
    TERMINOLOGY_SERVER_PROFILE.into()
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            software_name: default_software_name(),
            instantiates: default_instantiates(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, VALIDATOR_URL_ENV};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("octofhir-tx.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., OCTOFHIR_TX__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("OCTOFHIR_TX")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let mut merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        apply_validator_override(&mut merged, std::env::var(VALIDATOR_URL_ENV).ok());
        merged.validate()?;
        Ok(merged)
    }

    /// A non-empty `VALIDATOR_URL` replaces the configured validator endpoint.
    pub fn apply_validator_override(cfg: &mut AppConfig, value: Option<String>) {
        if let Some(endpoint) = value.filter(|v| !v.trim().is_empty()) {
            cfg.validator.endpoint = endpoint;
        }
    }
}
