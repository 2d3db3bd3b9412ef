use std::sync::Mutex;
use std::{env, fs};

use octofhir_tx_gateway::AppConfig;
use octofhir_tx_gateway::config::loader::load_config;

// Both tests read process env; overrides set by one must not leak into the other.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("octofhir-tx.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 9091
body_limit_bytes = 2048

[downstream]
base_url = "http://engine.internal:8080/fhir"
timeout_ms = 5000

[validator]
endpoint = "http://validator.internal:4567/validate"
timeout_ms = 15000

[capability]
software_name = "Example Terminology Gateway"

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses, unspecified fields keep defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 9091);
    assert_eq!(cfg.server.body_limit_bytes, 2048);
    assert_eq!(cfg.downstream.base_url, "http://engine.internal:8080/fhir");
    assert_eq!(cfg.downstream_timeout().as_millis(), 5000);
    assert_eq!(cfg.validator.endpoint, "http://validator.internal:4567/validate");
    assert!(cfg.validator.enabled);
    assert_eq!(cfg.capability.software_name, "Example Terminology Gateway");
    assert_eq!(
        cfg.capability.instantiates,
        "http://hl7.org/fhir/CapabilityStatement/terminology-server"
    );
    assert_eq!(cfg.logging.level, "debug");

    // 2) Prefixed env override wins over the file
    unsafe {
        env::set_var("OCTOFHIR_TX__SERVER__PORT", "9999");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9999);
    unsafe {
        env::remove_var("OCTOFHIR_TX__SERVER__PORT");
    }

    // 3) VALIDATOR_URL replaces the configured validator endpoint
    unsafe {
        env::set_var("VALIDATOR_URL", "http://override:1234/validate");
    }
    let cfg_validator = load_config(path.to_str()).expect("should parse config with VALIDATOR_URL");
    assert_eq!(cfg_validator.validator.endpoint, "http://override:1234/validate");
    unsafe {
        env::remove_var("VALIDATOR_URL");
    }

    // 4) Invalid config should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[validator]
timeout_ms = 0
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("timeouts must be > 0"));

    let bad_url_path = dir.path().join("bad_url.toml");
    fs::write(&bad_url_path, "[downstream]\nbase_url = \"not a url\"\n").expect("write toml");
    let err = load_config(bad_url_path.to_str()).expect_err("expected url error");
    assert!(err.contains("downstream.base_url"));
}

#[test]
fn serialized_defaults_load_back() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("defaults.toml");
    let defaults = AppConfig::default();
    fs::write(&path, toml::to_string(&defaults).expect("serialize")).expect("write toml");

    let cfg = load_config(path.to_str()).expect("defaults should load");
    assert_eq!(cfg.server.port, defaults.server.port);
    assert_eq!(cfg.downstream.base_url, defaults.downstream.base_url);
    assert_eq!(cfg.capability.software_name, defaults.capability.software_name);
}
