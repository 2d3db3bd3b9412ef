//! CapabilityStatement identity and the `mode=terminology` projection.

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::config::CapabilityConfig;
use crate::context::RequestContext;
use crate::downstream::DownstreamResponse;
use crate::error::MediationError;

/// Elements copied into a projected TerminologyCapabilities.
const PROJECTED_ELEMENTS: &[&str] = &["id", "meta", "url", "version", "name", "status", "date"];

/// Adds the terminology-server profile and the gateway's software name.
pub fn customize(statement: &Value, cfg: &CapabilityConfig) -> Value {
    let mut statement = statement.clone();
    let Some(obj) = statement.as_object_mut() else {
        return statement;
    };

    let instantiates = obj
        .entry("instantiates")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !instantiates.is_array() {
        *instantiates = Value::Array(Vec::new());
    }
    if let Some(list) = instantiates.as_array_mut()
        && !list.iter().any(|v| v.as_str() == Some(cfg.instantiates.as_str()))
    {
        list.push(Value::String(cfg.instantiates.clone()));
    }

    let software = obj
        .entry("software")
        .or_insert_with(|| Value::Object(Map::new()));
    if !software.is_object() {
        *software = Value::Object(Map::new());
    }
    if let Some(software) = software.as_object_mut() {
        software.insert("name".into(), Value::String(cfg.software_name.clone()));
    }

    statement
}

/// TerminologyCapabilities carrying the statement's identity, version, status and date.
pub fn project_terminology(statement: &Value) -> Value {
    let mut projected = Map::new();
    projected.insert("resourceType".into(), json!("TerminologyCapabilities"));
    for element in PROJECTED_ELEMENTS {
        if let Some(value) = statement.get(*element) {
            projected.insert((*element).to_string(), value.clone());
        }
    }
    Value::Object(projected)
}

fn wants_terminology(ctx: &RequestContext) -> bool {
    ctx.query_param("mode").as_deref() == Some("terminology")
}

/// Rewrites a downstream `/metadata` answer.
///
/// Anything that is not a successful CapabilityStatement in a structured
/// format is returned as received.
pub fn adapt(
    ctx: &RequestContext,
    response: DownstreamResponse,
    cfg: &CapabilityConfig,
) -> Result<DownstreamResponse, MediationError> {
    if !response.is_success() {
        return Ok(response);
    }
    let Some(format) = response.format() else {
        return Ok(response);
    };
    let statement = match format.decode(&response.body) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(error = %e, "Capability response not decodable, relaying as-is");
            return Ok(response);
        }
    };
    if statement.get("resourceType").and_then(Value::as_str) != Some("CapabilityStatement") {
        return Ok(response);
    }

    let mut adapted = customize(&statement, cfg);
    if wants_terminology(ctx) {
        debug!("Projecting TerminologyCapabilities");
        adapted = project_terminology(&adapted);
    }
    let body = format.encode(&adapted)?;
    Ok(response.with_body(response.status, body))
}
