//! Typed views over the handful of FHIR resources the gateway inspects.
//!
//! Only the fields the mediation logic reads are typed. Everything else is
//! kept in flattened maps so a document survives decode/encode untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{CoreError, Result};

/// A `Parameters` resource: an ordered list of named parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Parameter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One `Parameters.parameter` entry. `value[x]`, `resource` and `part` live in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Parameters {
    /// Reads a `Parameters` resource from the JSON object model.
    pub fn from_resource(resource: &Value) -> Result<Self> {
        let params: Self = serde_json::from_value(resource.clone())?;
        if params.resource_type != "Parameters" {
            return Err(CoreError::invalid_document(format!(
                "expected a Parameters resource, found {}",
                params.resource_type
            )));
        }
        Ok(params)
    }

    pub fn to_resource(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parameters named `name`, in document order.
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Parameter> + 'a {
        self.parameter.iter().filter(move |p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.named(name).next().is_some()
    }

    pub fn push(&mut self, parameter: Parameter) {
        self.parameter.push(parameter);
    }

    pub fn with(mut self, parameter: Parameter) -> Self {
        self.push(parameter);
        self
    }
}

impl Parameter {
    /// Parameter carrying a primitive or complex `value[x]`, e.g. `("url", "Uri", ..)`.
    pub fn value(name: impl Into<String>, type_suffix: &str, value: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(format!("value{type_suffix}"), value);
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Parameter carrying an embedded resource.
    pub fn resource(name: impl Into<String>, resource: Value) -> Self {
        let mut fields = Map::new();
        fields.insert("resource".to_string(), resource);
        Self {
            name: name.into(),
            fields,
        }
    }

    /// The `value[x]` of this parameter as `(type suffix, value)`.
    pub fn value_entry(&self) -> Option<(&str, &Value)> {
        self.fields.iter().find_map(|(key, value)| {
            key.strip_prefix("value")
                .filter(|suffix| suffix.starts_with(|c: char| c.is_ascii_uppercase()))
                .map(|suffix| (suffix, value))
        })
    }

    pub fn embedded_resource(&self) -> Option<&Value> {
        self.fields.get("resource")
    }
}

/// A `Coding` datatype.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An inline `ValueSet`: its canonical url, the systems its `compose.include`
/// entries reference, and the untouched resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSet {
    pub url: Option<String>,
    pub include_systems: Vec<String>,
    pub resource: Value,
}

impl ValueSet {
    /// Builds the view from a resource; `None` unless it is a ValueSet.
    pub fn from_resource(resource: &Value) -> Option<Self> {
        if resource.get("resourceType").and_then(Value::as_str) != Some("ValueSet") {
            return None;
        }
        let url = resource
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string);
        let include_systems = resource
            .pointer("/compose/include")
            .and_then(Value::as_array)
            .map(|includes| {
                includes
                    .iter()
                    .filter_map(|inc| inc.get("system").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            url,
            include_systems,
            resource: resource.clone(),
        })
    }
}

/// FHIR issue severity, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "information",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fatal | Self::Error)
    }
}

/// One `OperationOutcome.issue`. Fields other than severity/code/diagnostics
/// (location, expression, details, extensions) are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: IssueSeverity,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Issue {
    pub fn new(severity: IssueSeverity, code: &str, diagnostics: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.to_string(),
            diagnostics: Some(diagnostics.into()),
            extra: Map::new(),
        }
    }
}

/// An `OperationOutcome` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    #[serde(default)]
    pub issue: Vec<Issue>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperationOutcome {
    pub fn new(issue: Vec<Issue>) -> Self {
        Self {
            resource_type: "OperationOutcome".to_string(),
            issue,
            extra: Map::new(),
        }
    }

    pub fn single(issue: Issue) -> Self {
        Self::new(vec![issue])
    }

    pub fn from_resource(resource: &Value) -> Result<Self> {
        let outcome: Self = serde_json::from_value(resource.clone())?;
        if outcome.resource_type != "OperationOutcome" {
            return Err(CoreError::invalid_document(format!(
                "expected an OperationOutcome, found {}",
                outcome.resource_type
            )));
        }
        Ok(outcome)
    }

    pub fn to_resource(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// True when any issue is `fatal` or `error`.
    pub fn has_failures(&self) -> bool {
        self.issue.iter().any(|i| i.severity.is_failure())
    }
}

/// `Parameters` answer of a successful `$validate-code`.
pub fn validate_code_success(message: &str) -> Value {
    json!({
        "resourceType": "Parameters",
        "parameter": [
            {"name": "result", "valueBoolean": true},
            {"name": "message", "valueString": message},
            {
                "name": "issues",
                "resource": {
                    "resourceType": "OperationOutcome",
                    "issue": [{
                        "severity": "information",
                        "code": "informational",
                        "diagnostics": message
                    }]
                }
            }
        ]
    })
}
