//! FHIR wire formats.
//!
//! Requests and responses travel as either FHIR JSON or FHIR XML. Internally
//! every document is handled in the JSON object model; XML is converted at
//! the boundary by [`crate::xml`].

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::xml;

pub const FHIR_JSON_MEDIA_TYPE: &str = "application/fhir+json";
pub const FHIR_XML_MEDIA_TYPE: &str = "application/fhir+xml";

/// Structured-document format declared by a request or response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FhirFormat {
    Json,
    Xml,
}

impl FhirFormat {
    /// Detects the format from a `Content-Type` value.
    ///
    /// Any media type mentioning `json` is JSON and any mentioning `xml` is
    /// XML, which covers `application/fhir+json`, `application/json`,
    /// `application/fhir+xml`, `application/xml` and `text/xml`.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("json") {
            Some(Self::Json)
        } else if ct.contains("xml") {
            Some(Self::Xml)
        } else {
            None
        }
    }

    /// FHIR media type used when answering in this format.
    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Json => FHIR_JSON_MEDIA_TYPE,
            Self::Xml => FHIR_XML_MEDIA_TYPE,
        }
    }

    /// Decodes a resource body into the JSON object model.
    pub fn decode(&self, body: &[u8]) -> Result<Value> {
        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(CoreError::EmptyBody);
        }
        let value = match self {
            Self::Json => serde_json::from_slice::<Value>(body)?,
            Self::Xml => {
                let text = std::str::from_utf8(body).map_err(CoreError::xml)?;
                xml::from_xml(text)?
            }
        };
        if value.get("resourceType").and_then(Value::as_str).is_none() {
            return Err(CoreError::invalid_document(
                "document is not a FHIR resource (missing resourceType)",
            ));
        }
        Ok(value)
    }

    /// Encodes a resource in this format.
    pub fn encode(&self, resource: &Value) -> Result<Vec<u8>> {
        match self {
            Self::Json => Ok(serde_json::to_vec(resource)?),
            Self::Xml => xml::to_xml(resource),
        }
    }
}

impl std::fmt::Display for FhirFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xml => write!(f, "xml"),
        }
    }
}

/// Pretty-printed JSON, the canonical form handed to external validators.
pub fn to_canonical_json(resource: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(resource)?)
}
