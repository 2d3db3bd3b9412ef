//! Named, typed queries over `Parameters` documents.
//!
//! Each query the mediation pipeline needs is declared once here together
//! with the FHIRPath expression it stands for, and evaluated through
//! [`first`], which returns the first value of the requested kind.

use serde_json::Value;

use crate::model::{Coding, Parameter, Parameters, ValueSet};

/// A query selecting parameters by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterQuery {
    pub name: &'static str,
    /// FHIRPath equivalent, used in logs.
    pub expression: &'static str,
}

impl ParameterQuery {
    /// The embedded value set: `parameter.where(name='valueSet').resource`.
    pub const VALUE_SET: Self = Self {
        name: "valueSet",
        expression: "Parameters.parameter.where(name='valueSet').resource",
    };
    pub const URL: Self = Self {
        name: "url",
        expression: "Parameters.parameter.where(name='url').value",
    };
    pub const CODING: Self = Self {
        name: "coding",
        expression: "Parameters.parameter.where(name='coding').value",
    };
    pub const CODE: Self = Self {
        name: "code",
        expression: "Parameters.parameter.where(name='code').value",
    };
    pub const RESULT: Self = Self {
        name: "result",
        expression: "Parameters.parameter.where(name='result').value",
    };
}

impl std::fmt::Display for ParameterQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.expression)
    }
}

/// A value kind that can be read out of a parameter.
pub trait ParameterValue: Sized {
    fn from_parameter(parameter: &Parameter) -> Option<Self>;
}

/// `uri`, `url` or `canonical` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriValue(pub String);

/// `code` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeValue(pub String);

/// `boolean` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanValue(pub bool);

impl ParameterValue for UriValue {
    fn from_parameter(parameter: &Parameter) -> Option<Self> {
        match parameter.value_entry()? {
            ("Uri" | "Url" | "Canonical", Value::String(s)) => Some(Self(s.clone())),
            _ => None,
        }
    }
}

impl ParameterValue for CodeValue {
    fn from_parameter(parameter: &Parameter) -> Option<Self> {
        match parameter.value_entry()? {
            ("Code", Value::String(s)) => Some(Self(s.clone())),
            _ => None,
        }
    }
}

impl ParameterValue for BooleanValue {
    fn from_parameter(parameter: &Parameter) -> Option<Self> {
        match parameter.value_entry()? {
            ("Boolean", Value::Bool(b)) => Some(Self(*b)),
            // XML without a schema can yield the lexical form
            ("Boolean", Value::String(s)) => s.parse().ok().map(Self),
            _ => None,
        }
    }
}

impl ParameterValue for Coding {
    fn from_parameter(parameter: &Parameter) -> Option<Self> {
        match parameter.value_entry()? {
            ("Coding", value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
            _ => None,
        }
    }
}

impl ParameterValue for ValueSet {
    fn from_parameter(parameter: &Parameter) -> Option<Self> {
        parameter
            .embedded_resource()
            .and_then(ValueSet::from_resource)
    }
}

/// First value of kind `T` among the parameters matched by `query`.
pub fn first<T: ParameterValue>(params: &Parameters, query: ParameterQuery) -> Option<T> {
    params.named(query.name).find_map(T::from_parameter)
}

/// The first parameter matched by `query`, whatever it carries.
pub fn first_parameter(params: &Parameters, query: ParameterQuery) -> Option<&Parameter> {
    params.named(query.name).next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(doc: Value) -> Parameters {
        Parameters::from_resource(&doc).unwrap()
    }

    #[test]
    fn reads_uri_from_any_uri_kind() {
        for key in ["valueUri", "valueUrl", "valueCanonical"] {
            let p = params(json!({
                "resourceType": "Parameters",
                "parameter": [{"name": "url", key: "http://example.org/vs"}]
            }));
            assert_eq!(
                first::<UriValue>(&p, ParameterQuery::URL),
                Some(UriValue("http://example.org/vs".into()))
            );
        }
    }

    #[test]
    fn wrong_kind_is_absent() {
        let p = params(json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "code", "valueString": "mg"}]
        }));
        assert_eq!(first::<CodeValue>(&p, ParameterQuery::CODE), None);
        assert!(first_parameter(&p, ParameterQuery::CODE).is_some());
    }

    #[test]
    fn reads_coding_and_code() {
        let p = params(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "coding", "valueCoding": {"system": "urn:iso:std:iso:4217", "code": "EUR"}},
                {"name": "code", "valueCode": "EUR"}
            ]
        }));
        let coding = first::<Coding>(&p, ParameterQuery::CODING).unwrap();
        assert_eq!(coding.system.as_deref(), Some("urn:iso:std:iso:4217"));
        assert_eq!(
            first::<CodeValue>(&p, ParameterQuery::CODE),
            Some(CodeValue("EUR".into()))
        );
    }

    #[test]
    fn reads_result_flag() {
        let p = params(json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "result", "valueBoolean": false}]
        }));
        assert_eq!(
            first::<BooleanValue>(&p, ParameterQuery::RESULT),
            Some(BooleanValue(false))
        );
        let lexical = params(json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "result", "valueBoolean": "true"}]
        }));
        assert_eq!(
            first::<BooleanValue>(&lexical, ParameterQuery::RESULT),
            Some(BooleanValue(true))
        );
    }

    #[test]
    fn reads_embedded_value_set() {
        let p = params(json!({
            "resourceType": "Parameters",
            "parameter": [{
                "name": "valueSet",
                "resource": {"resourceType": "ValueSet", "url": "http://example.org/vs--3"}
            }]
        }));
        let vs = first::<ValueSet>(&p, ParameterQuery::VALUE_SET).unwrap();
        assert_eq!(vs.url.as_deref(), Some("http://example.org/vs--3"));
    }

    #[test]
    fn query_displays_as_fhirpath() {
        assert_eq!(
            ParameterQuery::VALUE_SET.to_string(),
            "Parameters.parameter.where(name='valueSet').resource"
        );
    }
}
