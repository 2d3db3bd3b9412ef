//! URL inference for `$validate-code` requests
//!
//! A `$validate-code` call that carries a code but no `url` parameter is
//! ambiguous for most engines. This module fills in `url`:
//!
//! - `ValueSet/$validate-code`: from the embedded value set's own `url`.
//!   The rewritten request holds the first `coding`, the first `code`, the
//!   inferred `url` and, when the common code system service needs it, the
//!   embedded value set. Every other parameter is dropped.
//! - `CodeSystem/$validate-code`: from `coding.system`.
//!
//! Inferred URLs are normalized by removing an internal `--<digits>` version
//! suffix.

use octofhir_tx_core::query::{self, first, first_parameter};
use octofhir_tx_core::registry::{
    common_include_system, has_unresolvable_prefix, is_common_value_set, strip_version_suffix,
};
use octofhir_tx_core::{Coding, Parameter, ParameterQuery, Parameters, ValueSet};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::RequestContext;

/// Which flavour of `$validate-code` is being mediated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateCodeTarget {
    ValueSet,
    CodeSystem,
}

/// Outcome of URL inference over one `Parameters` document.
#[derive(Debug, Clone, PartialEq)]
pub enum Inference {
    /// Nothing to do; carries the reason for logging.
    Unchanged(&'static str),
    Rewritten {
        params: Parameters,
        url: String,
        /// Whether the embedded value set is still part of the request.
        retained_value_set: bool,
    },
}

impl Inference {
    pub fn is_rewritten(&self) -> bool {
        matches!(self, Self::Rewritten { .. })
    }
}

/// Infers `url` for `ValueSet/$validate-code`.
pub fn infer_value_set_url(params: &Parameters) -> Inference {
    if params.contains(ParameterQuery::URL.name) {
        return Inference::Unchanged("url already present");
    }
    let Some(value_set) = first::<ValueSet>(params, ParameterQuery::VALUE_SET) else {
        return Inference::Unchanged("no embedded value set");
    };
    if first_parameter(params, ParameterQuery::CODING).is_none()
        && first_parameter(params, ParameterQuery::CODE).is_none()
    {
        return Inference::Unchanged("neither coding nor code present");
    }
    let Some(raw_url) = value_set.url.as_deref() else {
        return Inference::Unchanged("embedded value set has no url");
    };

    let url = strip_version_suffix(raw_url);
    let retain = must_retain_value_set(&url, &value_set);

    // The downstream request carries only the code under test and the value
    // set reference; other inputs such as display or system are not forwarded.
    let mut parameter = Vec::with_capacity(4);
    parameter.extend(first_parameter(params, ParameterQuery::CODING).cloned());
    parameter.extend(first_parameter(params, ParameterQuery::CODE).cloned());
    parameter.push(url_parameter(&url));
    if retain {
        parameter.extend(first_parameter(params, ParameterQuery::VALUE_SET).cloned());
    }
    let rewritten = Parameters {
        resource_type: params.resource_type.clone(),
        parameter,
        extra: params.extra.clone(),
    };

    Inference::Rewritten {
        params: rewritten,
        url,
        retained_value_set: retain,
    }
}

/// The embedded value set stays unless its url is neither a common value
/// set nor a URN the engine cannot resolve, and none of its includes is a
/// common code system.
fn must_retain_value_set(url: &str, value_set: &ValueSet) -> bool {
    is_common_value_set(url)
        || has_unresolvable_prefix(url)
        || common_include_system(value_set).is_some()
}

/// Infers `url` for `CodeSystem/$validate-code`.
pub fn infer_code_system_url(params: &Parameters) -> Inference {
    if params.contains(ParameterQuery::URL.name) {
        return Inference::Unchanged("url already present");
    }
    let Some(coding) = first::<Coding>(params, ParameterQuery::CODING) else {
        return Inference::Unchanged("no coding present");
    };
    let Some(system) = coding.system.as_deref() else {
        return Inference::Unchanged("coding has no system");
    };

    let url = strip_version_suffix(system);
    let rewritten = params.clone().with(url_parameter(&url));
    Inference::Rewritten {
        params: rewritten,
        url,
        retained_value_set: false,
    }
}

fn url_parameter(url: &str) -> Parameter {
    Parameter::value(
        ParameterQuery::URL.name,
        "Uri",
        Value::String(url.to_string()),
    )
}

/// Applies URL inference to a request, returning the context the
/// downstream engine should see.
///
/// Empty, undecodable or non-`Parameters` bodies pass through untouched.
/// A rewritten body is encoded in the request's own format.
pub fn rewrite_request(ctx: &RequestContext, target: ValidateCodeTarget) -> RequestContext {
    if !ctx.has_body() {
        debug!(?target, "Empty $validate-code body, forwarding unchanged");
        return ctx.clone();
    }
    let Some(format) = ctx.format() else {
        debug!(?target, content_type = ?ctx.content_type(), "Unstructured $validate-code body, forwarding unchanged");
        return ctx.clone();
    };

    let params = match format
        .decode(&ctx.body)
        .and_then(|resource| Parameters::from_resource(&resource))
    {
        Ok(params) => params,
        Err(e) => {
            debug!(?target, error = %e, "Cannot read $validate-code parameters, forwarding unchanged");
            return ctx.clone();
        }
    };

    let inference = match target {
        ValidateCodeTarget::ValueSet => infer_value_set_url(&params),
        ValidateCodeTarget::CodeSystem => infer_code_system_url(&params),
    };

    match inference {
        Inference::Unchanged(reason) => {
            debug!(?target, reason, "URL inference skipped");
            ctx.clone()
        }
        Inference::Rewritten {
            params,
            url,
            retained_value_set,
        } => {
            let encoded = params
                .to_resource()
                .and_then(|resource| format.encode(&resource));
            match encoded {
                Ok(body) => {
                    info!(
                        ?target,
                        url = %url,
                        retained_value_set,
                        "Inferred url for $validate-code"
                    );
                    ctx.with_body(body)
                }
                Err(e) => {
                    warn!(?target, error = %e, "Failed to encode rewritten parameters, forwarding unchanged");
                    ctx.clone()
                }
            }
        }
    }
}

/// Code and embedded value set of a `ValueSet/$validate-code` request, for
/// the fallback mediator.
pub(crate) fn code_and_value_set(params: &Parameters) -> (Option<String>, Option<ValueSet>) {
    let value_set = first::<ValueSet>(params, ParameterQuery::VALUE_SET);
    let code = first::<query::CodeValue>(params, ParameterQuery::CODE)
        .map(|c| c.0)
        .or_else(|| first::<Coding>(params, ParameterQuery::CODING).and_then(|c| c.code));
    (code, value_set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Method, header};
    use octofhir_tx_core::FhirFormat;
    use octofhir_tx_core::query::UriValue;
    use serde_json::json;

    fn params(doc: Value) -> Parameters {
        Parameters::from_resource(&doc).unwrap()
    }

    fn value_set(url: &str, systems: &[&str]) -> Value {
        let include: Vec<Value> = systems.iter().map(|s| json!({"system": s})).collect();
        json!({
            "resourceType": "ValueSet",
            "url": url,
            "status": "active",
            "compose": {"include": include}
        })
    }

    fn request(vs: Value) -> Parameters {
        params(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "coding", "valueCoding": {"system": "http://example.org/cs", "code": "a"}},
                {"name": "valueSet", "resource": vs}
            ]
        }))
    }

    fn rewritten(inference: Inference) -> (Parameters, bool) {
        match inference {
            Inference::Rewritten {
                params,
                retained_value_set,
                ..
            } => (params, retained_value_set),
            Inference::Unchanged(reason) => panic!("expected a rewrite, got Unchanged({reason})"),
        }
    }

    #[test]
    fn injects_exactly_one_url_without_version_suffix() {
        let req = request(value_set("http://example.org/ValueSet/local--20240101", &[
            "http://example.org/cs",
        ]));
        let (out, _) = rewritten(infer_value_set_url(&req));
        let urls: Vec<_> = out.named("url").collect();
        assert_eq!(urls.len(), 1);
        assert_eq!(
            first::<UriValue>(&out, ParameterQuery::URL).unwrap().0,
            "http://example.org/ValueSet/local"
        );
    }

    #[test]
    fn drops_value_set_unknown_to_common_code_systems() {
        let req = request(value_set("http://example.org/ValueSet/local", &[
            "http://example.org/cs",
        ]));
        let (out, retained) = rewritten(infer_value_set_url(&req));
        assert!(!retained);
        assert!(!out.contains("valueSet"));
        let names: Vec<_> = out.parameter.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["coding", "url"]);
    }

    #[test]
    fn retains_value_set_including_a_common_system() {
        let vs = value_set("http://example.org/ValueSet/units", &["http://unitsofmeasure.org"]);
        let req = request(vs.clone());
        let (out, retained) = rewritten(infer_value_set_url(&req));
        assert!(retained);
        let embedded = out.named("valueSet").next().unwrap().embedded_resource().unwrap();
        assert_eq!(embedded, &vs);
        let names: Vec<_> = out.parameter.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["coding", "url", "valueSet"]);
    }

    #[test]
    fn retains_value_set_for_common_and_urn_urls() {
        for url in [
            "http://hl7.org/fhir/ValueSet/ucum-units",
            "http://hl7.org/fhir/ValueSet/currencies--3",
            "urn:uuid:1c5f3d3e-2a4b-4c1e-9a52-0d1f3a2b9c11",
            "urn:oid:2.16.840.1.113883.1.11.1",
        ] {
            let (_, retained) =
                rewritten(infer_value_set_url(&request(value_set(url, &["http://example.org/cs"]))));
            assert!(retained, "value set {url} should be retained");
        }
    }

    #[test]
    fn rerunning_on_rewritten_request_changes_nothing() {
        let req = request(value_set("http://example.org/ValueSet/local--7", &[]));
        let (out, _) = rewritten(infer_value_set_url(&req));
        assert_eq!(
            infer_value_set_url(&out),
            Inference::Unchanged("url already present")
        );
    }

    #[test]
    fn value_set_without_url_is_not_inferable() {
        let vs = json!({"resourceType": "ValueSet", "status": "active"});
        assert_eq!(
            infer_value_set_url(&request(vs)),
            Inference::Unchanged("embedded value set has no url")
        );
    }

    #[test]
    fn requires_a_code_or_coding() {
        let req = params(json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "valueSet", "resource": value_set("http://example.org/vs", &[])}]
        }));
        assert!(!infer_value_set_url(&req).is_rewritten());
    }

    #[test]
    fn bare_code_is_enough_to_infer() {
        let req = params(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "code", "valueCode": "mg"},
                {"name": "system", "valueUri": "http://unitsofmeasure.org"},
                {"name": "valueSet", "resource": value_set("http://example.org/vs", &[])}
            ]
        }));
        let (out, _) = rewritten(infer_value_set_url(&req));
        let names: Vec<_> = out.parameter.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["code", "url"]);
    }

    #[test]
    fn dropped_value_set_leaves_only_coding_and_url() {
        let req = params(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "coding", "valueCoding": {"system": "http://example.org/cs", "code": "a"}},
                {"name": "display", "valueString": "Alpha"},
                {"name": "displayLanguage", "valueCode": "en"},
                {"name": "valueSet", "resource": value_set("http://example.org/ValueSet/local", &[
                    "http://example.org/cs",
                ])}
            ]
        }));
        let (out, retained) = rewritten(infer_value_set_url(&req));
        assert!(!retained);
        let names: Vec<_> = out.parameter.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["coding", "url"]);
        assert_eq!(out.parameter[0], req.parameter[0]);
    }

    #[test]
    fn rewrite_keeps_first_coding_and_code_ahead_of_retained_value_set() {
        let vs = value_set("http://example.org/ValueSet/units", &["http://unitsofmeasure.org"]);
        let req = params(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "valueSet", "resource": vs},
                {"name": "code", "valueCode": "mg"},
                {"name": "code", "valueCode": "kg"},
                {"name": "coding", "valueCoding": {"system": "http://unitsofmeasure.org", "code": "mg"}},
                {"name": "abstract", "valueBoolean": false}
            ]
        }));
        let (out, retained) = rewritten(infer_value_set_url(&req));
        assert!(retained);
        let names: Vec<_> = out.parameter.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["coding", "code", "url", "valueSet"]);
        assert_eq!(out.parameter[1].value_entry().unwrap().1, "mg");
    }

    #[test]
    fn code_system_url_comes_from_coding_system() {
        let req = params(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "coding", "valueCoding": {"system": "http://example.org/cs--12", "code": "a"}}
            ]
        }));
        let (out, _) = rewritten(infer_code_system_url(&req));
        assert_eq!(
            first::<UriValue>(&out, ParameterQuery::URL).unwrap().0,
            "http://example.org/cs"
        );
        assert_eq!(out.parameter.len(), 2);
        assert_eq!(infer_code_system_url(&out), Inference::Unchanged("url already present"));
    }

    #[test]
    fn code_system_coding_without_system_is_not_inferable() {
        let req = params(json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "coding", "valueCoding": {"code": "a"}}]
        }));
        assert_eq!(
            infer_code_system_url(&req),
            Inference::Unchanged("coding has no system")
        );
    }

    fn context(content_type: &'static str, body: Vec<u8>) -> RequestContext {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        RequestContext::new(
            Method::POST,
            "/ValueSet/$validate-code",
            None,
            headers,
            Bytes::from(body),
        )
    }

    #[test]
    fn rewrite_request_keeps_json_format() {
        let req = request(value_set("http://example.org/ValueSet/local", &[]));
        let body = serde_json::to_vec(&req.to_resource().unwrap()).unwrap();
        let ctx = context("application/fhir+json", body);

        let out = rewrite_request(&ctx, ValidateCodeTarget::ValueSet);
        let doc = FhirFormat::Json.decode(&out.body).unwrap();
        let rewritten = Parameters::from_resource(&doc).unwrap();
        assert!(rewritten.contains("url"));
        assert!(!rewritten.contains("valueSet"));
        assert!(ctx.body != out.body);
    }

    #[test]
    fn rewrite_request_keeps_xml_format() {
        let req = request(value_set("http://example.org/ValueSet/local", &[]));
        let body = FhirFormat::Xml.encode(&req.to_resource().unwrap()).unwrap();
        let ctx = context("application/fhir+xml", body);

        let out = rewrite_request(&ctx, ValidateCodeTarget::ValueSet);
        let text = std::str::from_utf8(&out.body).unwrap();
        assert!(text.starts_with("<Parameters"));
        assert!(text.contains("<valueUri value=\"http://example.org/ValueSet/local\"/>"));
    }

    #[test]
    fn rewrite_request_passes_through_bad_bodies() {
        for (ct, body) in [
            ("application/fhir+json", b"".to_vec()),
            ("application/fhir+json", b"{not json".to_vec()),
            ("application/fhir+json", b"{\"resourceType\":\"Patient\"}".to_vec()),
            ("text/plain", b"code=a".to_vec()),
        ] {
            let ctx = context(ct, body);
            let out = rewrite_request(&ctx, ValidateCodeTarget::ValueSet);
            assert_eq!(out.body, ctx.body);
        }
    }

    #[test]
    fn code_and_value_set_prefers_code_parameter() {
        let req = params(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "coding", "valueCoding": {"system": "http://unitsofmeasure.org", "code": "kg"}},
                {"name": "code", "valueCode": "mg"}
            ]
        }));
        let (code, vs) = code_and_value_set(&req);
        assert_eq!(code.as_deref(), Some("mg"));
        assert!(vs.is_none());
    }
}
