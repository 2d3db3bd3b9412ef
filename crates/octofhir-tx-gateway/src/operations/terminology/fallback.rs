//! Fallback validation for `ValueSet/$validate-code`.
//!
//! Engines that do not special-case the common code systems answer
//! `result=false` for codes that are perfectly valid UCUM units, currencies,
//! language tags and so on. When the request's value set includes one of
//! those systems, the code is re-validated directly against that system and a
//! success replaces the negative answer. A positive answer is never touched.

use octofhir_tx_core::model::validate_code_success;
use octofhir_tx_core::query::{BooleanValue, first};
use octofhir_tx_core::registry::common_include_system;
use octofhir_tx_core::terminology::validate_kind;
use octofhir_tx_core::{ParameterQuery, Parameters};
use serde_json::Value;

use super::inference::code_and_value_set;

pub const OVERRIDE_MESSAGE: &str = "Code validated by common code system terminology service";

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackDecision {
    /// Downstream answer stands; carries the reason for logging.
    Keep(&'static str),
    /// Replacement `Parameters` document.
    Override(Value),
}

/// Decides whether the downstream `$validate-code` answer should be replaced.
///
/// `request` is the client's original `Parameters`; `response` is the
/// downstream answer in the JSON object model.
pub fn mediate(request: &Parameters, response: &Value) -> FallbackDecision {
    let Ok(answer) = Parameters::from_resource(response) else {
        return FallbackDecision::Keep("response is not a Parameters resource");
    };
    match first::<BooleanValue>(&answer, ParameterQuery::RESULT) {
        None => return FallbackDecision::Keep("response has no result"),
        Some(BooleanValue(true)) => return FallbackDecision::Keep("code already valid"),
        Some(BooleanValue(false)) => {}
    }

    let (code, value_set) = code_and_value_set(request);
    let Some(value_set) = value_set else {
        return FallbackDecision::Keep("request has no embedded value set");
    };
    let Some(system) = common_include_system(&value_set) else {
        return FallbackDecision::Keep("value set includes no common code system");
    };
    let Some(code) = code else {
        return FallbackDecision::Keep("request has no code");
    };

    let validation = validate_kind(system.kind, &code);
    tracing::debug!(
        system = system.code_system,
        code = %code,
        valid = validation.valid,
        message = ?validation.message,
        "Fallback validation against common code system"
    );
    if validation.valid {
        FallbackDecision::Override(validate_code_success(OVERRIDE_MESSAGE))
    } else {
        FallbackDecision::Keep("code not valid in common code system")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(code: &str, include: &str) -> Parameters {
        Parameters::from_resource(&json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "code", "valueCode": code},
                {"name": "valueSet", "resource": {
                    "resourceType": "ValueSet",
                    "url": "http://example.org/ValueSet/vitals-units",
                    "compose": {"include": [{"system": include}]}
                }}
            ]
        }))
        .unwrap()
    }

    fn answer(result: bool) -> Value {
        json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "result", "valueBoolean": result},
                {"name": "message", "valueString": "Unknown code"}
            ]
        })
    }

    #[test]
    fn overrides_false_negative_for_valid_ucum_code() {
        let decision = mediate(&request("mg/dL", "http://unitsofmeasure.org"), &answer(false));
        let FallbackDecision::Override(doc) = decision else {
            panic!("expected override, got {decision:?}");
        };
        let params = Parameters::from_resource(&doc).unwrap();
        assert_eq!(
            first::<BooleanValue>(&params, ParameterQuery::RESULT),
            Some(BooleanValue(true))
        );
        let issues = &doc["parameter"][2]["resource"]["issue"];
        assert_eq!(issues.as_array().unwrap().len(), 1);
        assert_eq!(issues[0]["severity"], "information");
        assert_eq!(issues[0]["diagnostics"], OVERRIDE_MESSAGE);
    }

    #[test]
    fn keeps_negative_answer_for_invalid_code() {
        assert_eq!(
            mediate(&request("not a unit", "http://unitsofmeasure.org"), &answer(false)),
            FallbackDecision::Keep("code not valid in common code system")
        );
    }

    #[test]
    fn never_touches_a_positive_answer() {
        assert_eq!(
            mediate(&request("xyz", "http://unitsofmeasure.org"), &answer(true)),
            FallbackDecision::Keep("code already valid")
        );
    }

    #[test]
    fn ignores_value_sets_without_common_systems() {
        assert_eq!(
            mediate(&request("mg", "http://loinc.org"), &answer(false)),
            FallbackDecision::Keep("value set includes no common code system")
        );
    }

    #[test]
    fn ignores_non_parameters_answers() {
        let outcome = json!({"resourceType": "OperationOutcome", "issue": []});
        assert_eq!(
            mediate(&request("mg", "http://unitsofmeasure.org"), &outcome),
            FallbackDecision::Keep("response is not a Parameters resource")
        );
    }

    #[test]
    fn uses_coding_code_when_no_code_parameter() {
        let req = Parameters::from_resource(&json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "coding", "valueCoding": {"system": "urn:iso:std:iso:4217", "code": "EUR"}},
                {"name": "valueSet", "resource": {
                    "resourceType": "ValueSet",
                    "compose": {"include": [{"system": "urn:iso:std:iso:4217"}]}
                }}
            ]
        }))
        .unwrap();
        assert!(matches!(mediate(&req, &answer(false)), FallbackDecision::Override(_)));
    }
}
