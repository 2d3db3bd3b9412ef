//! Common code systems.
//!
//! Well-known code systems whose codes can be validated without a
//! terminology server, each paired with the canonical value set that
//! contains all of its codes. The table is constant for the process lifetime.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::ValueSet;

/// Which direct validator handles a common code system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommonSystemKind {
    Languages,
    MimeTypes,
    Currencies,
    Ucum,
    Usps,
}

/// A (code system, value set) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonCodeSystem {
    pub kind: CommonSystemKind,
    pub code_system: &'static str,
    pub value_set: &'static str,
}

pub const LANGUAGES_CODESYSTEM_URL: &str = "urn:ietf:bcp:47";
pub const LANGUAGES_VALUESET_URL: &str = "http://hl7.org/fhir/ValueSet/languages";
pub const ALL_LANGUAGES_VALUESET_URL: &str = "http://hl7.org/fhir/ValueSet/all-languages";
pub const MIMETYPES_CODESYSTEM_URL: &str = "urn:ietf:bcp:13";
pub const MIMETYPES_VALUESET_URL: &str = "http://hl7.org/fhir/ValueSet/mimetypes";
pub const CURRENCIES_CODESYSTEM_URL: &str = "urn:iso:std:iso:4217";
pub const CURRENCIES_VALUESET_URL: &str = "http://hl7.org/fhir/ValueSet/currencies";
pub const UCUM_CODESYSTEM_URL: &str = "http://unitsofmeasure.org";
pub const UCUM_VALUESET_URL: &str = "http://hl7.org/fhir/ValueSet/ucum-units";
pub const USPS_CODESYSTEM_URL: &str = "https://www.usps.com/";
pub const USPS_VALUESET_URL: &str = "http://hl7.org/fhir/us/core/ValueSet/us-core-usps-state";

/// The registry. Languages appear twice: both language value sets draw on BCP-47.
pub static COMMON_CODE_SYSTEMS: &[CommonCodeSystem] = &[
    CommonCodeSystem {
        kind: CommonSystemKind::Languages,
        code_system: LANGUAGES_CODESYSTEM_URL,
        value_set: LANGUAGES_VALUESET_URL,
    },
    CommonCodeSystem {
        kind: CommonSystemKind::Languages,
        code_system: LANGUAGES_CODESYSTEM_URL,
        value_set: ALL_LANGUAGES_VALUESET_URL,
    },
    CommonCodeSystem {
        kind: CommonSystemKind::MimeTypes,
        code_system: MIMETYPES_CODESYSTEM_URL,
        value_set: MIMETYPES_VALUESET_URL,
    },
    CommonCodeSystem {
        kind: CommonSystemKind::Currencies,
        code_system: CURRENCIES_CODESYSTEM_URL,
        value_set: CURRENCIES_VALUESET_URL,
    },
    CommonCodeSystem {
        kind: CommonSystemKind::Ucum,
        code_system: UCUM_CODESYSTEM_URL,
        value_set: UCUM_VALUESET_URL,
    },
    CommonCodeSystem {
        kind: CommonSystemKind::Usps,
        code_system: USPS_CODESYSTEM_URL,
        value_set: USPS_VALUESET_URL,
    },
];

/// URN prefixes that identify value sets no terminology server can look up by url.
pub const UNRESOLVABLE_URL_PREFIXES: &[&str] = &["urn:uuid", "urn:oid"];

static VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--\d+$").expect("valid version suffix regex")
});

/// Strips an internal `--<digits>` version suffix from a canonical url.
pub fn strip_version_suffix(url: &str) -> String {
    VERSION_SUFFIX.replace(url, "").into_owned()
}

pub fn is_common_value_set(url: &str) -> bool {
    COMMON_CODE_SYSTEMS.iter().any(|e| e.value_set == url)
}

pub fn find_code_system(system: &str) -> Option<&'static CommonCodeSystem> {
    COMMON_CODE_SYSTEMS.iter().find(|e| e.code_system == system)
}

pub fn is_common_code_system(system: &str) -> bool {
    find_code_system(system).is_some()
}

pub fn has_unresolvable_prefix(url: &str) -> bool {
    UNRESOLVABLE_URL_PREFIXES.iter().any(|p| url.starts_with(p))
}

/// The first `compose.include` system of `value_set` that is a common code system.
pub fn common_include_system(value_set: &ValueSet) -> Option<&'static CommonCodeSystem> {
    value_set
        .include_systems
        .iter()
        .find_map(|system| find_code_system(system))
}
