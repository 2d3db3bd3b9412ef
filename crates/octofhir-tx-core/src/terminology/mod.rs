//! Direct validation of codes from the common code systems.
//!
//! These validators answer `$validate-code` for a single (system, code) pair
//! without consulting any value set, which is what the fallback mediation
//! needs when a downstream engine gave a false negative.

mod currencies;
mod languages;
mod mimetypes;
mod ucum;
mod usps;

use crate::registry::{self, CommonSystemKind};

pub use ucum::parse_unit;

/// Result of validating one code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeValidation {
    pub valid: bool,
    pub message: Option<String>,
}

impl CodeValidation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    pub fn valid_with(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: Some(message.into()),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// Validates `code` in `system`. Returns `None` when `system` is not a common code system.
pub fn validate_code(system: &str, code: &str) -> Option<CodeValidation> {
    let entry = registry::find_code_system(system)?;
    let result = validate_kind(entry.kind, code);
    tracing::debug!(system, code, valid = result.valid, "validated common code system code");
    Some(result)
}

pub fn validate_kind(kind: CommonSystemKind, code: &str) -> CodeValidation {
    match kind {
        CommonSystemKind::Languages => languages::validate(code),
        CommonSystemKind::MimeTypes => mimetypes::validate(code),
        CommonSystemKind::Currencies => currencies::validate(code),
        CommonSystemKind::Ucum => ucum::validate(code),
        CommonSystemKind::Usps => usps::validate(code),
    }
}
