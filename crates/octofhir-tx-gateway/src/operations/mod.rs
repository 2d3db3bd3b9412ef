//! Mediated FHIR operations
//!
//! - `ValueSet/$validate-code`, `CodeSystem/$validate-code` - URL inference
//!   before forwarding, fallback validation after (value sets only)
//! - `$validate` - delegated to the external validator
//! - `metadata` - capability identity and terminology projection

pub mod capability;
pub mod terminology;
pub mod validate;

pub use terminology::ValidateCodeTarget;
pub use validate::{ProxyDecision, ValidatorClient};
