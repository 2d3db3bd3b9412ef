pub mod error;
pub mod format;
pub mod model;
pub mod query;
pub mod registry;
pub mod schema;
pub mod terminology;
pub mod xml;

pub use error::{CoreError, ErrorCategory, Result};
pub use format::{FhirFormat, to_canonical_json};
pub use model::{Coding, Issue, IssueSeverity, OperationOutcome, Parameter, Parameters, ValueSet};
pub use query::{BooleanValue, CodeValue, ParameterQuery, ParameterValue, UriValue};
pub use registry::{CommonCodeSystem, CommonSystemKind};
pub use terminology::CodeValidation;
