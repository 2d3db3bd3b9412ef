use thiserror::Error;

/// Core error types for document handling in the terminology gateway
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    XmlError(String),

    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("Empty request body")]
    EmptyBody,
}

impl CoreError {
    /// Create a new XmlError
    pub fn xml(message: impl std::fmt::Display) -> Self {
        Self::XmlError(message.to_string())
    }

    /// Create a new InvalidDocument error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::JsonError(_) | Self::XmlError(_) => ErrorCategory::Serialization,
            Self::InvalidDocument { .. } | Self::EmptyBody => ErrorCategory::Validation,
        }
    }
}

/// Error categories for logging and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_error() {
        let err = CoreError::xml("unexpected end of input");
        assert_eq!(err.to_string(), "XML error: unexpected end of input");
        assert_eq!(err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_invalid_document() {
        let err = CoreError::invalid_document("missing resourceType");
        assert_eq!(err.to_string(), "Invalid document: missing resourceType");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(CoreError::EmptyBody.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::JsonError(_)));
        assert_eq!(err.category().to_string(), "serialization");
    }
}
