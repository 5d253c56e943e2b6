use serde::Serialize;

use crate::validation::ValidationResult;

/// Failures of the service and storage layers.
///
/// Business-rule violations are not errors: validators return them as a
/// [`ValidationResult`]. `ValidationFailed` only appears when a caller asked
/// to persist a candidate that did not pass.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationResult),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(
        #[from]
        #[serde(skip)]
        std::io::Error,
    ),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl From<ValidationResult> for ServiceError {
    fn from(result: ValidationResult) -> Self {
        ServiceError::ValidationFailed(result)
    }
}

impl ServiceError {
    /// The rule violations carried by a `ValidationFailed` error.
    pub fn validation_result(&self) -> Option<&ValidationResult> {
        match self {
            ServiceError::ValidationFailed(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}
