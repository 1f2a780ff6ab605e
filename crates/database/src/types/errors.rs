//! Error taxonomy shared by the persistence layer and the domain services.

use thiserror::Error;

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Main error type for the messaging core
#[derive(Debug, Error)]
pub enum CoreError {
    /// No identity was resolved for the request. Rejected before any domain logic.
    #[error("authentication required")]
    Unauthenticated,

    /// Retrieval path that must not reveal whether the object exists.
    #[error("{resource} not found")]
    NotFoundOrForbidden { resource: String },

    /// Identity resolved but lacks participation or authorship for the target.
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    /// Domain-rule violation, e.g. dropping a conversation below two participants.
    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    /// Persistence layer unavailable or timed out. Retryable by the caller.
    #[error("infrastructure error: {message}")]
    Infrastructure { message: String },
}

impl CoreError {
    /// Create an existence-hiding not found error
    pub fn not_found_or_forbidden(resource: impl Into<String>) -> Self {
        Self::NotFoundOrForbidden {
            resource: resource.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an invalid operation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create an infrastructure error
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure {
            message: message.into(),
        }
    }

    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Infrastructure { .. })
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Infrastructure {
            message: err.to_string(),
        }
    }
}
