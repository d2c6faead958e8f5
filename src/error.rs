use thiserror::Error;
use tracing::error;

use crate::app::ports::RepositoryError;
use crate::render::table::TableShapeError;

/// Failures surfaced by merge-code resolution.
///
/// Unresolved tokens are never errors; they travel as values. Only a request
/// the caller got wrong (`InvalidRequest`) or something broken underneath
/// (`Internal`) ends a resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl MergeError {
    pub fn invalid(message: impl Into<String>) -> Self {
        MergeError::InvalidRequest(message.into())
    }

    /// Logs the underlying failure and returns the generic error the caller sees.
    pub fn internal(message: &str, cause: &dyn std::fmt::Display) -> Self {
        error!(cause = %cause, "{}", message);
        MergeError::Internal {
            message: message.to_string(),
        }
    }

    pub fn is_invalid_request(&self) -> bool {
        matches!(self, MergeError::InvalidRequest(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, MergeError::Internal { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MergeError::InvalidRequest(_) => "invalid_request",
            MergeError::Internal { .. } => "internal",
        }
    }
}

impl From<RepositoryError> for MergeError {
    fn from(err: RepositoryError) -> Self {
        MergeError::internal("Failed to load merge data", &err)
    }
}

impl From<TableShapeError> for MergeError {
    fn from(err: TableShapeError) -> Self {
        MergeError::internal("Failed to render merge table", &err)
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_failure_becomes_generic_internal_error() {
        let err: MergeError = RepositoryError::Unavailable("connection reset".to_string()).into();
        assert!(err.is_internal());
        assert_eq!(err.to_string(), "Internal error: Failed to load merge data");
    }

    #[test]
    fn test_invalid_request_keeps_message() {
        let err = MergeError::invalid("case 7 not found");
        assert!(err.is_invalid_request());
        assert_eq!(err.to_string(), "Invalid request: case 7 not found");
    }
}
