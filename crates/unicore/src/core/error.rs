use thiserror::Error;

use crate::callback::PayloadError;
use crate::import::{ImportError, StructuralError};
use crate::upload::FetchError;

/// Centralized error types for the application
///
/// Errors from the individual pipeline stages keep their own enums so the
/// bot can render them precisely; everything else funnels into this one.
///
/// # Example
///
/// ```no_run
/// use unicore::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Uploaded file failed structural validation
    #[error("Invalid file: {0}")]
    Structural(#[from] StructuralError),

    /// Row-level or storage failure inside an import transaction
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Uploaded file could not be retrieved
    #[error("File fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Inline button payload could not be parsed
    #[error("Callback error: {0}")]
    Payload(#[from] PayloadError),

    /// Entity expected by a workflow is missing or not allowed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Validation(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_error_converts() {
        let err: AppError = StructuralError::EmptyFile.into();
        assert!(matches!(err, AppError::Structural(StructuralError::EmptyFile)));
        assert!(err.to_string().starts_with("Invalid file"));
    }

    #[test]
    fn test_str_becomes_validation() {
        let err: AppError = "no such group".into();
        assert_eq!(err.to_string(), "Validation error: no such group");
    }
}
