//! Error types for crowdfunding-admin

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the admin library
#[derive(Debug, Error)]
pub enum AdminError {
    /// Source file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed XML or delimited text
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Database statement failed
    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// Unknown or empty resource kind
    #[error("Invalid resource type: '{0}'")]
    InvalidResource(String),

    /// Column is not part of the table's column list
    #[error("Column '{column}' does not exist in table '{table}'")]
    InvalidColumn { table: &'static str, column: String },

    /// Anti-forgery token missing or wrong
    #[error("Invalid token")]
    InvalidToken,

    /// Validation schema could not be loaded
    #[error("Form cannot be loaded: {0}")]
    FormLoad(String),

    /// Generic failure surfaced to the end user, details are logged
    #[error("A system error occurred")]
    System,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdminError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        AdminError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AdminError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for the admin library
pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdminError::InvalidResource("planets".to_string());
        assert_eq!(err.to_string(), "Invalid resource type: 'planets'");
    }

    #[test]
    fn test_system_error_hides_detail() {
        assert_eq!(AdminError::System.to_string(), "A system error occurred");
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: AdminError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, AdminError::Persistence(_)));
    }
}
