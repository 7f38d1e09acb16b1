//! Storage layer error types
//!
//! Defines all errors that can occur while talking to the persistence engine.

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The database engine rejected or failed an operation
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A unique constraint was violated
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Stored data could not be decoded into a record
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),

    /// A blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Build from a rusqlite error, separating constraint violations
    pub(crate) fn from_sqlite(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::Constraint(msg.clone().unwrap_or_else(|| code.to_string()))
            }
            _ => StorageError::Database(err),
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, StorageError::Constraint(_))
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Task(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Constraint("UNIQUE constraint failed: series.name".to_string());
        assert_eq!(
            err.to_string(),
            "Constraint violated: UNIQUE constraint failed: series.name"
        );
        assert!(err.is_constraint());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
        assert!(!storage_err.is_constraint());
    }

    #[tokio::test]
    async fn test_join_error_becomes_task() {
        let join_err = tokio::task::spawn_blocking(|| -> u8 { panic!("boom") }).await.unwrap_err();
        let err = StorageError::from(join_err);
        assert!(matches!(err, StorageError::Task(_)));
        assert!(err.to_string().starts_with("Storage task failed"));
    }

    #[test]
    fn test_from_sqlite_other_errors_stay_database() {
        let err = StorageError::from_sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StorageError::Database(_)));
    }
}
