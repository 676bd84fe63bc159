//! Errors raised at the persistence boundary

/// Failure of a storage operation.
///
/// Every variant carries a human-readable message; `WriteFailed` also keeps
/// the SQL text that was being prepared, bound or stepped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Database corrupted: {0}")]
    DbCorrupted(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Write failed: {message} (sql: {sql})")]
    WriteFailed { sql: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorageError {
    pub(crate) fn write_failed(sql: &str, err: impl std::fmt::Display) -> Self {
        StorageError::WriteFailed {
            sql: sql.to_string(),
            message: err.to_string(),
        }
    }

    /// Decoding error for a row of `entity` that does not have the expected shape
    pub(crate) fn corrupted_row(entity: &str, detail: impl std::fmt::Display) -> Self {
        StorageError::DbCorrupted(format!("Invalid {} row data: {}", entity, detail))
    }
}
