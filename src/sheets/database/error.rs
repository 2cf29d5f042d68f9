// src/sheets/database/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Row not found: {0}")]
    RowNotFound(i64),
    #[error("View not found: {0}")]
    ViewNotFound(String),
    #[error("User '{user}' may not access table {table_id}")]
    AccessDenied { user: String, table_id: String },
    #[error("Operation cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// SQLite reports an interrupted statement (progress handler abort) as
    /// `SQLITE_INTERRUPT`; surface that as a cancellation instead.
    pub fn from_interruptible(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::OperationInterrupted =>
            {
                DbError::Cancelled
            }
            _ => DbError::Sqlite(e),
        }
    }

    /// Re-map an interrupted statement wrapped as `Sqlite` into `Cancelled`.
    pub fn or_cancelled(self) -> Self {
        match self {
            DbError::Sqlite(e) => DbError::from_interruptible(e),
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DbError::Validation(_))
    }
}
