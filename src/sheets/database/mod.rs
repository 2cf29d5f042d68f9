// src/sheets/database/mod.rs

pub mod cancellation;
pub mod checkpoint;
pub mod connection;
pub mod error;
pub mod functions;
pub mod reader;
pub mod schema;
pub mod validation;
pub mod writer;

pub use cancellation::Cancellation;
pub use connection::DbConnection;
pub use error::{DbError, DbResult};
pub use reader::DbReader;
pub use writer::DbWriter;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Handle to the on-disk cell store.
///
/// The handle itself holds no connection: every unit of work opens its own
/// (cheap, WAL-mode) connection, which lets independent reads of one page
/// query run on separate blocking threads at the same time.
#[derive(Debug, Clone)]
pub struct CellStore {
    path: PathBuf,
}

impl CellStore {
    /// Open the store at `path`, creating the file and schema when missing.
    pub fn open(path: impl Into<PathBuf>) -> DbResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = DbConnection::open(&path)?;
        schema::ensure_schema(&conn)?;
        tracing::info!("Cell store ready at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> DbResult<Connection> {
        DbConnection::open(&self.path)
    }

    /// Open a connection whose statements abort once `cancel` fires.
    pub fn connect_with(&self, cancel: &Cancellation) -> DbResult<Connection> {
        let conn = self.connect()?;
        cancel.install(&conn);
        Ok(conn)
    }

    /// Run `work` on a blocking thread with its own cancellable connection.
    pub async fn run_blocking<T, F>(&self, cancel: &Cancellation, work: F) -> DbResult<T>
    where
        F: FnOnce(&mut Connection) -> DbResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.clone();
        let cancel = cancel.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            cancel.check()?;
            let mut conn = store.connect_with(&cancel)?;
            work(&mut conn)
        })
        .await?;
        outcome.map_err(DbError::or_cancelled)
    }
}
