// src/sheets/database/connection.rs

use super::error::DbResult;
use super::functions::register_functions;
use rusqlite::Connection;
use std::path::Path;

pub struct DbConnection;

impl DbConnection {
    /// Opens (creating if needed) a database file with WAL mode enabled.
    /// CRITICAL: Always use this instead of Connection::open() so pragmas and
    /// the scalar functions used by the query compilers are present.
    pub fn open(path: &Path) -> DbResult<Connection> {
        let conn = Connection::open(path)?;

        // PRAGMA settings are connection-specific, not database-specific
        let journal_mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        if journal_mode.to_uppercase() != "WAL" {
            tracing::warn!(
                "Failed to set WAL mode on database {:?}. Current mode: {}",
                path.file_name(),
                journal_mode
            );
        } else {
            tracing::trace!("WAL mode active for database {:?}", path.file_name());
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA temp_store=MEMORY;
             PRAGMA busy_timeout=5000;",
        )?;

        register_functions(&conn)?;
        Ok(conn)
    }

    /// Private in-memory database, used by unit tests and dry runs.
    pub fn open_in_memory() -> DbResult<Connection> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "PRAGMA foreign_keys=ON;
             PRAGMA temp_store=MEMORY;",
        )?;
        register_functions(&conn)?;
        Ok(conn)
    }
}
