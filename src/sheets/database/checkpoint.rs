// src/sheets/database/checkpoint.rs
//! WAL checkpoint management.
//!
//! With `PRAGMA synchronous=NORMAL` committed pages can sit in the WAL file for
//! a while. After write-heavy operations (bulk inserts) the WAL is folded back
//! into the main database file so its size stays bounded and the data is
//! durable in the main file.

use super::connection::DbConnection;
use super::error::DbResult;
use rusqlite::Connection;
use std::path::Path;

/// Pages reported by `PRAGMA wal_checkpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointStats {
    pub busy: bool,
    pub wal_pages: i64,
    pub checkpointed_pages: i64,
}

/// Force a WAL checkpoint on a database connection
pub fn checkpoint_database(conn: &Connection) -> DbResult<CheckpointStats> {
    // RESTART mode: checkpoint and restart the WAL file
    let stats = conn.query_row("PRAGMA wal_checkpoint(RESTART)", [], |row| {
        Ok(CheckpointStats {
            busy: row.get::<_, i64>(0)? != 0,
            wal_pages: row.get(1)?,
            checkpointed_pages: row.get(2)?,
        })
    })?;
    if stats.busy {
        tracing::warn!("WAL checkpoint could not complete, database busy");
    } else {
        tracing::info!(
            "WAL checkpoint completed ({} of {} pages)",
            stats.checkpointed_pages,
            stats.wal_pages
        );
    }
    Ok(stats)
}

/// Checkpoint a database file by path
pub fn checkpoint_database_file(db_path: &Path) -> DbResult<Option<CheckpointStats>> {
    if !db_path.exists() {
        return Ok(None); // Nothing to checkpoint
    }
    let conn = DbConnection::open(db_path)?;
    checkpoint_database(&conn).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_on_wal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.db");
        let conn = DbConnection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1), (2);")
            .unwrap();
        let stats = checkpoint_database(&conn).unwrap();
        assert!(!stats.busy);
        assert!(stats.checkpointed_pages <= stats.wal_pages);
    }

    #[test]
    fn test_checkpoint_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let result = checkpoint_database_file(&dir.path().join("absent.db")).unwrap();
        assert!(result.is_none());
    }
}
