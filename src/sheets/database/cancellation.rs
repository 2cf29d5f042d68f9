// src/sheets/database/cancellation.rs
//! Cooperative cancellation for long-running store work.
//!
//! A `Cancellation` is cloned into every blocking task of a page query or a
//! bulk insert. It is polled between batches and also installed as the
//! SQLite progress handler of each connection, so a statement that is
//! already running gets interrupted (`SQLITE_INTERRUPT`) once the flag is
//! raised or the deadline passes.

use super::error::{DbError, DbResult};
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of SQLite VM instructions between progress handler calls.
const PROGRESS_HANDLER_OPS: i32 = 4_000;

#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn check(&self) -> DbResult<()> {
        if self.is_cancelled() {
            Err(DbError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Interrupt statements on `conn` once this cancellation fires.
    pub fn install(&self, conn: &Connection) {
        let this = self.clone();
        conn.progress_handler(PROGRESS_HANDLER_OPS, Some(move || this.is_cancelled()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let a = Cancellation::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
        assert!(matches!(b.check(), Err(DbError::Cancelled)));
    }

    #[test]
    fn test_expired_deadline_counts_as_cancelled() {
        let c = Cancellation::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(c.is_cancelled());
        let open = Cancellation::with_timeout(Duration::from_secs(3600));
        assert!(open.check().is_ok());
    }

    #[test]
    fn test_installed_handler_interrupts_running_statement() {
        let conn = Connection::open_in_memory().unwrap();
        let cancel = Cancellation::new();
        cancel.cancel();
        cancel.install(&conn);
        let result: rusqlite::Result<i64> = conn.query_row(
            "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 1000000)
             SELECT COUNT(*) FROM n",
            [],
            |row| row.get(0),
        );
        let err = result.unwrap_err();
        assert!(matches!(DbError::from_interruptible(err), DbError::Cancelled));
    }
}
