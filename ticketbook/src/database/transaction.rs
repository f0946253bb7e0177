//! Transaction management utilities.
//!
//! Every workflow step runs inside one `BEGIN IMMEDIATE` transaction so that
//! the capacity write and the reservation write commit together. Dropping the
//! returned [`Transaction`] without committing rolls everything back.

use rusqlite::{Transaction, TransactionBehavior};

use crate::error::{Error, Result};

use super::connection::Database;

/// Returns `true` if `err` means another connection holds the write lock.
pub(crate) fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            )
    )
}

impl Database {
    /// Begins an immediate (write-locking) transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockTimeout`] if the write lock could not be taken
    /// within the configured busy timeout, or a database error otherwise.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ticketbook::database::{Database, DatabaseConfig};
    ///
    /// let mut db = Database::open(DatabaseConfig::new("/tmp/ticketbook.db")).unwrap();
    /// let tx = db.begin_transaction().unwrap();
    /// let events = Database::list_events(&tx).unwrap();
    /// tx.commit().unwrap();
    /// # let _ = events;
    /// ```
    pub fn begin_transaction(&mut self) -> Result<Transaction<'_>> {
        let seconds = self.config().busy_timeout.as_secs();
        self.conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| lock_error(e, seconds))
    }

    /// Commits `tx`, mapping a busy database to [`Error::LockTimeout`].
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub fn commit(tx: Transaction<'_>, busy_timeout_secs: u64) -> Result<()> {
        tx.commit().map_err(|e| lock_error(e, busy_timeout_secs))
    }
}

fn lock_error(err: rusqlite::Error, seconds: u64) -> Error {
    if is_busy(&err) {
        Error::LockTimeout { seconds }
    } else {
        Error::Database(err)
    }
}
