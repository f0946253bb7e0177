//! Capacity ledger: the only writer of an event's available capacity.
//!
//! Every write is a compare-and-swap on the event row's `version`:
//!
//! 1. read the row (a snapshot)
//! 2. validate the request against the snapshot
//! 3. `UPDATE ... WHERE id = ? AND version = ?`
//!
//! If step 3 touches no row another writer got there first; the ledger
//! re-reads and tries again, up to a bounded number of attempts, then fails
//! with [`Error::TransientConflict`]. Only the contended event row is
//! involved, so writes to unrelated events never conflict with each other.
//!
//! Inside an immediate transaction the snapshot cannot go stale and the
//! first attempt always lands. Outside one (autocommit), the version check
//! is what keeps concurrent writers from overbooking.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Params};

use crate::database::{is_busy, Database};
use crate::error::{Error, Result};
use crate::event::{EventId, EventInventory};

/// Default number of compare-and-swap attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const TAKE_CAPACITY: &str = r"
    UPDATE events
    SET available_capacity = available_capacity - ?1, version = version + 1
    WHERE id = ?2 AND version = ?3 AND available_capacity >= ?1
";

const SET_CAPACITY: &str = r"
    UPDATE events
    SET available_capacity = ?1, version = version + 1
    WHERE id = ?2 AND version = ?3
";

/// Atomic reserve/release operations over one connection.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use rusqlite::Connection;
/// use ticketbook::database::{migrations, Database};
/// use ticketbook::ledger::CapacityLedger;
/// use ticketbook::EventInventory;
///
/// let conn = Connection::open_in_memory().unwrap();
/// migrations::initialize_schema(&conn).unwrap();
/// let now = Utc::now();
/// let event = EventInventory::builder("Gala", now + Duration::days(3), 10).build().unwrap();
/// let id = Database::insert_event(&conn, &event, now).unwrap().id().unwrap();
///
/// let ledger = CapacityLedger::new(&conn);
/// assert_eq!(ledger.reserve(id, 7, now).unwrap().available_capacity(), 3);
/// assert!(ledger.reserve(id, 7, now).is_err());
/// assert_eq!(ledger.release(id, 7).unwrap().available_capacity(), 10);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CapacityLedger<'c> {
    conn: &'c Connection,
    max_attempts: u32,
}

impl<'c> CapacityLedger<'c> {
    /// Creates a ledger over `conn` with [`DEFAULT_MAX_ATTEMPTS`].
    #[must_use]
    pub const fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the number of compare-and-swap attempts (at least 1).
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Reads the current inventory of an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the event does not exist.
    pub fn snapshot(&self, event: EventId) -> Result<EventInventory> {
        Database::get_event(self.conn, event)?.ok_or_else(|| Error::event_not_found(event))
    }

    /// Takes `quantity` tickets from a bookable event.
    ///
    /// Checks, in order: the event exists, it is bookable at `now`, and it
    /// has at least `quantity` tickets left.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::EventNotBookable`],
    /// [`Error::InsufficientCapacity`], [`Error::TransientConflict`] when
    /// every attempt lost the race, or [`Error::Validation`] for a zero
    /// quantity.
    pub fn reserve(
        &self,
        event: EventId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<EventInventory> {
        self.take(event, quantity, Some(now))
    }

    /// Takes `quantity` tickets back for a reinstated reservation.
    ///
    /// Unlike [`reserve`](Self::reserve) the event's status and start time
    /// are not checked; only the remaining capacity is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::InsufficientCapacity`],
    /// [`Error::TransientConflict`] or [`Error::Validation`].
    pub fn reclaim(&self, event: EventId, quantity: u32) -> Result<EventInventory> {
        self.take(event, quantity, None)
    }

    /// Returns `quantity` tickets to an event, capped at its total capacity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or [`Error::TransientConflict`].
    pub fn release(&self, event: EventId, quantity: u32) -> Result<EventInventory> {
        for attempt in 1..=self.max_attempts {
            let snapshot = self.snapshot(event)?;
            let wanted = snapshot.available_capacity().saturating_add(quantity);
            let available = wanted.min(snapshot.total_capacity());
            if available != wanted {
                log::warn!(
                    "release of {quantity} on event {event} capped at total capacity {}",
                    snapshot.total_capacity()
                );
            }

            if self.compare_and_swap(
                SET_CAPACITY,
                params![available, event.value(), snapshot.version()],
            )? {
                log::debug!("released {quantity} on event {event}, {available} available");
                return Ok(snapshot.with_available(available));
            }
            log::debug!("release on event {event} lost race (attempt {attempt})");
        }

        Err(Error::TransientConflict {
            event,
            attempts: self.max_attempts,
        })
    }

    fn take(
        &self,
        event: EventId,
        quantity: u32,
        bookable_at: Option<DateTime<Utc>>,
    ) -> Result<EventInventory> {
        if quantity == 0 {
            return Err(Error::Validation {
                field: "quantity".into(),
                message: "quantity must be at least 1".into(),
            });
        }

        for attempt in 1..=self.max_attempts {
            let snapshot = self.snapshot(event)?;
            if let Some(now) = bookable_at {
                snapshot
                    .check_bookable(now)
                    .map_err(|reason| Error::EventNotBookable { event, reason })?;
            }
            if snapshot.available_capacity() < quantity {
                return Err(Error::InsufficientCapacity {
                    event,
                    requested: quantity,
                    available: snapshot.available_capacity(),
                });
            }

            if self.compare_and_swap(
                TAKE_CAPACITY,
                params![quantity, event.value(), snapshot.version()],
            )? {
                let available = snapshot.available_capacity() - quantity;
                log::debug!("took {quantity} on event {event}, {available} available");
                return Ok(snapshot.with_available(available));
            }
            log::debug!("take on event {event} lost race (attempt {attempt})");
        }

        Err(Error::TransientConflict {
            event,
            attempts: self.max_attempts,
        })
    }

    /// Runs one conditional update. A busy database counts as a lost race.
    fn compare_and_swap(&self, sql: &str, params: impl Params) -> Result<bool> {
        match self.conn.execute(sql, params) {
            Ok(rows) => Ok(rows == 1),
            Err(e) if is_busy(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::{create_test_database, insert_test_event, test_now};
    use crate::error::NotBookableReason;
    use crate::event::EventStatus;
    use chrono::Duration;

    #[test]
    fn test_reserve_decrements() {
        let db = create_test_database();
        let event = insert_test_event(&db, 10);
        let ledger = CapacityLedger::new(db.connection());

        let after = ledger.reserve(event, 4, test_now()).unwrap();
        assert_eq!(after.available_capacity(), 6);
        assert_eq!(after.version(), 1);
        assert_eq!(ledger.snapshot(event).unwrap(), after);
    }

    #[test]
    fn test_reserve_exact_remaining() {
        let db = create_test_database();
        let event = insert_test_event(&db, 3);
        let ledger = CapacityLedger::new(db.connection());

        assert_eq!(ledger.reserve(event, 3, test_now()).unwrap().available_capacity(), 0);
    }

    #[test]
    fn test_reserve_insufficient_leaves_capacity() {
        let db = create_test_database();
        let event = insert_test_event(&db, 10);
        let ledger = CapacityLedger::new(db.connection());
        ledger.reserve(event, 7, test_now()).unwrap();

        let err = ledger.reserve(event, 7, test_now()).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientCapacity { requested: 7, available: 3, .. }
        ));
        assert_eq!(ledger.snapshot(event).unwrap().available_capacity(), 3);
    }

    #[test]
    fn test_reserve_unknown_event() {
        let db = create_test_database();
        let ledger = CapacityLedger::new(db.connection());
        let err = ledger.reserve(EventId::new(42), 1, test_now()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_reserve_sold_out_is_not_bookable() {
        let db = create_test_database();
        let event = insert_test_event(&db, 2);
        let ledger = CapacityLedger::new(db.connection());
        ledger.reserve(event, 2, test_now()).unwrap();

        let err = ledger.reserve(event, 1, test_now()).unwrap_err();
        assert!(matches!(
            err,
            Error::EventNotBookable { reason: NotBookableReason::SoldOut, .. }
        ));
    }

    #[test]
    fn test_reserve_inactive_or_started_event() {
        let db = create_test_database();
        let event = insert_test_event(&db, 5);
        let ledger = CapacityLedger::new(db.connection());

        let after_start = test_now() + Duration::days(8);
        assert!(matches!(
            ledger.reserve(event, 1, after_start).unwrap_err(),
            Error::EventNotBookable { reason: NotBookableReason::AlreadyStarted, .. }
        ));

        Database::update_event_status(db.connection(), event, EventStatus::Cancelled).unwrap();
        assert!(matches!(
            ledger.reserve(event, 1, test_now()).unwrap_err(),
            Error::EventNotBookable {
                reason: NotBookableReason::NotActive(EventStatus::Cancelled),
                ..
            }
        ));
        assert_eq!(ledger.snapshot(event).unwrap().available_capacity(), 5);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let db = create_test_database();
        let event = insert_test_event(&db, 5);
        let ledger = CapacityLedger::new(db.connection());
        assert!(matches!(
            ledger.reserve(event, 0, test_now()).unwrap_err(),
            Error::Validation { .. }
        ));
        assert!(matches!(
            ledger.reclaim(event, 0).unwrap_err(),
            Error::Validation { .. }
        ));
    }

    #[test]
    fn test_release_restores() {
        let db = create_test_database();
        let event = insert_test_event(&db, 10);
        let ledger = CapacityLedger::new(db.connection());
        ledger.reserve(event, 6, test_now()).unwrap();

        assert_eq!(ledger.release(event, 6).unwrap().available_capacity(), 10);
    }

    #[test]
    fn test_release_capped_at_total() {
        let db = create_test_database();
        let event = insert_test_event(&db, 10);
        let ledger = CapacityLedger::new(db.connection());
        ledger.reserve(event, 2, test_now()).unwrap();

        let after = ledger.release(event, 5).unwrap();
        assert_eq!(after.available_capacity(), 10);
        let again = ledger.release(event, 1).unwrap();
        assert_eq!(again.available_capacity(), 10);
    }

    #[test]
    fn test_release_unknown_event() {
        let db = create_test_database();
        let ledger = CapacityLedger::new(db.connection());
        assert!(matches!(
            ledger.release(EventId::new(5), 1).unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_reclaim_ignores_status_but_not_capacity() {
        let db = create_test_database();
        let event = insert_test_event(&db, 4);
        let ledger = CapacityLedger::new(db.connection());
        ledger.reserve(event, 3, test_now()).unwrap();
        Database::update_event_status(db.connection(), event, EventStatus::Postponed).unwrap();

        assert_eq!(ledger.reclaim(event, 1).unwrap().available_capacity(), 0);
        assert!(matches!(
            ledger.reclaim(event, 1).unwrap_err(),
            Error::InsufficientCapacity { requested: 1, available: 0, .. }
        ));
    }

    #[test]
    fn test_version_is_read_fresh() {
        let db = create_test_database();
        let event = insert_test_event(&db, 10);
        // Bump the version behind the ledger's back
        db.connection()
            .execute("UPDATE events SET version = version + 5 WHERE id = ?", [event.value()])
            .unwrap();

        let ledger = CapacityLedger::new(db.connection()).with_max_attempts(1);
        let after = ledger.reserve(event, 1, test_now()).unwrap();
        assert_eq!(after.version(), 6);
    }
}
