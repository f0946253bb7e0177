//! Reservation workflow: create, cancel and administrative status changes.
//!
//! [`ReservationService`] composes the duplicate guard, the capacity ledger
//! and the code generator. Each operation runs as one unit of work:
//!
//! 1. take the event's in-process lock ([`EventLocks`])
//! 2. open a `BEGIN IMMEDIATE` transaction
//! 3. read, validate, write ledger and reservation rows
//! 4. commit
//!
//! Any error before the commit drops the transaction, which rolls back every
//! write of the unit. Retryable failures (a busy database, a lost
//! compare-and-swap, a code collision) restart the unit from step 2, up to
//! the policy's attempt limit; after that the caller gets
//! [`Error::TransientConflict`].
//!
//! # Examples
//!
//! ```no_run
//! use ticketbook::workflow::{CreateRequest, ReservationService};
//! use ticketbook::config::ReservationPolicy;
//! use ticketbook::{Actor, Database, DatabaseConfig, EventId, UserId};
//!
//! let db = Database::open(DatabaseConfig::new("/tmp/ticketbook.db")).unwrap();
//! let mut service = ReservationService::new(db, ReservationPolicy::default()).unwrap();
//!
//! let request = CreateRequest::new(EventId::new(1), UserId::new(7), 2)
//!     .with_special_requests(Some("aisle seats".into()));
//! let reservation = service.create(&request).unwrap();
//! println!("booked {}", reservation.code());
//!
//! let reservation_id = reservation.id().unwrap();
//! service.cancel(reservation_id, Actor::customer(UserId::new(7))).unwrap();
//! ```

mod cancel;
mod create;
pub mod init;
mod query;
mod status;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Transaction;

use crate::clock::{Clock, SystemClock};
use crate::code::{CodeGenerator, RandomCodeGenerator};
use crate::config::ReservationPolicy;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::event::EventId;
use crate::ledger::CapacityLedger;
use crate::locks::EventLocks;

pub use create::CreateRequest;
pub use init::{
    init_database, inspect_store, ConfigOutcome, ExistingStore, InitOptions, InitResult,
};

/// Entry point for every reservation and event operation.
///
/// A service owns one database connection. Use [`handle`](Self::handle) to
/// obtain another service for a different thread; handles share the event
/// locks, clock, code generator and policy.
pub struct ReservationService {
    db: Database,
    locks: EventLocks,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeGenerator>,
    policy: ReservationPolicy,
}

impl ReservationService {
    /// Creates a service using the system clock and random codes with the
    /// policy's prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the policy's code prefix is invalid.
    pub fn new(db: Database, policy: ReservationPolicy) -> Result<Self> {
        let codes = RandomCodeGenerator::with_prefix(&policy.code_prefix)?;
        Ok(Self {
            db,
            locks: EventLocks::new(),
            clock: Arc::new(SystemClock),
            codes: Arc::new(codes),
            policy,
        })
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the code generator.
    #[must_use]
    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    /// Opens a new connection to the same database, sharing everything else.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reopened.
    pub fn handle(&self) -> Result<Self> {
        Ok(Self {
            db: self.db.reconnect()?,
            locks: self.locks.clone(),
            clock: Arc::clone(&self.clock),
            codes: Arc::clone(&self.codes),
            policy: self.policy.clone(),
        })
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &ReservationPolicy {
        &self.policy
    }

    /// Returns the underlying database.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the service's notion of the current time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Runs `work` on `event` as one serialized, retried unit of work.
    fn run_locked<T>(
        &mut self,
        event: EventId,
        work: impl FnMut(&Transaction<'_>, &UnitContext<'_>) -> Result<T>,
    ) -> Result<T> {
        let lock = self.locks.handle(event);
        let _guard = lock.lock();
        let ctx = UnitContext {
            now: self.clock.now(),
            codes: self.codes.as_ref(),
            policy: &self.policy,
        };
        unit_of_work(&mut self.db, event, self.policy.max_conflict_retries, &ctx, work)
    }
}

/// Values fixed for the duration of one unit of work.
struct UnitContext<'a> {
    now: DateTime<Utc>,
    codes: &'a dyn CodeGenerator,
    policy: &'a ReservationPolicy,
}

impl UnitContext<'_> {
    fn ledger<'c>(&self, conn: &'c rusqlite::Connection) -> CapacityLedger<'c> {
        CapacityLedger::new(conn).with_max_attempts(self.policy.max_conflict_retries)
    }
}

fn unit_of_work<T>(
    db: &mut Database,
    event: EventId,
    attempts: u32,
    ctx: &UnitContext<'_>,
    mut work: impl FnMut(&Transaction<'_>, &UnitContext<'_>) -> Result<T>,
) -> Result<T> {
    let attempts = attempts.max(1);
    let busy_timeout = db.config().busy_timeout.as_secs();

    for attempt in 1..=attempts {
        let outcome = db.begin_transaction().and_then(|tx| {
            let value = work(&tx, ctx)?;
            Database::commit(tx, busy_timeout)?;
            Ok(value)
        });
        match outcome {
            Err(e) if e.is_retryable() => {
                log::debug!("unit of work on event {event} failed (attempt {attempt}): {e}");
            }
            other => return other,
        }
    }

    log::warn!("giving up on event {event} after {attempts} attempt(s)");
    Err(Error::TransientConflict { event, attempts })
}
