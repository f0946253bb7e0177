//! Shared test utilities for database unit tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::tempdir;

use crate::database::{Database, DatabaseConfig};
use crate::{EventId, EventInventory, Money};

/// A fixed "now" shared by database tests.
#[must_use]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 15, 10, 0, 0).unwrap()
}

/// Creates a temporary test database.
///
/// # Panics
///
/// Panics if the temporary directory or database cannot be created.
#[must_use]
pub fn create_test_database() -> Database {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::open(DatabaseConfig::new(path)).unwrap();

    // Keep the directory alive for the lifetime of the test process
    std::mem::forget(dir);

    db
}

/// Inserts an active event a week after [`test_now`] priced at 25.00.
///
/// # Panics
///
/// Panics if the event cannot be stored.
#[must_use]
pub fn insert_test_event(db: &Database, total_capacity: u32) -> EventId {
    let event = EventInventory::builder("Test Event", test_now() + Duration::days(7), total_capacity)
        .price(Money::from_cents(2500).unwrap())
        .build()
        .unwrap();
    Database::insert_event(db.connection(), &event, test_now())
        .unwrap()
        .id()
        .unwrap()
}
