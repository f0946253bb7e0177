//! Common test utilities for integration tests.
//!
//! This module provides helper functions and fixture builders for testing
//! the ticketbook library.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use ticketbook::code::SequentialCodeGenerator;
use ticketbook::config::ReservationPolicy;
use ticketbook::database::{Database, DatabaseConfig};
use ticketbook::{EventId, EventInventory, FixedClock, Money, ReservationService};

/// The instant every fixture clock starts at.
#[allow(dead_code)]
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap()
}

/// A service over a fresh database in its own temporary directory.
///
/// The directory lives as long as the returned `TempDir`.
#[allow(dead_code)]
pub struct Fixture {
    pub dir: TempDir,
    pub clock: Arc<FixedClock>,
    pub service: ReservationService,
}

impl Fixture {
    /// Creates a fixture with the default policy.
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::with_policy(ReservationPolicy::default())
    }

    /// Creates a fixture with `policy`.
    #[allow(dead_code)]
    pub fn with_policy(policy: ReservationPolicy) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(DatabaseConfig::new(dir.path().join("ticketbook.db"))).unwrap();
        let clock = Arc::new(FixedClock::new(test_now()));
        let service = ReservationService::new(db, policy)
            .unwrap()
            .with_clock(clock.clone())
            .with_code_generator(Arc::new(SequentialCodeGenerator::new()));
        Self {
            dir,
            clock,
            service,
        }
    }

    /// Stores an active event starting `days` after [`test_now`].
    #[allow(dead_code)]
    pub fn event(&self, capacity: u32, days: i64) -> EventId {
        let event = EventFixture::new(capacity)
            .starting_in(Duration::days(days))
            .build();
        Database::insert_event(self.service.database().connection(), &event, test_now())
            .unwrap()
            .id()
            .unwrap()
    }

    /// Reads an event's remaining tickets straight from the database.
    #[allow(dead_code)]
    pub fn available(&self, event: EventId) -> u32 {
        Database::get_event(self.service.database().connection(), event)
            .unwrap()
            .unwrap()
            .available_capacity()
    }
}

/// Builder for test events with sensible defaults.
///
/// Defaults:
/// - title: "Fixture Event"
/// - starts one week after [`test_now`]
/// - price: 25.00
#[allow(dead_code)]
pub struct EventFixture {
    title: String,
    capacity: u32,
    starts_in: Duration,
    price_cents: i64,
}

impl EventFixture {
    #[allow(dead_code)]
    pub fn new(capacity: u32) -> Self {
        Self {
            title: "Fixture Event".to_string(),
            capacity,
            starts_in: Duration::days(7),
            price_cents: 2500,
        }
    }

    #[allow(dead_code)]
    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    #[allow(dead_code)]
    pub fn starting_in(mut self, offset: Duration) -> Self {
        self.starts_in = offset;
        self
    }

    #[allow(dead_code)]
    pub fn priced(mut self, cents: i64) -> Self {
        self.price_cents = cents;
        self
    }

    /// Builds the event.
    ///
    /// # Panics
    ///
    /// Panics if the fixture does not validate.
    pub fn build(self) -> EventInventory {
        EventInventory::builder(self.title, test_now() + self.starts_in, self.capacity)
            .price(Money::from_cents(self.price_cents).expect("fixture price is valid"))
            .build()
            .expect("fixture should build a valid event")
    }
}
