//! Event inventory types.
//!
//! An event carries the ticket inventory that reservations draw from. The
//! capacity fields are read here but only ever written by
//! [`crate::ledger`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotBookableReason;
use crate::money::Money;
use crate::reservation::ValidationError;

/// Identifier of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(i64);

impl EventId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Open for booking.
    Active,
    /// Called off.
    Cancelled,
    /// Already took place.
    Completed,
    /// Moved to an undecided date.
    Postponed,
}

impl EventStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::Cancelled,
        Self::Completed,
        Self::Postponed,
    ];

    /// Returns the lowercase name stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Postponed => "postponed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError {
                field: "status".into(),
                message: format!(
                    "unknown event status '{s}' (expected active, cancelled, completed or postponed)"
                ),
            })
    }
}

/// A stored event and its ticket inventory.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use ticketbook::{EventInventory, EventStatus, Money};
///
/// let now = Utc::now();
/// let event = EventInventory::builder("Spring Gala", now + Duration::days(30), 100)
///     .price(Money::from_cents(2500).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(event.available_capacity(), 100);
/// assert_eq!(event.status(), EventStatus::Active);
/// assert!(event.is_bookable(now));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInventory {
    id: Option<EventId>,
    title: String,
    venue: Option<String>,
    starts_at: DateTime<Utc>,
    price: Money,
    total_capacity: u32,
    available_capacity: u32,
    status: EventStatus,
    #[serde(skip)]
    version: i64,
}

impl EventInventory {
    /// Starts building a new event.
    #[must_use]
    pub fn builder(
        title: impl Into<String>,
        starts_at: DateTime<Utc>,
        total_capacity: u32,
    ) -> EventInventoryBuilder {
        EventInventoryBuilder {
            id: None,
            title: title.into(),
            venue: None,
            starts_at,
            price: Money::ZERO,
            total_capacity,
            available_capacity: None,
            status: EventStatus::Active,
            version: 0,
        }
    }

    /// Returns the identifier, or `None` for an event not yet stored.
    #[must_use]
    pub const fn id(&self) -> Option<EventId> {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the venue, if any.
    #[must_use]
    pub fn venue(&self) -> Option<&str> {
        self.venue.as_deref()
    }

    /// Returns the start time.
    #[must_use]
    pub const fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// Returns the unit ticket price.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }

    /// Returns the fixed number of tickets the event was created with.
    #[must_use]
    pub const fn total_capacity(&self) -> u32 {
        self.total_capacity
    }

    /// Returns the number of tickets still bookable.
    #[must_use]
    pub const fn available_capacity(&self) -> u32 {
        self.available_capacity
    }

    /// Returns the number of tickets currently held by reservations.
    #[must_use]
    pub const fn held_capacity(&self) -> u32 {
        self.total_capacity - self.available_capacity
    }

    /// Returns the event status.
    #[must_use]
    pub const fn status(&self) -> EventStatus {
        self.status
    }

    /// Returns the row version used for compare-and-swap updates.
    #[must_use]
    pub const fn version(&self) -> i64 {
        self.version
    }

    /// Checks whether the event accepts new reservations at `now`.
    ///
    /// An event is bookable when it is active, has at least one ticket left
    /// and starts strictly after `now`.
    ///
    /// # Errors
    ///
    /// Returns the first reason the event cannot be booked.
    pub fn check_bookable(&self, now: DateTime<Utc>) -> Result<(), NotBookableReason> {
        if self.status != EventStatus::Active {
            return Err(NotBookableReason::NotActive(self.status));
        }
        if self.available_capacity == 0 {
            return Err(NotBookableReason::SoldOut);
        }
        if self.starts_at <= now {
            return Err(NotBookableReason::AlreadyStarted);
        }
        Ok(())
    }

    /// Returns `true` if [`check_bookable`](Self::check_bookable) passes.
    #[must_use]
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        self.check_bookable(now).is_ok()
    }

    /// The state after a successful ledger write of `available`.
    pub(crate) fn with_available(mut self, available: u32) -> Self {
        self.available_capacity = available;
        self.version += 1;
        self
    }
}

/// Changes to an event's descriptive fields.
///
/// Fields left unset keep their stored value. Capacity and status are not
/// part of an update: capacity moves only through the ledger and status
/// through [`set_event_status`](crate::ReservationService::set_event_status).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use ticketbook::event::EventUpdate;
///
/// let update = EventUpdate::new()
///     .title("Gala (rescheduled)")
///     .starts_at(Utc.with_ymd_and_hms(2030, 6, 1, 19, 0, 0).unwrap());
/// assert!(!update.is_empty());
/// assert!(EventUpdate::new().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventUpdate {
    title: Option<String>,
    venue: Option<Option<String>>,
    starts_at: Option<DateTime<Utc>>,
    price: Option<Money>,
}

impl EventUpdate {
    /// An update that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the venue; `None` clears it.
    #[must_use]
    pub fn venue(mut self, venue: Option<String>) -> Self {
        self.venue = Some(venue);
        self
    }

    /// Moves the event to a new start time.
    #[must_use]
    pub const fn starts_at(mut self, starts_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self
    }

    /// Changes the unit price of future reservations.
    #[must_use]
    pub const fn price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.venue.is_none()
            && self.starts_at.is_none()
            && self.price.is_none()
    }
}

impl EventInventory {
    /// Applies `update`, keeping id, capacity, status and version.
    ///
    /// # Errors
    ///
    /// Returns the same validation errors as [`EventInventoryBuilder::build`].
    pub fn with_update(&self, update: &EventUpdate) -> Result<Self, ValidationError> {
        let title = update.title.clone().unwrap_or_else(|| self.title.clone());
        let venue = update.venue.clone().unwrap_or_else(|| self.venue.clone());
        let starts_at = update.starts_at.unwrap_or(self.starts_at);

        let mut builder = Self::builder(title, starts_at, self.total_capacity)
            .venue(venue)
            .price(update.price.unwrap_or(self.price))
            .available_capacity(self.available_capacity)
            .status(self.status)
            .version(self.version);
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        builder.build()
    }
}

/// Builder for [`EventInventory`].
#[derive(Debug)]
pub struct EventInventoryBuilder {
    id: Option<EventId>,
    title: String,
    venue: Option<String>,
    starts_at: DateTime<Utc>,
    price: Money,
    total_capacity: u32,
    available_capacity: Option<u32>,
    status: EventStatus,
    version: i64,
}

impl EventInventoryBuilder {
    /// Sets the stored identifier.
    #[must_use]
    pub const fn id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the venue. Whitespace is trimmed.
    #[must_use]
    pub fn venue(mut self, venue: Option<String>) -> Self {
        self.venue = venue.map(|v| v.trim().to_string());
        self
    }

    /// Sets the unit ticket price.
    #[must_use]
    pub const fn price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    /// Sets the remaining capacity. Defaults to the total capacity.
    #[must_use]
    pub const fn available_capacity(mut self, available: u32) -> Self {
        self.available_capacity = Some(available);
        self
    }

    /// Sets the status. Defaults to [`EventStatus::Active`].
    #[must_use]
    pub const fn status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub(crate) const fn version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Builds the event.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The title is empty after trimming
    /// - The venue is provided but empty after trimming
    /// - The total capacity is zero
    /// - The available capacity exceeds the total capacity
    pub fn build(self) -> Result<EventInventory, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError {
                field: "title".into(),
                message: "title must be non-empty after trimming whitespace".into(),
            });
        }
        if let Some(ref venue) = self.venue {
            if venue.is_empty() {
                return Err(ValidationError {
                    field: "venue".into(),
                    message: "venue must be non-empty after trimming whitespace".into(),
                });
            }
        }
        if self.total_capacity == 0 {
            return Err(ValidationError {
                field: "total_capacity".into(),
                message: "total capacity must be at least 1".into(),
            });
        }
        let available_capacity = self.available_capacity.unwrap_or(self.total_capacity);
        if available_capacity > self.total_capacity {
            return Err(ValidationError {
                field: "available_capacity".into(),
                message: format!(
                    "available capacity {available_capacity} exceeds total capacity {}",
                    self.total_capacity
                ),
            });
        }

        Ok(EventInventory {
            id: self.id,
            title,
            venue: self.venue,
            starts_at: self.starts_at,
            price: self.price,
            total_capacity: self.total_capacity,
            available_capacity,
            status: self.status,
            version: self.version,
        })
    }
}
