//! Reservation types.
//!
//! A reservation is a user's claim on a number of tickets of one event. It
//! references the event and the user by id only. Reservations are never
//! deleted; cancelling one flips its status and hands the tickets back to the
//! event through the capacity ledger.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::event::EventId;
use crate::money::Money;

/// Identifier of a stored reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(i64);

impl ReservationId {
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

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identifier of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
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

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an actor is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May book and manage their own reservations.
    Customer,
    /// May manage events and any reservation.
    Admin,
}

/// The authenticated caller of a workflow operation.
///
/// # Examples
///
/// ```
/// use ticketbook::{Actor, UserId};
///
/// let alice = Actor::customer(UserId::new(1));
/// assert!(alice.may_act_for(UserId::new(1)));
/// assert!(!alice.may_act_for(UserId::new(2)));
///
/// let admin = Actor::admin(UserId::new(99));
/// assert!(admin.may_act_for(UserId::new(2)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    /// The user behind the request.
    pub user: UserId,
    /// The user's role.
    pub role: Role,
}

impl Actor {
    /// A customer acting on their own behalf.
    #[must_use]
    pub const fn customer(user: UserId) -> Self {
        Self {
            user,
            role: Role::Customer,
        }
    }

    /// An administrator.
    #[must_use]
    pub const fn admin(user: UserId) -> Self {
        Self {
            user,
            role: Role::Admin,
        }
    }

    /// Returns `true` for administrators.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns `true` if this actor may touch resources owned by `owner`.
    #[must_use]
    pub fn may_act_for(&self, owner: UserId) -> bool {
        self.is_admin() || self.user == owner
    }
}

/// Status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Awaiting administrative review. Tickets are held.
    Pending,
    /// Booked. Tickets are held.
    Confirmed,
    /// Given up. Tickets were returned to the event.
    Cancelled,
    /// The event took place. Tickets stay accounted as sold.
    Completed,
}

/// Capacity adjustment that must accompany a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityEffect {
    /// Inventory is unchanged.
    None,
    /// Tickets go back to the event.
    Release,
    /// Tickets are taken from the event again.
    Reclaim,
}

impl ReservationStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
    ];

    /// Returns the lowercase name stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` if a reservation in this status counts against the
    /// event's capacity.
    ///
    /// This is also the "active" predicate used by the duplicate guard.
    #[must_use]
    pub const fn holds_capacity(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Validates a status change and returns the capacity adjustment it
    /// requires.
    ///
    /// Allowed moves:
    ///
    /// | from        | to                        |
    /// |-------------|---------------------------|
    /// | `pending`   | `confirmed`, `cancelled`  |
    /// | `confirmed` | `cancelled`, `completed`  |
    /// | `cancelled` | `confirmed`               |
    ///
    /// `completed` is terminal. Moving to the current status is allowed and
    /// has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTransition`] for any other move.
    ///
    /// # Examples
    ///
    /// ```
    /// use ticketbook::{CapacityEffect, ReservationStatus};
    ///
    /// let effect = ReservationStatus::Confirmed
    ///     .transition_to(ReservationStatus::Cancelled)
    ///     .unwrap();
    /// assert_eq!(effect, CapacityEffect::Release);
    ///
    /// assert!(ReservationStatus::Completed
    ///     .transition_to(ReservationStatus::Cancelled)
    ///     .is_err());
    /// ```
    pub fn transition_to(self, to: Self) -> Result<CapacityEffect, Error> {
        use ReservationStatus::{Cancelled, Completed, Confirmed, Pending};

        let allowed = self == to
            || matches!(
                (self, to),
                (Pending, Confirmed | Cancelled)
                    | (Confirmed, Cancelled | Completed)
                    | (Cancelled, Confirmed)
            );
        if !allowed {
            return Err(Error::InvalidTransition { from: self, to });
        }

        Ok(match (self.holds_capacity(), to.holds_capacity()) {
            (true, false) => CapacityEffect::Release,
            (false, true) => CapacityEffect::Reclaim,
            _ => CapacityEffect::None,
        })
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError {
                field: "status".into(),
                message: format!(
                    "unknown reservation status '{s}' (expected pending, confirmed, cancelled or completed)"
                ),
            })
    }
}

/// A human-shareable reservation code such as `RES-7GQ2M4XKD9TPZC3A`.
///
/// Codes are produced by a [`crate::code::CodeGenerator`] and are unique
/// across all reservations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationCode(String);

impl ReservationCode {
    /// Wraps a code string.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty after trimming or contains
    /// characters other than ASCII letters, digits and `-`.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(ValidationError {
                field: "code".into(),
                message: "code must be non-empty".into(),
            });
        }
        if !trimmed
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(ValidationError {
                field: "code".into(),
                message: format!("code '{trimmed}' contains invalid characters"),
            });
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Wraps a code built from the generator alphabet without revalidating.
    pub(crate) const fn from_trusted(code: String) -> Self {
        Self(code)
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReservationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReservationCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A reservation of tickets for one event.
///
/// # Examples
///
/// ```
/// use ticketbook::{EventId, Money, Reservation, ReservationCode, ReservationStatus, UserId};
///
/// let code = ReservationCode::new("RES-TEST0001").unwrap();
/// let reservation = Reservation::builder(EventId::new(1), UserId::new(7), 2, code)
///     .total_amount(Money::from_cents(5000).unwrap())
///     .build()
///     .unwrap();
///
/// assert_eq!(reservation.ticket_count(), 2);
/// assert_eq!(reservation.status(), ReservationStatus::Confirmed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    id: Option<ReservationId>,
    event_id: EventId,
    user_id: UserId,
    ticket_count: u32,
    total_amount: Money,
    status: ReservationStatus,
    code: ReservationCode,
    special_requests: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Starts building a reservation.
    #[must_use]
    pub fn builder(
        event_id: EventId,
        user_id: UserId,
        ticket_count: u32,
        code: ReservationCode,
    ) -> ReservationBuilder {
        ReservationBuilder {
            id: None,
            event_id,
            user_id,
            ticket_count,
            total_amount: Money::ZERO,
            status: ReservationStatus::Confirmed,
            code,
            special_requests: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns the identifier, or `None` for a reservation not yet stored.
    #[must_use]
    pub const fn id(&self) -> Option<ReservationId> {
        self.id
    }

    /// Returns the reserved event.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the number of tickets.
    #[must_use]
    pub const fn ticket_count(&self) -> u32 {
        self.ticket_count
    }

    /// Returns the amount charged, fixed at creation.
    #[must_use]
    pub const fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> ReservationStatus {
        self.status
    }

    /// Returns the reservation code.
    #[must_use]
    pub const fn code(&self) -> &ReservationCode {
        &self.code
    }

    /// Returns the free-text special requests, if any.
    #[must_use]
    pub fn special_requests(&self) -> Option<&str> {
        self.special_requests.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the timestamp of the last status change.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Checks whether the owner may still cancel, given the event start time.
    ///
    /// Only confirmed reservations can be cancelled, and only while the event
    /// starts strictly more than `lead` after `now`. At exactly `lead` the
    /// cancellation is refused.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when cancellation is refused.
    pub fn check_cancellable(
        &self,
        event_starts_at: DateTime<Utc>,
        now: DateTime<Utc>,
        lead: Duration,
    ) -> Result<(), String> {
        if self.status != ReservationStatus::Confirmed {
            return Err(format!("reservation is {}", self.status));
        }
        let window_closes = now.checked_add_signed(lead).ok_or_else(|| {
            format!("cancellation lead of {} hour(s) is out of range", lead.num_hours())
        })?;
        if event_starts_at <= window_closes {
            return Err(format!(
                "event starts within {} hour(s)",
                lead.num_hours()
            ));
        }
        Ok(())
    }

    pub(crate) fn with_status(mut self, status: ReservationStatus, at: DateTime<Utc>) -> Self {
        self.status = status;
        self.updated_at = at;
        self
    }
}

/// Builder for [`Reservation`].
#[derive(Debug)]
pub struct ReservationBuilder {
    id: Option<ReservationId>,
    event_id: EventId,
    user_id: UserId,
    ticket_count: u32,
    total_amount: Money,
    status: ReservationStatus,
    code: ReservationCode,
    special_requests: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl ReservationBuilder {
    /// Sets the stored identifier.
    #[must_use]
    pub const fn id(mut self, id: ReservationId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the total amount.
    #[must_use]
    pub const fn total_amount(mut self, amount: Money) -> Self {
        self.total_amount = amount;
        self
    }

    /// Sets the status. Defaults to [`ReservationStatus::Confirmed`].
    #[must_use]
    pub const fn status(mut self, status: ReservationStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the special requests.
    ///
    /// Text is trimmed; blank text is treated as no requests.
    #[must_use]
    pub fn special_requests(mut self, requests: Option<String>) -> Self {
        self.special_requests = requests
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the last-update timestamp. Defaults to the creation timestamp.
    #[must_use]
    pub const fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builds the reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket count is zero.
    pub fn build(self) -> Result<Reservation, ValidationError> {
        if self.ticket_count == 0 {
            return Err(ValidationError {
                field: "ticket_count".into(),
                message: "ticket count must be at least 1".into(),
            });
        }

        let created_at = self.created_at.unwrap_or_else(Utc::now);
        Ok(Reservation {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            ticket_count: self.ticket_count,
            total_amount: self.total_amount,
            status: self.status,
            code: self.code,
            special_requests: self.special_requests,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        })
    }
}

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// A description of the validation failure.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error for '{}': {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod proptests;
