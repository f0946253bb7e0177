//! Error types for the ticketbook library.
//!
//! Every operation in the library reports failure through [`Error`]. Domain
//! rejections (an event that cannot be booked, a sold-out event, a duplicate
//! booking) are ordinary variants that callers are expected to match on and
//! surface to the end user unchanged.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::event::{EventId, EventStatus};
use crate::reservation::{ReservationId, ReservationStatus, UserId};

/// Result type alias for operations that may fail with a ticketbook error.
///
/// # Examples
///
/// ```
/// use ticketbook::{Error, Result};
///
/// fn example_operation() -> Result<u32> {
///     Ok(10)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the ticketbook library.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested event or reservation does not exist, or is not visible
    /// to the requesting actor.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// The actor is neither the owner of the resource nor an administrator.
    #[error("user {user} is not allowed to {action}")]
    Unauthorized {
        /// The user that attempted the action.
        user: UserId,
        /// The attempted action.
        action: String,
    },

    /// The event cannot accept new reservations.
    #[error("event {event} is not bookable: {reason}")]
    EventNotBookable {
        /// The event that was requested.
        event: EventId,
        /// Why the event cannot be booked.
        reason: NotBookableReason,
    },

    /// The event does not have enough remaining tickets.
    #[error("event {event} has {available} ticket(s) left, {requested} requested")]
    InsufficientCapacity {
        /// The event that was requested.
        event: EventId,
        /// The number of tickets requested.
        requested: u32,
        /// The number of tickets that were available.
        available: u32,
    },

    /// The user already holds an active reservation for the event.
    #[error("user {user} already holds an active reservation for event {event}")]
    DuplicateReservation {
        /// The user that attempted to book.
        user: UserId,
        /// The event that was requested.
        event: EventId,
    },

    /// The reservation cannot be cancelled.
    #[error("reservation {reservation} cannot be cancelled: {reason}")]
    NotCancellable {
        /// The reservation that was targeted.
        reservation: ReservationId,
        /// Why the cancellation was refused.
        reason: String,
    },

    /// Concurrent writers kept winning the race for the event row.
    ///
    /// The request had no effect and may be retried as a whole.
    #[error("event {event} is under contention, gave up after {attempts} attempt(s)")]
    TransientConflict {
        /// The contended event.
        event: EventId,
        /// The number of attempts made.
        attempts: u32,
    },

    /// A freshly generated reservation code already exists.
    ///
    /// Handled inside the reservation workflow and never returned by it.
    #[error("reservation code {code} is already taken")]
    CodeCollision {
        /// The colliding code.
        code: String,
    },

    /// The requested status change is not allowed.
    #[error("cannot move reservation from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ReservationStatus,
        /// The requested status.
        to: ReservationStatus,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A configuration error occurred.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },

    /// A database lock timeout occurred.
    #[error("database lock timeout after {seconds}s")]
    LockTimeout {
        /// The number of seconds waited before timing out.
        seconds: u64,
    },

    /// The data directory was not found and auto-initialization is disabled.
    #[error("data directory not found: {}", path.display())]
    DataDirectoryNotFound {
        /// The expected path to the data directory.
        path: PathBuf,
    },

    /// Stored data could not be interpreted.
    #[error("database corruption detected: {details}")]
    DatabaseCorruption {
        /// Details about the corruption.
        details: String,
    },

    /// An unsupported schema version was encountered.
    #[error("unsupported schema version: expected {expected}, found {found}")]
    UnsupportedSchemaVersion {
        /// The expected schema version.
        expected: u32,
        /// The schema version found in the database.
        found: u32,
    },
}

/// Reason why an event cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotBookableReason {
    /// The event is not in the `active` status.
    NotActive(EventStatus),
    /// No tickets remain.
    SoldOut,
    /// The event start time is not in the future.
    AlreadyStarted,
}

impl fmt::Display for NotBookableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotActive(status) => write!(f, "event is {status}"),
            Self::SoldOut => write!(f, "sold out"),
            Self::AlreadyStarted => write!(f, "event has already started"),
        }
    }
}

impl From<crate::reservation::ValidationError> for Error {
    fn from(err: crate::reservation::ValidationError) -> Self {
        Self::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl Error {
    /// Returns `true` if repeating the whole request may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use ticketbook::{Error, EventId};
    ///
    /// let err = Error::TransientConflict { event: EventId::new(1), attempts: 3 };
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::NotFound { resource: "event 1".into() };
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientConflict { .. } | Self::LockTimeout { .. }
        )
    }

    /// Returns `true` for deterministic rejections of a well-formed request.
    ///
    /// These are the outcomes an end user should see verbatim.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Unauthorized { .. }
                | Self::EventNotBookable { .. }
                | Self::InsufficientCapacity { .. }
                | Self::DuplicateReservation { .. }
                | Self::NotCancellable { .. }
                | Self::InvalidTransition { .. }
        )
    }

    pub(crate) fn event_not_found(id: EventId) -> Self {
        Self::NotFound {
            resource: format!("event {id}"),
        }
    }

    pub(crate) fn reservation_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: format!("reservation {id}"),
        }
    }
}
