//! Duplicate guard: at most one active reservation per (user, event).
//!
//! The check is a plain query evaluated inside the workflow's transaction.
//! The partial unique index on `reservations(user_id, event_id)` is the
//! authoritative signal; its violation is translated into the same
//! [`Error::DuplicateReservation`] the query produces.

use rusqlite::Connection;

use crate::database::Database;
use crate::error::{Error, Result};
use crate::event::EventId;
use crate::reservation::{Reservation, UserId};

/// Returns `true` if `user` holds a non-cancelled reservation for `event`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn has_active_reservation(conn: &Connection, user: UserId, event: EventId) -> Result<bool> {
    Ok(Database::count_active_reservations(conn, user, event)? > 0)
}

/// Fails with [`Error::DuplicateReservation`] if `user` already holds an
/// active reservation for `event`.
///
/// # Errors
///
/// Returns [`Error::DuplicateReservation`] or a database error.
pub fn ensure_no_active_reservation(conn: &Connection, user: UserId, event: EventId) -> Result<()> {
    if has_active_reservation(conn, user, event)? {
        log::debug!("user {user} already holds a reservation for event {event}");
        return Err(Error::DuplicateReservation { user, event });
    }
    Ok(())
}

/// Translates a unique-constraint failure on the reservations table.
///
/// - the active (user, event) index becomes [`Error::DuplicateReservation`]
/// - the `code` column becomes [`Error::CodeCollision`]
/// - anything else is passed through as a database error
pub(crate) fn translate_insert_conflict(err: rusqlite::Error, reservation: &Reservation) -> Error {
    let rusqlite::Error::SqliteFailure(ref failure, Some(ref message)) = err else {
        return Error::Database(err);
    };
    if failure.code != rusqlite::ErrorCode::ConstraintViolation {
        return Error::Database(err);
    }

    if message.contains("reservations.code") {
        Error::CodeCollision {
            code: reservation.code().to_string(),
        }
    } else if message.contains("reservations.user_id") && message.contains("reservations.event_id")
    {
        Error::DuplicateReservation {
            user: reservation.user_id(),
            event: reservation.event_id(),
        }
    } else {
        Error::Database(err)
    }
}
