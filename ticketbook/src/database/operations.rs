//! Database CRUD operations for events and reservations.
//!
//! Everything here is an associated function taking a `&Connection`, so it
//! can run either on a plain connection or inside a transaction (which
//! dereferences to one). Capacity columns are never written from this
//! module after insertion; see [`crate::ledger`].

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{Error, Result};
use crate::event::{EventId, EventInventory, EventStatus};
use crate::money::Money;
use crate::reservation::{
    Reservation, ReservationCode, ReservationId, ReservationStatus, UserId,
};

use super::connection::Database;
use super::schema::{EVENT_COLUMNS, RESERVATION_COLUMNS};

/// Converts a timestamp to Unix epoch milliseconds for storage.
pub(crate) fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Converts stored Unix epoch milliseconds back to a timestamp.
pub(crate) fn from_millis(millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        rusqlite::Error::ToSqlConversionFailure(
            format!("timestamp {millis} out of range").into(),
        )
    })
}

fn conversion<E>(err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::ToSqlConversionFailure(Box::new(err))
}

/// Maps a row selected with [`EVENT_COLUMNS`] to an event.
pub(crate) fn row_to_event(row: &Row<'_>) -> rusqlite::Result<EventInventory> {
    let id: i64 = row.get(0)?;
    let title: String = row.get(1)?;
    let venue: Option<String> = row.get(2)?;
    let starts_at = from_millis(row.get(3)?)?;
    let price = Money::from_cents(row.get(4)?).map_err(conversion)?;
    let total: u32 = row.get(5)?;
    let available: u32 = row.get(6)?;
    let status: String = row.get(7)?;
    let version: i64 = row.get(8)?;

    let status: EventStatus = status.parse().map_err(conversion)?;

    EventInventory::builder(title, starts_at, total)
        .id(EventId::new(id))
        .venue(venue)
        .price(price)
        .available_capacity(available)
        .status(status)
        .version(version)
        .build()
        .map_err(conversion)
}

/// Maps a row selected with [`RESERVATION_COLUMNS`] to a reservation.
pub(crate) fn row_to_reservation(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    let id: i64 = row.get(0)?;
    let event_id: i64 = row.get(1)?;
    let user_id: i64 = row.get(2)?;
    let ticket_count: u32 = row.get(3)?;
    let total_amount = Money::from_cents(row.get(4)?).map_err(conversion)?;
    let status: String = row.get(5)?;
    let code: String = row.get(6)?;
    let special_requests: Option<String> = row.get(7)?;
    let created_at = from_millis(row.get(8)?)?;
    let updated_at = from_millis(row.get(9)?)?;

    let status: ReservationStatus = status.parse().map_err(conversion)?;
    let code = ReservationCode::new(code).map_err(conversion)?;

    Reservation::builder(
        EventId::new(event_id),
        UserId::new(user_id),
        ticket_count,
        code,
    )
    .id(ReservationId::new(id))
    .total_amount(total_amount)
    .status(status)
    .special_requests(special_requests)
    .created_at(created_at)
    .updated_at(updated_at)
    .build()
    .map_err(conversion)
}

const INSERT_EVENT: &str = r"
    INSERT INTO events
    (title, venue, starts_at, price_cents, total_capacity, available_capacity, status, version, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
";

const UPDATE_EVENT_DETAILS: &str = r"
    UPDATE events
    SET title = ?, venue = ?, starts_at = ?, price_cents = ?, version = version + 1
    WHERE id = ? AND version = ?
";

const UPDATE_EVENT_STATUS: &str = "UPDATE events SET status = ?, version = version + 1 WHERE id = ?";

const INSERT_RESERVATION: &str = r"
    INSERT INTO reservations
    (event_id, user_id, ticket_count, total_amount_cents, status, code, special_requests, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE_RESERVATION_STATUS: &str =
    "UPDATE reservations SET status = ?, updated_at = ? WHERE id = ?";

const COUNT_ACTIVE_FOR_USER_EVENT: &str = r"
    SELECT COUNT(*) FROM reservations
    WHERE user_id = ? AND event_id = ? AND status <> 'cancelled'
";

const SUM_HELD_TICKETS: &str = r"
    SELECT COALESCE(SUM(ticket_count), 0) FROM reservations
    WHERE event_id = ? AND status <> 'cancelled'
";

/// Capacity bookkeeping for one event, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityAudit {
    /// The audited event.
    pub event: EventId,
    /// Total capacity of the event.
    pub total: u32,
    /// Stored available capacity.
    pub available: u32,
    /// Tickets held by non-cancelled reservations.
    pub held: u64,
}

impl CapacityAudit {
    /// Returns `true` if `available + held == total`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        u64::from(self.available) + self.held == u64::from(self.total)
    }
}

impl Database {
    /// Stores a new event and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_event(
        conn: &Connection,
        event: &EventInventory,
        now: DateTime<Utc>,
    ) -> Result<EventInventory> {
        conn.execute(
            INSERT_EVENT,
            params![
                event.title(),
                event.venue(),
                to_millis(event.starts_at()),
                event.price().cents(),
                event.total_capacity(),
                event.available_capacity(),
                event.status().as_str(),
                to_millis(now),
            ],
        )?;
        let id = EventId::new(conn.last_insert_rowid());
        Self::get_event(conn, id)?.ok_or_else(|| Error::event_not_found(id))
    }

    /// Retrieves an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails (other than "not found").
    pub fn get_event(conn: &Connection, id: EventId) -> Result<Option<EventInventory>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?");
        Ok(conn
            .query_row(&sql, [id.value()], row_to_event)
            .optional()?)
    }

    /// Lists every event ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_events(conn: &Connection) -> Result<Vec<EventInventory>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at, id");
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map([], row_to_event)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(events)
    }

    /// Lists events that are bookable at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_bookable_events(
        conn: &Connection,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventInventory>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE status = 'active' AND available_capacity > 0 AND starts_at > ?
             ORDER BY starts_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map([to_millis(now)], row_to_event)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(events)
    }

    /// Sets an event's status.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the event exists and was updated
    /// - `Ok(false)` if the event does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_event_status(
        conn: &Connection,
        id: EventId,
        status: EventStatus,
    ) -> Result<bool> {
        let rows = conn.execute(UPDATE_EVENT_STATUS, params![status.as_str(), id.value()])?;
        Ok(rows > 0)
    }

    /// Writes an event's title, venue, start time and price if its stored
    /// version still matches `event.version()`.
    ///
    /// Returns `Ok(false)` when the row is missing or its version moved on.
    /// Capacity and status columns are not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn update_event_details(conn: &Connection, event: &EventInventory) -> Result<bool> {
        let Some(id) = event.id() else {
            return Ok(false);
        };
        let rows = conn.execute(
            UPDATE_EVENT_DETAILS,
            params![
                event.title(),
                event.venue(),
                to_millis(event.starts_at()),
                event.price().cents(),
                id.value(),
                event.version(),
            ],
        )?;
        Ok(rows > 0)
    }

    /// Stores a new reservation and returns it with its assigned id.
    ///
    /// Unique-constraint failures are translated by
    /// [`crate::guard::translate_insert_conflict`] into
    /// [`Error::DuplicateReservation`] or [`Error::CodeCollision`].
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_reservation(conn: &Connection, reservation: &Reservation) -> Result<Reservation> {
        conn.execute(
            INSERT_RESERVATION,
            params![
                reservation.event_id().value(),
                reservation.user_id().value(),
                reservation.ticket_count(),
                reservation.total_amount().cents(),
                reservation.status().as_str(),
                reservation.code().as_str(),
                reservation.special_requests(),
                to_millis(reservation.created_at()),
                to_millis(reservation.updated_at()),
            ],
        )
        .map_err(|e| crate::guard::translate_insert_conflict(e, reservation))?;

        let id = ReservationId::new(conn.last_insert_rowid());
        Self::get_reservation(conn, id)?.ok_or_else(|| Error::reservation_not_found(id))
    }

    /// Retrieves a reservation by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails (other than "not found").
    pub fn get_reservation(conn: &Connection, id: ReservationId) -> Result<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = ?");
        Ok(conn
            .query_row(&sql, [id.value()], row_to_reservation)
            .optional()?)
    }

    /// Retrieves a reservation by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails (other than "not found").
    pub fn get_reservation_by_code(
        conn: &Connection,
        code: &ReservationCode,
    ) -> Result<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE code = ?");
        Ok(conn
            .query_row(&sql, [code.as_str()], row_to_reservation)
            .optional()?)
    }

    /// Sets a reservation's status and update time.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the reservation exists and was updated
    /// - `Ok(false)` if the reservation does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails. Moving a reservation out of
    /// `cancelled` can hit the active-reservation index; that failure is
    /// reported as [`Error::DuplicateReservation`].
    pub fn update_reservation_status(
        conn: &Connection,
        reservation: &Reservation,
        status: ReservationStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(id) = reservation.id() else {
            return Ok(false);
        };
        let rows = conn
            .execute(
                UPDATE_RESERVATION_STATUS,
                params![status.as_str(), to_millis(at), id.value()],
            )
            .map_err(|e| crate::guard::translate_insert_conflict(e, reservation))?;
        Ok(rows > 0)
    }

    /// Lists a user's reservations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_reservations_for_user(
        conn: &Connection,
        user: UserId,
    ) -> Result<Vec<Reservation>> {
        Self::query_reservations(conn, "WHERE user_id = ?", [user.value()])
    }

    /// Lists an event's reservations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_reservations_for_event(
        conn: &Connection,
        event: EventId,
    ) -> Result<Vec<Reservation>> {
        Self::query_reservations(conn, "WHERE event_id = ?", [event.value()])
    }

    /// Lists every reservation, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_all_reservations(conn: &Connection) -> Result<Vec<Reservation>> {
        Self::query_reservations(conn, "", params![])
    }

    fn query_reservations<P: rusqlite::Params>(
        conn: &Connection,
        filter: &str,
        params: P,
    ) -> Result<Vec<Reservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations {filter} ORDER BY created_at DESC, id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let reservations = stmt
            .query_map(params, row_to_reservation)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(reservations)
    }

    /// Counts non-cancelled reservations for a (user, event) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count_active_reservations(
        conn: &Connection,
        user: UserId,
        event: EventId,
    ) -> Result<u64> {
        let count: i64 = conn.query_row(
            COUNT_ACTIVE_FOR_USER_EVENT,
            params![user.value(), event.value()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Sums the tickets held by non-cancelled reservations of an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn held_tickets(conn: &Connection, event: EventId) -> Result<u64> {
        let held: i64 = conn.query_row(SUM_HELD_TICKETS, [event.value()], |row| row.get(0))?;
        Ok(u64::try_from(held).unwrap_or(0))
    }

    /// Compares an event's stored capacity with the tickets its reservations
    /// hold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the event does not exist, or a
    /// database error.
    pub fn audit_capacity(conn: &Connection, event: EventId) -> Result<CapacityAudit> {
        let stored = Self::get_event(conn, event)?.ok_or_else(|| Error::event_not_found(event))?;
        Ok(CapacityAudit {
            event,
            total: stored.total_capacity(),
            available: stored.available_capacity(),
            held: Self::held_tickets(conn, event)?,
        })
    }

    /// Verifies database integrity using PRAGMA `integrity_check`.
    ///
    /// # Errors
    ///
    /// Returns an error if the integrity check fails or detects corruption.
    pub fn verify_integrity(&self) -> Result<()> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;

        if result == "ok" {
            Ok(())
        } else {
            Err(Error::DatabaseCorruption {
                details: format!("Integrity check failed: {result}"),
            })
        }
    }
}
