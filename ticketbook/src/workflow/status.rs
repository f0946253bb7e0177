//! Administrative status changes.

use rusqlite::Connection;

use crate::database::Database;
use crate::error::{Error, Result};
use crate::reservation::{Actor, CapacityEffect, Reservation, ReservationId, ReservationStatus};

use super::cancel::load_reservation;
use super::{ReservationService, UnitContext};

impl ReservationService {
    /// Moves a reservation to `status`, adjusting capacity to match.
    ///
    /// Leaving a capacity-holding status releases the tickets; returning to
    /// `confirmed` from `cancelled` takes them back and fails if they are
    /// gone. Setting the current status again changes nothing. Unlike
    /// [`cancel`](Self::cancel), no lead time applies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] for non-administrators,
    /// [`Error::NotFound`], [`Error::InvalidTransition`],
    /// [`Error::InsufficientCapacity`], [`Error::DuplicateReservation`] when
    /// reinstating would give the user a second active reservation, or
    /// [`Error::TransientConflict`].
    pub fn set_status(
        &mut self,
        id: ReservationId,
        status: ReservationStatus,
        actor: Actor,
    ) -> Result<Reservation> {
        if !actor.is_admin() {
            return Err(Error::Unauthorized {
                user: actor.user,
                action: format!("change the status of reservation {id}"),
            });
        }

        let event = load_reservation(self.db.connection(), id)?.event_id();
        let updated = self.run_locked(event, |tx, ctx| set_status_in(tx, ctx, id, status))?;
        log::info!(
            "reservation {} set to {} by admin {}",
            updated.code(),
            updated.status(),
            actor.user
        );
        Ok(updated)
    }
}

fn set_status_in(
    conn: &Connection,
    ctx: &UnitContext<'_>,
    id: ReservationId,
    status: ReservationStatus,
) -> Result<Reservation> {
    let reservation = load_reservation(conn, id)?;
    if reservation.status() == status {
        return Ok(reservation);
    }

    let effect = reservation.status().transition_to(status)?;
    let ledger = ctx.ledger(conn);
    let (event, tickets) = (reservation.event_id(), reservation.ticket_count());
    match effect {
        CapacityEffect::Release => {
            ledger.release(event, tickets)?;
        }
        CapacityEffect::Reclaim => {
            ledger.reclaim(event, tickets)?;
        }
        CapacityEffect::None => {}
    }

    Database::update_reservation_status(conn, &reservation, status, ctx.now)?;
    log::debug!(
        "reservation {id}: {} -> {status} ({effect:?})",
        reservation.status()
    );
    Ok(reservation.with_status(status, ctx.now))
}
