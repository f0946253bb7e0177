//! Reservation cancellation by its owner.

use rusqlite::Connection;

use crate::database::Database;
use crate::error::{Error, Result};
use crate::reservation::{Actor, Reservation, ReservationId, ReservationStatus};

use super::{ReservationService, UnitContext};

impl ReservationService {
    /// Cancels a confirmed reservation and returns its tickets to the event.
    ///
    /// The owner, or an administrator, may cancel while the event starts
    /// strictly more than the policy's lead time from now. The status flip and
    /// the capacity release commit together.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown reservation,
    /// [`Error::Unauthorized`] when `actor` is neither owner nor admin,
    /// [`Error::NotCancellable`] when the reservation is not confirmed or
    /// the event is too close, or [`Error::TransientConflict`].
    pub fn cancel(&mut self, id: ReservationId, actor: Actor) -> Result<Reservation> {
        let event = load_reservation(self.db.connection(), id)?.event_id();
        let cancelled = self.run_locked(event, |tx, ctx| cancel_in(tx, ctx, id, actor))?;
        log::info!(
            "reservation {} cancelled by user {}, {} ticket(s) released",
            cancelled.code(),
            actor.user,
            cancelled.ticket_count()
        );
        Ok(cancelled)
    }
}

pub(super) fn load_reservation(conn: &Connection, id: ReservationId) -> Result<Reservation> {
    Database::get_reservation(conn, id)?.ok_or_else(|| Error::reservation_not_found(id))
}

fn cancel_in(
    conn: &Connection,
    ctx: &UnitContext<'_>,
    id: ReservationId,
    actor: Actor,
) -> Result<Reservation> {
    let reservation = load_reservation(conn, id)?;
    if !actor.may_act_for(reservation.user_id()) {
        return Err(Error::Unauthorized {
            user: actor.user,
            action: format!("cancel reservation {id}"),
        });
    }

    let event = ctx.ledger(conn).snapshot(reservation.event_id())?;
    reservation
        .check_cancellable(event.starts_at(), ctx.now, ctx.policy.cancellation_lead())
        .map_err(|reason| Error::NotCancellable {
            reservation: id,
            reason,
        })?;

    Database::update_reservation_status(conn, &reservation, ReservationStatus::Cancelled, ctx.now)?;
    ctx.ledger(conn)
        .release(reservation.event_id(), reservation.ticket_count())?;

    Ok(reservation.with_status(ReservationStatus::Cancelled, ctx.now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util::insert_test_event;
    use crate::event::EventId;
    use crate::reservation::UserId;
    use crate::workflow::test_util::test_service;
    use crate::workflow::CreateRequest;
    use chrono::Duration;

    fn available(service: &ReservationService, event: EventId) -> u32 {
        Database::get_event(service.database().connection(), event)
            .unwrap()
            .unwrap()
            .available_capacity()
    }

    fn book(service: &mut ReservationService, event: EventId, user: i64, qty: u32) -> Reservation {
        service
            .create(&CreateRequest::new(event, UserId::new(user), qty))
            .unwrap()
    }

    #[test]
    fn test_cancel_restores_capacity() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let r = book(&mut service, event, 1, 2);
        assert_eq!(available(&service, event), 8);

        let cancelled = service
            .cancel(r.id().unwrap(), Actor::customer(UserId::new(1)))
            .unwrap();
        assert_eq!(cancelled.status(), ReservationStatus::Cancelled);
        assert_eq!(cancelled.total_amount(), r.total_amount());
        assert_eq!(available(&service, event), 10);

        let stored = load_reservation(service.database().connection(), r.id().unwrap()).unwrap();
        assert_eq!(stored.status(), ReservationStatus::Cancelled);
    }

    #[test]
    fn test_cancel_unknown_reservation() {
        let (mut service, _clock) = test_service();
        let err = service
            .cancel(ReservationId::new(77), Actor::customer(UserId::new(1)))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_cancel_by_other_user_unauthorized() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let r = book(&mut service, event, 1, 2);

        let err = service
            .cancel(r.id().unwrap(), Actor::customer(UserId::new(2)))
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized { user, .. } if user == UserId::new(2)));
        assert_eq!(available(&service, event), 8);

        // Administrators may cancel on the owner's behalf
        service
            .cancel(r.id().unwrap(), Actor::admin(UserId::new(99)))
            .unwrap();
        assert_eq!(available(&service, event), 10);
    }

    #[test]
    fn test_cancel_twice_not_cancellable() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let r = book(&mut service, event, 1, 2);
        let owner = Actor::customer(UserId::new(1));

        service.cancel(r.id().unwrap(), owner).unwrap();
        let err = service.cancel(r.id().unwrap(), owner).unwrap_err();
        assert!(matches!(err, Error::NotCancellable { .. }));
        // No double release
        assert_eq!(available(&service, event), 10);
    }

    #[test]
    fn test_cancel_lead_time_boundary() {
        // Event starts 7 days after the clock; move to the boundary
        let (mut service, clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let r = book(&mut service, event, 1, 2);
        let owner = Actor::customer(UserId::new(1));

        clock.advance(Duration::days(6));
        let err = service.cancel(r.id().unwrap(), owner).unwrap_err();
        assert!(matches!(err, Error::NotCancellable { .. }));
        assert_eq!(available(&service, event), 8);

        clock.advance(Duration::seconds(-1));
        service.cancel(r.id().unwrap(), owner).unwrap();
        assert_eq!(available(&service, event), 10);
    }

    #[test]
    fn test_completed_reservation_not_cancellable() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let r = book(&mut service, event, 1, 2);
        service
            .set_status(
                r.id().unwrap(),
                ReservationStatus::Completed,
                Actor::admin(UserId::new(99)),
            )
            .unwrap();

        let err = service
            .cancel(r.id().unwrap(), Actor::customer(UserId::new(1)))
            .unwrap_err();
        assert!(matches!(err, Error::NotCancellable { .. }));
    }

    #[test]
    fn test_rebook_after_cancel() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let r = book(&mut service, event, 1, 2);
        service
            .cancel(r.id().unwrap(), Actor::customer(UserId::new(1)))
            .unwrap();

        let again = book(&mut service, event, 1, 3);
        assert_ne!(again.id(), r.id());
        assert_eq!(available(&service, event), 7);
    }
}
