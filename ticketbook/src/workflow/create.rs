//! Reservation creation.

use rusqlite::Connection;

use crate::database::Database;
use crate::error::{Error, Result};
use crate::event::EventId;
use crate::guard;
use crate::reservation::{Actor, Reservation, ReservationStatus, UserId};

use super::query::require_admin;
use super::{ReservationService, UnitContext};

/// Codes tried per attempt before the attempt counts as a conflict.
const CODES_PER_ATTEMPT: usize = 2;

/// Parameters of a reservation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    /// The event to book.
    pub event: EventId,
    /// The user the tickets are for.
    pub user: UserId,
    /// Number of tickets.
    pub quantity: u32,
    /// Free-text requests stored with the reservation.
    pub special_requests: Option<String>,
}

impl CreateRequest {
    /// Creates a request without special requests.
    #[must_use]
    pub const fn new(event: EventId, user: UserId, quantity: u32) -> Self {
        Self {
            event,
            user,
            quantity,
            special_requests: None,
        }
    }

    /// Sets the special requests.
    #[must_use]
    pub fn with_special_requests(mut self, requests: Option<String>) -> Self {
        self.special_requests = requests;
        self
    }
}

impl ReservationService {
    /// Books `quantity` tickets of an event for a user.
    ///
    /// The checks run in this order; the first failure is returned and
    /// nothing is written:
    ///
    /// 1. the event exists ([`Error::NotFound`])
    /// 2. it is active, not sold out and not started ([`Error::EventNotBookable`])
    /// 3. the user has no active reservation for it ([`Error::DuplicateReservation`])
    /// 4. enough tickets remain ([`Error::InsufficientCapacity`])
    ///
    /// On success the capacity is decremented and a `confirmed` reservation
    /// is stored, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns the rejections above, [`Error::Validation`] for a zero
    /// quantity or one above the policy's cap, or
    /// [`Error::TransientConflict`] once every attempt has been used.
    pub fn create(&mut self, request: &CreateRequest) -> Result<Reservation> {
        self.validate_quantity(request.quantity)?;

        let reservation = self.run_locked(request.event, |tx, ctx| {
            create_in(tx, ctx, request, ReservationStatus::Confirmed)
        })?;
        log::info!(
            "reservation {} for user {} on event {}: {} ticket(s), {}",
            reservation.code(),
            request.user,
            request.event,
            request.quantity,
            reservation.total_amount()
        );
        Ok(reservation)
    }

    /// Books tickets on a user's behalf and holds them as `pending` until an
    /// administrator confirms or cancels the reservation.
    ///
    /// Runs the same checks as [`create`](Self::create) and takes capacity
    /// the same way: a pending reservation holds its tickets. Confirming it
    /// later leaves capacity alone; cancelling it returns the tickets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] unless `actor` is an administrator,
    /// then any error [`create`](Self::create) returns.
    pub fn create_pending(&mut self, request: &CreateRequest, actor: Actor) -> Result<Reservation> {
        require_admin(actor, "hold reservations for review")?;
        self.validate_quantity(request.quantity)?;

        let reservation = self.run_locked(request.event, |tx, ctx| {
            create_in(tx, ctx, request, ReservationStatus::Pending)
        })?;
        log::info!(
            "reservation {} for user {} on event {} held for review by user {}: {} ticket(s)",
            reservation.code(),
            request.user,
            request.event,
            actor.user,
            request.quantity
        );
        Ok(reservation)
    }

    fn validate_quantity(&self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::Validation {
                field: "quantity".into(),
                message: "at least one ticket is required".into(),
            });
        }
        if let Some(max) = self.policy.max_tickets_per_reservation {
            if quantity > max {
                return Err(Error::Validation {
                    field: "quantity".into(),
                    message: format!("at most {max} ticket(s) per reservation"),
                });
            }
        }
        Ok(())
    }
}

fn create_in(
    conn: &Connection,
    ctx: &UnitContext<'_>,
    request: &CreateRequest,
    status: ReservationStatus,
) -> Result<Reservation> {
    let CreateRequest {
        event: event_id,
        user,
        quantity,
        ..
    } = *request;

    let event = Database::get_event(conn, event_id)?.ok_or_else(|| Error::event_not_found(event_id))?;
    event
        .check_bookable(ctx.now)
        .map_err(|reason| Error::EventNotBookable {
            event: event_id,
            reason,
        })?;
    guard::ensure_no_active_reservation(conn, user, event_id)?;

    let total = event
        .price()
        .checked_mul(quantity)
        .ok_or_else(|| Error::Validation {
            field: "quantity".into(),
            message: format!("total for {quantity} ticket(s) at {} overflows", event.price()),
        })?;

    ctx.ledger(conn).reserve(event_id, quantity, ctx.now)?;

    for _ in 0..CODES_PER_ATTEMPT {
        let reservation = Reservation::builder(event_id, user, quantity, ctx.codes.generate())
            .total_amount(total)
            .status(status)
            .special_requests(request.special_requests.clone())
            .created_at(ctx.now)
            .build()?;

        match Database::insert_reservation(conn, &reservation) {
            Err(Error::CodeCollision { code }) => {
                log::warn!("reservation code {code} collided, regenerating");
            }
            other => return other,
        }
    }

    Err(Error::TransientConflict {
        event: event_id,
        attempts: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ScriptedCodeGenerator;
    use crate::config::ReservationPolicy;
    use crate::database::test_util::{insert_test_event, test_now};
    use crate::error::NotBookableReason;
    use crate::event::{EventInventory, EventStatus};
    use crate::money::Money;
    use crate::reservation::ReservationCode;
    use crate::workflow::test_util::test_service;
    use chrono::Duration;
    use std::sync::Arc;

    fn available(service: &ReservationService, event: EventId) -> u32 {
        Database::get_event(service.database().connection(), event)
            .unwrap()
            .unwrap()
            .available_capacity()
    }

    fn code(s: &str) -> ReservationCode {
        ReservationCode::new(s).unwrap()
    }

    #[test]
    fn test_create_confirms_and_decrements() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);

        let r = service
            .create(&CreateRequest::new(event, UserId::new(1), 2))
            .unwrap();

        assert!(r.id().is_some());
        assert_eq!(r.status(), ReservationStatus::Confirmed);
        assert_eq!(r.ticket_count(), 2);
        assert_eq!(r.total_amount(), Money::from_cents(5000).unwrap());
        assert_eq!(r.created_at(), test_now());
        assert_eq!(r.code().as_str(), "RES-000001");
        assert_eq!(available(&service, event), 8);
    }

    #[test]
    fn test_create_pending_holds_capacity() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let request = CreateRequest::new(event, UserId::new(1), 3);

        let err = service
            .create_pending(&request, Actor::customer(UserId::new(1)))
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized { .. }));
        assert_eq!(available(&service, event), 10);

        let r = service
            .create_pending(&request, Actor::admin(UserId::new(99)))
            .unwrap();
        assert_eq!(r.status(), ReservationStatus::Pending);
        assert_eq!(r.user_id(), UserId::new(1));
        assert_eq!(available(&service, event), 7);

        // A held reservation blocks a second booking for the same user
        let err = service.create(&request).unwrap_err();
        assert!(matches!(err, Error::DuplicateReservation { .. }));
    }

    #[test]
    fn test_create_pending_runs_booking_checks() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 2);
        let admin = Actor::admin(UserId::new(99));

        let err = service
            .create_pending(&CreateRequest::new(event, UserId::new(1), 3), admin)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientCapacity { .. }));

        let err = service
            .create_pending(&CreateRequest::new(event, UserId::new(1), 0), admin)
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(available(&service, event), 2);
    }

    #[test]
    fn test_special_requests_stored() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);

        let r = service
            .create(
                &CreateRequest::new(event, UserId::new(1), 1)
                    .with_special_requests(Some("wheelchair access".into())),
            )
            .unwrap();
        let stored = Database::get_reservation(service.database().connection(), r.id().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(stored.special_requests(), Some("wheelchair access"));
    }

    #[test]
    fn test_unknown_event() {
        let (mut service, _clock) = test_service();
        let err = service
            .create(&CreateRequest::new(EventId::new(404), UserId::new(1), 1))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_not_bookable_events() {
        let (mut service, clock) = test_service();
        let event = insert_test_event(service.database(), 10);

        Database::update_event_status(service.database().connection(), event, EventStatus::Postponed)
            .unwrap();
        let err = service
            .create(&CreateRequest::new(event, UserId::new(1), 1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::EventNotBookable {
                reason: NotBookableReason::NotActive(EventStatus::Postponed),
                ..
            }
        ));

        Database::update_event_status(service.database().connection(), event, EventStatus::Active)
            .unwrap();
        clock.advance(Duration::days(8));
        let err = service
            .create(&CreateRequest::new(event, UserId::new(1), 1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::EventNotBookable {
                reason: NotBookableReason::AlreadyStarted,
                ..
            }
        ));
        assert_eq!(available(&service, event), 10);
    }

    #[test]
    fn test_sold_out_is_not_bookable() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 2);
        service
            .create(&CreateRequest::new(event, UserId::new(1), 2))
            .unwrap();

        let err = service
            .create(&CreateRequest::new(event, UserId::new(2), 1))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::EventNotBookable {
                reason: NotBookableReason::SoldOut,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_checked_before_capacity() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 3);
        service
            .create(&CreateRequest::new(event, UserId::new(1), 1))
            .unwrap();

        // Would also exceed capacity, but the duplicate is reported first
        let err = service
            .create(&CreateRequest::new(event, UserId::new(1), 5))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateReservation { .. }));
        assert_eq!(available(&service, event), 2);
    }

    #[test]
    fn test_insufficient_capacity_changes_nothing() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        service
            .create(&CreateRequest::new(event, UserId::new(1), 7))
            .unwrap();

        let err = service
            .create(&CreateRequest::new(event, UserId::new(2), 7))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientCapacity {
                requested: 7,
                available: 3,
                ..
            }
        ));
        assert_eq!(available(&service, event), 3);
        assert_eq!(
            Database::list_reservations_for_event(service.database().connection(), event)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_quantity_validation() {
        let (mut service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let err = service
            .create(&CreateRequest::new(event, UserId::new(1), 0))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let policy = ReservationPolicy {
            max_tickets_per_reservation: Some(4),
            ..ReservationPolicy::default()
        };
        let mut capped = ReservationService::new(service.database().reconnect().unwrap(), policy)
            .unwrap()
            .with_clock(Arc::new(crate::clock::FixedClock::new(service.now())));
        let err = capped
            .create(&CreateRequest::new(event, UserId::new(1), 5))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        capped
            .create(&CreateRequest::new(event, UserId::new(1), 4))
            .unwrap();
    }

    #[test]
    fn test_price_overflow_rejected() {
        let (mut service, _clock) = test_service();
        let huge = EventInventory::builder("Pricey", test_now() + Duration::days(3), 10)
            .price(Money::from_cents(i64::MAX / 2).unwrap())
            .build()
            .unwrap();
        let event = Database::insert_event(service.database().connection(), &huge, test_now())
            .unwrap()
            .id()
            .unwrap();

        let err = service
            .create(&CreateRequest::new(event, UserId::new(1), 3))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(available(&service, event), 10);
    }

    #[test]
    fn test_code_collision_regenerates_once() {
        let (service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let codes = ScriptedCodeGenerator::new([code("RES-SAME"), code("RES-SAME"), code("RES-NEXT")]);
        let mut service = service.with_code_generator(Arc::new(codes));

        let first = service
            .create(&CreateRequest::new(event, UserId::new(1), 1))
            .unwrap();
        assert_eq!(first.code().as_str(), "RES-SAME");

        let second = service
            .create(&CreateRequest::new(event, UserId::new(2), 1))
            .unwrap();
        assert_eq!(second.code().as_str(), "RES-NEXT");
        assert_eq!(available(&service, event), 8);
    }

    #[test]
    fn test_repeated_collisions_surface_as_transient_conflict() {
        let (service, _clock) = test_service();
        let event = insert_test_event(service.database(), 10);
        let taken = code("RES-TAKEN");
        let codes = ScriptedCodeGenerator::new(std::iter::repeat(taken).take(7));
        let mut service = service.with_code_generator(Arc::new(codes));

        service
            .create(&CreateRequest::new(event, UserId::new(1), 1))
            .unwrap();
        let err = service
            .create(&CreateRequest::new(event, UserId::new(2), 2))
            .unwrap_err();
        assert!(matches!(err, Error::TransientConflict { .. }));
        assert!(!matches!(err, Error::CodeCollision { .. }));
        assert_eq!(available(&service, event), 9);
    }
}
