//! Lookups, event administration and capacity audits.

use crate::database::{CapacityAudit, Database};
use crate::error::{Error, Result};
use crate::event::{EventId, EventInventory, EventStatus, EventUpdate};
use crate::reservation::{Actor, Reservation, ReservationCode, ReservationId, UserId};

use super::ReservationService;

pub(super) fn require_admin(actor: Actor, action: &str) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Unauthorized {
            user: actor.user,
            action: action.to_string(),
        })
    }
}

impl ReservationService {
    /// Fetches a reservation visible to `actor`.
    ///
    /// Reservations owned by someone else are reported as missing to
    /// non-administrators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_reservation(&self, id: ReservationId, actor: Actor) -> Result<Reservation> {
        Database::get_reservation(self.db.connection(), id)?
            .filter(|r| actor.may_act_for(r.user_id()))
            .ok_or_else(|| Error::reservation_not_found(id))
    }

    /// Fetches a reservation by its code, with the same visibility rule as
    /// [`get_reservation`](Self::get_reservation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn find_by_code(&self, code: &ReservationCode, actor: Actor) -> Result<Reservation> {
        Database::get_reservation_by_code(self.db.connection(), code)?
            .filter(|r| actor.may_act_for(r.user_id()))
            .ok_or_else(|| Error::reservation_not_found(code))
    }

    /// Lists a user's reservations, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if `actor` is another customer.
    pub fn list_for_user(&self, user: UserId, actor: Actor) -> Result<Vec<Reservation>> {
        if !actor.may_act_for(user) {
            return Err(Error::Unauthorized {
                user: actor.user,
                action: format!("list reservations of user {user}"),
            });
        }
        Database::list_reservations_for_user(self.db.connection(), user)
    }

    /// Lists every reservation of an event. Administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`], [`Error::NotFound`] for an unknown
    /// event, or a database error.
    pub fn list_for_event(&self, event: EventId, actor: Actor) -> Result<Vec<Reservation>> {
        require_admin(actor, "list reservations of an event")?;
        self.get_event(event)?;
        Database::list_reservations_for_event(self.db.connection(), event)
    }

    /// Lists every reservation. Administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] or a database error.
    pub fn list_all(&self, actor: Actor) -> Result<Vec<Reservation>> {
        require_admin(actor, "list all reservations")?;
        Database::list_all_reservations(self.db.connection())
    }

    /// Stores a new event. Administrators only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] or a database error.
    pub fn create_event(&mut self, event: &EventInventory, actor: Actor) -> Result<EventInventory> {
        require_admin(actor, "create events")?;
        let now = self.now();
        let busy_timeout = self.db.config().busy_timeout.as_secs();
        let tx = self.db.begin_transaction()?;
        let stored = Database::insert_event(&tx, event, now)?;
        Database::commit(tx, busy_timeout)?;
        log::info!(
            "event {} '{}' created with {} ticket(s)",
            stored.id().map_or(0, EventId::value),
            stored.title(),
            stored.total_capacity()
        );
        Ok(stored)
    }

    /// Fetches an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn get_event(&self, id: EventId) -> Result<EventInventory> {
        Database::get_event(self.db.connection(), id)?.ok_or_else(|| Error::event_not_found(id))
    }

    /// Changes an event's status. Administrators only.
    ///
    /// Existing reservations are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`], [`Error::NotFound`] or
    /// [`Error::TransientConflict`].
    pub fn set_event_status(
        &mut self,
        id: EventId,
        status: EventStatus,
        actor: Actor,
    ) -> Result<EventInventory> {
        require_admin(actor, "change event status")?;
        let updated = self.run_locked(id, |tx, _| {
            if !Database::update_event_status(tx, id, status)? {
                return Err(Error::event_not_found(id));
            }
            Database::get_event(tx, id)?.ok_or_else(|| Error::event_not_found(id))
        })?;
        log::info!("event {id} set to {status} by admin {}", actor.user);
        Ok(updated)
    }

    /// Edits an event's title, venue, start time or price. Administrators
    /// only.
    ///
    /// Capacity and status are unchanged. Moving `starts_at` shifts both
    /// bookability and the cancellation window of existing reservations. A
    /// new price applies to later reservations; stored totals stay as they
    /// were charged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`], [`Error::Validation`] for an empty
    /// update or invalid field, [`Error::NotFound`] or
    /// [`Error::TransientConflict`].
    pub fn update_event(
        &mut self,
        id: EventId,
        update: &EventUpdate,
        actor: Actor,
    ) -> Result<EventInventory> {
        require_admin(actor, "edit events")?;
        if update.is_empty() {
            return Err(Error::Validation {
                field: "update".into(),
                message: "no event field to change".into(),
            });
        }

        let updated = self.run_locked(id, |tx, _| {
            let current = Database::get_event(tx, id)?.ok_or_else(|| Error::event_not_found(id))?;
            let next = current.with_update(update)?;
            if !Database::update_event_details(tx, &next)? {
                return Err(Error::TransientConflict {
                    event: id,
                    attempts: 1,
                });
            }
            Database::get_event(tx, id)?.ok_or_else(|| Error::event_not_found(id))
        })?;
        log::info!(
            "event {id} edited by admin {}: '{}' at {}, {}",
            actor.user,
            updated.title(),
            updated.starts_at(),
            updated.price()
        );
        Ok(updated)
    }

    /// Lists every event ordered by start time.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn list_events(&self) -> Result<Vec<EventInventory>> {
        Database::list_events(self.db.connection())
    }

    /// Lists events that can be booked right now.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub fn list_bookable_events(&self) -> Result<Vec<EventInventory>> {
        Database::list_bookable_events(self.db.connection(), self.now())
    }

    /// Compares an event's stored capacity against its reservations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] or a database error.
    pub fn audit(&self, event: EventId) -> Result<CapacityAudit> {
        self.get_event(event)?;
        Database::audit_capacity(self.db.connection(), event)
    }
}
