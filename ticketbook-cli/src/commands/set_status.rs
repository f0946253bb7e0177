//! Set-status command implementation.
//!
//! Administrative override of a reservation's status. Capacity follows the
//! change: leaving a held status releases tickets and reinstating a
//! cancelled reservation takes them back.

use crate::error::CliError;
use crate::utils::{open_service, ActorArgs, GlobalOptions, ReservationRef};
use clap::Args;
use ticketbook::ReservationStatus;

/// Change a reservation's status.
#[derive(Args)]
pub struct SetStatusCommand {
    /// Reservation id or code
    pub reservation: ReservationRef,

    /// New status (pending, confirmed, cancelled, completed)
    pub status: ReservationStatus,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl SetStatusCommand {
    /// Execute the set-status command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut service = open_service(global)?;
        let actor = self.actor.actor();

        let id = self.reservation.resolve(&service, actor)?;
        let updated = service.set_status(id, self.status, actor)?;

        if !global.quiet {
            eprintln!("Reservation {} is now {}", updated.code(), updated.status());
        }
        Ok(())
    }
}
