//! Cancel command implementation.

use crate::error::CliError;
use crate::utils::{open_service, ActorArgs, GlobalOptions, ReservationRef};
use clap::Args;

/// Cancel a reservation and return its tickets.
#[derive(Args)]
pub struct CancelCommand {
    /// Reservation id or code
    pub reservation: ReservationRef,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl CancelCommand {
    /// Execute the cancel command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut service = open_service(global)?;
        let actor = self.actor.actor();

        let id = self.reservation.resolve(&service, actor)?;
        let cancelled = service.cancel(id, actor)?;

        if !global.quiet {
            eprintln!(
                "Cancelled {}, {} ticket(s) released",
                cancelled.code(),
                cancelled.ticket_count()
            );
        }
        Ok(())
    }
}
