//! Reserve command implementation.
//!
//! This module implements the `reserve` command, which books tickets for an
//! event and prints the reservation code on stdout.

use crate::error::CliError;
use crate::utils::{open_service, ActorArgs, GlobalOptions};
use clap::Args;
use ticketbook::{CreateRequest, EventId, UserId};

/// Reserve tickets for an event.
#[derive(Args)]
pub struct ReserveCommand {
    /// Event id
    #[arg(long, value_name = "EVENT_ID")]
    pub event: i64,

    /// Number of tickets
    #[arg(long, short = 'n', value_name = "N", default_value_t = 1)]
    pub quantity: u32,

    /// Free-text requests stored with the reservation
    #[arg(long, value_name = "TEXT")]
    pub special_requests: Option<String>,

    /// Book for this user and hold the reservation as pending (administrators)
    #[arg(long, value_name = "USER_ID")]
    pub hold_for: Option<i64>,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl ReserveCommand {
    /// Execute the reserve command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let mut service = open_service(global)?;

        let actor = self.actor.actor();
        let user = self.hold_for.map_or(actor.user, UserId::new);
        let request = CreateRequest::new(EventId::new(self.event), user, self.quantity)
            .with_special_requests(self.special_requests);
        let reservation = if self.hold_for.is_some() {
            service.create_pending(&request, actor)?
        } else {
            service.create(&request)?
        };

        println!("{}", reservation.code());
        if global.verbose {
            eprintln!(
                "Reserved {} ticket(s) for event {}, total {} ({})",
                reservation.ticket_count(),
                reservation.event_id(),
                reservation.total_amount(),
                reservation.status()
            );
        }
        Ok(())
    }
}
