//! List command implementation.
//!
//! Without filters, lists the acting user's own reservations.

use crate::error::CliError;
use crate::utils::{open_service, print_reservations, ActorArgs, GlobalOptions, OutputFormat};
use clap::Args;
use ticketbook::{EventId, UserId};

/// List reservations.
#[derive(Args)]
pub struct ListCommand {
    /// Output format
    #[arg(
        long,
        value_enum,
        default_value = "table",
        env = "TICKETBOOK_OUTPUT_FORMAT",
        ignore_case = true
    )]
    pub format: OutputFormat,

    /// Reservations of this user
    #[arg(long, id = "list_user", value_name = "USER_ID", conflicts_with_all = ["event", "all"])]
    pub user: Option<i64>,

    /// Reservations of this event (administrators)
    #[arg(long, value_name = "EVENT_ID", conflicts_with = "all")]
    pub event: Option<i64>,

    /// Every reservation (administrators)
    #[arg(long)]
    pub all: bool,

    /// Only reservations that hold tickets
    #[arg(long)]
    pub active: bool,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl ListCommand {
    /// Execute the list command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let service = open_service(global)?;
        let actor = self.actor.actor();

        let mut reservations = if self.all {
            service.list_all(actor)?
        } else if let Some(event) = self.event {
            service.list_for_event(EventId::new(event), actor)?
        } else {
            let user = self.user.map_or(actor.user, UserId::new);
            service.list_for_user(user, actor)?
        };

        if self.active {
            reservations.retain(|r| r.status().holds_capacity());
        }

        print_reservations(&reservations, self.format)
    }
}
