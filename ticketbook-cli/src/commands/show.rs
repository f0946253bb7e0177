//! Show command implementation.

use crate::error::CliError;
use crate::utils::{
    format_timestamp, open_service, write_json, ActorArgs, GlobalOptions, OutputFormat,
    ReservationRef,
};
use clap::Args;

/// Show one reservation.
#[derive(Args)]
pub struct ShowCommand {
    /// Reservation id or code
    pub reservation: ReservationRef,

    /// Output format
    #[arg(long, value_enum, default_value = "table", ignore_case = true)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub actor: ActorArgs,
}

impl ShowCommand {
    /// Execute the show command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let service = open_service(global)?;
        let r = self.reservation.fetch(&service, self.actor.actor())?;

        if self.format == OutputFormat::Json {
            return write_json(&r);
        }

        println!("code:\t{}", r.code());
        if let Some(id) = r.id() {
            println!("id:\t{id}");
        }
        println!("event:\t{}", r.event_id());
        println!("user:\t{}", r.user_id());
        println!("tickets:\t{}", r.ticket_count());
        println!("amount:\t{}", r.total_amount());
        println!("status:\t{}", r.status());
        if let Some(requests) = r.special_requests() {
            println!("requests:\t{requests}");
        }
        println!("created:\t{}", format_timestamp(r.created_at()));
        println!("updated:\t{}", format_timestamp(r.updated_at()));
        Ok(())
    }
}
