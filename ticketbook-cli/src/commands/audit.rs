//! Audit command implementation.
//!
//! Compares an event's stored available capacity with the tickets held by
//! its reservations. Exits with status 1 when they disagree.

use crate::error::CliError;
use crate::utils::{open_service, write_json, GlobalOptions, OutputFormat};
use clap::Args;
use serde::Serialize;
use ticketbook::EventId;

/// Check an event's capacity against its reservations.
#[derive(Args)]
pub struct AuditCommand {
    /// Event id
    pub event: i64,

    /// Output format
    #[arg(long, value_enum, default_value = "table", ignore_case = true)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct AuditReport {
    event: i64,
    total: u32,
    available: u32,
    held: u64,
    consistent: bool,
}

impl AuditCommand {
    /// Execute the audit command.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        let service = open_service(global)?;
        let audit = service.audit(EventId::new(self.event))?;
        let report = AuditReport {
            event: self.event,
            total: audit.total,
            available: audit.available,
            held: audit.held,
            consistent: audit.is_consistent(),
        };

        match self.format {
            OutputFormat::Json => write_json(&report)?,
            OutputFormat::Table => {
                println!("event:\t{}", report.event);
                println!("total:\t{}", report.total);
                println!("available:\t{}", report.available);
                println!("held:\t{}", report.held);
            }
        }

        if report.consistent {
            Ok(())
        } else {
            Err(CliError::SemanticFailure(format!(
                "event {}: {} available + {} held != {} total",
                report.event, report.available, report.held, report.total
            )))
        }
    }
}
