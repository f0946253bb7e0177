//! CLI structure and command definitions.
//!
//! This module defines the main CLI structure using clap's derive macros,
//! including global options and subcommands.

use crate::commands::{
    AuditCommand, CancelCommand, CompletionsCommand, EventCommand, InitCommand, ListCommand,
    ReserveCommand, SetStatusCommand, ShowCommand,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line tool for event ticket reservations.
#[derive(Parser)]
#[command(name = "ticketbook")]
#[command(version, about = "Manage event capacity and ticket reservations", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Override the data directory location
    #[arg(long, value_name = "PATH", global = true, env = "TICKETBOOK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Override the default busy timeout (in seconds)
    #[arg(long, value_name = "SECONDS", global = true, env = "TICKETBOOK_BUSY_TIMEOUT")]
    pub busy_timeout: Option<u32>,

    /// Disable automatic database initialization
    #[arg(long, global = true, env = "TICKETBOOK_DISABLE_AUTOINIT")]
    pub disable_autoinit: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize the data directory and database
    Init(InitCommand),

    /// Manage events
    #[command(subcommand)]
    Event(EventCommand),

    /// Reserve tickets for an event
    Reserve(ReserveCommand),

    /// Cancel a reservation
    Cancel(CancelCommand),

    /// Change a reservation's status (administrators)
    SetStatus(SetStatusCommand),

    /// Show one reservation
    Show(ShowCommand),

    /// List reservations
    List(ListCommand),

    /// Check an event's capacity against its reservations
    Audit(AuditCommand),

    /// Generate shell completion scripts
    Completions(CompletionsCommand),
}
