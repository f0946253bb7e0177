//! Main entry point for the ticketbook CLI.
//!
//! This is the command-line interface for the ticketbook reservation core.
//! It provides commands for managing events and reservations:
//! - `event`: Create and administer events
//! - `reserve`: Book tickets for an event
//! - `cancel`: Cancel a reservation
//! - `set-status`: Administrative status override
//! - `list` / `show`: Inspect reservations
//! - `audit`: Check capacity conservation

mod cli;
mod commands;
mod error;
mod utils;

use clap::Parser;
use cli::Cli;
use utils::GlobalOptions;

fn main() {
    let cli = Cli::parse();

    let _logger = ticketbook::init_logger(cli.verbose, cli.quiet);

    let global = GlobalOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        data_dir: cli.data_dir,
        busy_timeout: cli.busy_timeout,
        disable_autoinit: cli.disable_autoinit,
    };

    let result = match cli.command {
        cli::Command::Init(cmd) => cmd.execute(&global),
        cli::Command::Event(cmd) => cmd.execute(&global),
        cli::Command::Reserve(cmd) => cmd.execute(&global),
        cli::Command::Cancel(cmd) => cmd.execute(&global),
        cli::Command::SetStatus(cmd) => cmd.execute(&global),
        cli::Command::Show(cmd) => cmd.execute(&global),
        cli::Command::List(cmd) => cmd.execute(&global),
        cli::Command::Audit(cmd) => cmd.execute(&global),
        cli::Command::Completions(cmd) => cmd.execute(&global),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
