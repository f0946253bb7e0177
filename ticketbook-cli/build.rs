//! Build script for ticketbook-cli.
//!
//! Generates the `ticketbook.1` man page into OUT_DIR with clap_mangen.
//! Build scripts cannot depend on the crate being built, so the command
//! outline is repeated here.

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::fs;
use std::path::PathBuf;

/// Keep in step with src/cli.rs.
fn build_cli() -> Command {
    Command::new("ticketbook")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage event capacity and ticket reservations")
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .help("Suppress non-essential output")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Override the data directory location")
                .value_name("PATH")
                .global(true)
                .env("TICKETBOOK_DATA_DIR"),
        )
        .arg(
            Arg::new("busy-timeout")
                .long("busy-timeout")
                .help("Override the default busy timeout (in seconds)")
                .value_name("SECONDS")
                .global(true)
                .env("TICKETBOOK_BUSY_TIMEOUT"),
        )
        .arg(
            Arg::new("disable-autoinit")
                .long("disable-autoinit")
                .help("Disable automatic database initialization")
                .global(true)
                .action(ArgAction::SetTrue)
                .env("TICKETBOOK_DISABLE_AUTOINIT"),
        )
        .subcommands(vec![
            Command::new("init").about("Initialize the data directory and database"),
            Command::new("event")
                .about("Manage events")
                .long_about("Create, show, edit and list events, and change an event's status"),
            Command::new("reserve")
                .about("Reserve tickets for an event")
                .long_about("Book tickets and print the reservation code"),
            Command::new("cancel")
                .about("Cancel a reservation")
                .long_about("Cancel a confirmed reservation and return its tickets"),
            Command::new("set-status")
                .about("Change a reservation's status (administrators)"),
            Command::new("show").about("Show one reservation by id or code"),
            Command::new("list").about("List reservations"),
            Command::new("audit")
                .about("Check an event's capacity against its reservations"),
            Command::new("completions").about("Generate shell completion scripts"),
        ])
}

fn main() -> std::io::Result<()> {
    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR is not set")
    })?);
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir)?;

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    fs::write(man_dir.join("ticketbook.1"), buffer)?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=src/commands/");
    Ok(())
}
