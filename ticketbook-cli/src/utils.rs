//! Utility functions for CLI operations.
//!
//! This module provides common utility functions used across CLI commands,
//! including data directory resolution, configuration loading, database and
//! service setup, and output formatting.

use crate::error::CliError;
use chrono::{DateTime, Utc};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use ticketbook::database::{self, DATABASE_FILE_NAME};
use ticketbook::{
    Actor, Config, ConfigBuilder, Database, DatabaseConfig, Reservation, ReservationCode,
    ReservationId, ReservationService, UserId,
};

/// Global CLI options shared across all commands.
#[derive(Debug, Clone)]
#[allow(dead_code)] // Fields used via pattern matching in main.rs
pub struct GlobalOptions {
    /// Enable verbose output.
    pub verbose: bool,

    /// Suppress non-essential output.
    pub quiet: bool,

    /// Override the data directory location.
    pub data_dir: Option<PathBuf>,

    /// Override the default busy timeout (in seconds).
    pub busy_timeout: Option<u32>,

    /// Disable automatic database initialization.
    pub disable_autoinit: bool,
}

/// Who is running the command.
///
/// Authentication happens elsewhere; the CLI trusts what it is told.
#[derive(Args, Debug, Clone, Copy)]
pub struct ActorArgs {
    /// Act as this user id
    #[arg(long = "as-user", value_name = "USER_ID", env = "TICKETBOOK_USER", default_value_t = 0)]
    pub user: i64,

    /// Act with administrator rights
    #[arg(long)]
    pub admin: bool,
}

impl ActorArgs {
    /// The library actor for these flags.
    pub fn actor(&self) -> Actor {
        let user = UserId::new(self.user);
        if self.admin {
            Actor::admin(user)
        } else {
            Actor::customer(user)
        }
    }
}

/// Output format for commands that print records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated table format (human-readable)
    Table,
    /// JSON format
    Json,
}

/// A reservation named on the command line, by numeric id or by code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationRef {
    /// Numeric reservation id.
    Id(ReservationId),
    /// Public reservation code.
    Code(ReservationCode),
}

impl FromStr for ReservationRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<i64>() {
            return Ok(Self::Id(ReservationId::new(id)));
        }
        ReservationCode::new(s)
            .map(Self::Code)
            .map_err(|e| e.to_string())
    }
}

impl fmt::Display for ReservationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Code(code) => write!(f, "{code}"),
        }
    }
}

impl ReservationRef {
    /// Looks the reservation up as `actor`.
    pub fn fetch(&self, service: &ReservationService, actor: Actor) -> Result<Reservation, CliError> {
        let reservation = match self {
            Self::Id(id) => service.get_reservation(*id, actor)?,
            Self::Code(code) => service.find_by_code(code, actor)?,
        };
        Ok(reservation)
    }

    /// Resolves to a numeric id, looking codes up as `actor`.
    pub fn resolve(&self, service: &ReservationService, actor: Actor) -> Result<ReservationId, CliError> {
        match self {
            Self::Id(id) => Ok(*id),
            Self::Code(_) => self
                .fetch(service, actor)?
                .id()
                .ok_or_else(|| CliError::SemanticFailure(format!("reservation {self} has no id"))),
        }
    }
}

/// Resolve the data directory: `--data-dir`, then `TICKETBOOK_DATA_DIR`,
/// then `~/.ticketbook`.
pub fn resolve_data_dir(global: &GlobalOptions) -> Result<PathBuf, CliError> {
    match &global.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => database::resolve_data_dir().map_err(|e| CliError::Config(e.to_string())),
    }
}

/// Load hierarchical configuration.
///
/// Configuration is merged from multiple sources with precedence:
/// 1. Environment variables
/// 2. `<data-dir>/config.yaml`
/// 3. Built-in defaults (lowest priority)
pub fn load_configuration(global: &GlobalOptions) -> Result<Config, CliError> {
    let data_dir = resolve_data_dir(global)?;

    ConfigBuilder::new()
        .with_data_dir(&data_dir)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))
}

/// Open database with configuration.
///
/// # Errors
///
/// Returns `NoDataDirectory` if the database doesn't exist and auto-init is disabled.
pub fn open_database(global: &GlobalOptions, config: &Config) -> Result<Database, CliError> {
    let db_path = resolve_data_dir(global)?.join(DATABASE_FILE_NAME);
    let autoinit_disabled = global.disable_autoinit || config.disable_autoinit == Some(true);

    if !db_path.exists() && autoinit_disabled {
        return Err(CliError::NoDataDirectory);
    }

    let timeout_seconds = global
        .busy_timeout
        .map_or_else(|| config.lock_wait_seconds(), u64::from);
    let db_config =
        DatabaseConfig::new(db_path).with_busy_timeout(Duration::from_secs(timeout_seconds));

    Database::open(db_config).map_err(CliError::from)
}

/// Load configuration, open the database and build a service on it.
pub fn open_service(global: &GlobalOptions) -> Result<ReservationService, CliError> {
    let config = load_configuration(global)?;
    let db = open_database(global, &config)?;
    ReservationService::new(db, config.policy()).map_err(CliError::from)
}

/// Format a timestamp for display.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Shorten a path for display.
///
/// If the path is within the home directory, show it as ~/...
/// Otherwise, show the full path.
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = home::home_dir() {
        if let Ok(relative) = path.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    path.display().to_string()
}

/// Write `value` as pretty JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value)?;
    writeln!(handle)?;
    Ok(())
}

/// Print reservations as a table or JSON.
pub fn print_reservations(reservations: &[Reservation], format: OutputFormat) -> Result<(), CliError> {
    if format == OutputFormat::Json {
        return write_json(reservations);
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "ID\tCODE\tEVENT\tUSER\tTICKETS\tAMOUNT\tSTATUS\tCREATED_AT")?;
    for r in reservations {
        writeln!(
            handle,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.id().map_or_else(|| "-".to_string(), |id| id.to_string()),
            r.code(),
            r.event_id(),
            r.user_id(),
            r.ticket_count(),
            r.total_amount(),
            r.status(),
            format_timestamp(r.created_at()),
        )?;
    }
    Ok(())
}
