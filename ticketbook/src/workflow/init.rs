//! Data directory setup.
//!
//! [`init_database`] lays out a data directory for the reservation store:
//! the `SQLite` file at the current schema version and, on request, a
//! `config.yaml` seeded with the resolved reservation defaults. An existing
//! store is only replaced with `overwrite`, and the report tells how many
//! events went with it.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};

use crate::config::loader::USER_CONFIG_FILE;
use crate::config::schema::DEFAULT_LOCK_WAIT_SECONDS;
use crate::config::ReservationPolicy;
use crate::database::{get_schema_version, DATABASE_FILE_NAME};
use crate::error::{Error, Result};
use crate::{Database, DatabaseConfig};

/// What to set up.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Data directory holding the store.
    pub data_dir: PathBuf,
    /// Replace a store that already exists, discarding its events.
    pub overwrite: bool,
    /// Seed `config.yaml` with the default reservation settings.
    pub create_config: bool,
}

impl InitOptions {
    /// Options for `data_dir` with no overwrite and no config file.
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            overwrite: false,
            create_config: false,
        }
    }

    /// Sets whether an existing store is replaced.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets whether `config.yaml` is seeded.
    #[must_use]
    pub fn with_create_config(mut self, create_config: bool) -> Self {
        self.create_config = create_config;
        self
    }
}

/// Store found in the data directory before initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingStore {
    /// Schema version recorded in the file, 0 when it has none.
    pub schema_version: u32,
    /// Events the store holds.
    pub events: usize,
    /// Reservations that still hold tickets.
    pub active_reservations: usize,
}

/// What happened to `config.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOutcome {
    /// No config file was requested.
    NotRequested,
    /// A new config file was written.
    Written,
    /// A file was already there and was left untouched.
    KeptExisting,
}

/// Outcome of [`init_database`].
#[derive(Debug)]
pub struct InitResult {
    /// Data directory that was set up.
    pub data_dir: PathBuf,
    /// Whether the data directory had to be created.
    pub data_dir_created: bool,
    /// The store that was discarded, when `overwrite` replaced one.
    pub replaced: Option<ExistingStore>,
    /// Schema version of the new store.
    pub schema_version: u32,
    /// Events in the store after setup.
    pub event_count: usize,
    /// What happened to `config.yaml`.
    pub config: ConfigOutcome,
}

/// Sets up the data directory and an empty reservation store.
///
/// # Errors
///
/// Returns [`Error::Validation`] on field `database` when a store already
/// exists and `overwrite` is not set; the message names how many events it
/// holds. Filesystem and `SQLite` failures propagate.
///
/// # Examples
///
/// ```no_run
/// use ticketbook::workflow::{init_database, InitOptions};
/// use std::path::PathBuf;
///
/// let options = InitOptions::new(PathBuf::from("/tmp/ticketbook-test"))
///     .with_create_config(true);
///
/// let result = init_database(&options).unwrap();
/// println!("schema v{}", result.schema_version);
/// ```
pub fn init_database(options: &InitOptions) -> Result<InitResult> {
    let data_dir_created = !options.data_dir.exists();
    if data_dir_created {
        fs::create_dir_all(&options.data_dir)?;
    }

    let db_path = options.data_dir.join(DATABASE_FILE_NAME);
    let replaced = match inspect_store(&db_path)? {
        Some(existing) if !options.overwrite => {
            return Err(Error::Validation {
                field: "database".into(),
                message: format!(
                    "{} already holds {} event(s) and {} active reservation(s). \
                     Use --overwrite to replace it.",
                    db_path.display(),
                    existing.events,
                    existing.active_reservations
                ),
            });
        }
        Some(existing) => {
            fs::remove_file(&db_path)?;
            log::warn!(
                "discarding store at {} with {} event(s)",
                db_path.display(),
                existing.events
            );
            Some(existing)
        }
        None => None,
    };

    let db = Database::open(DatabaseConfig::new(&db_path))?;
    let schema_version = get_schema_version(db.connection())?;
    let event_count = Database::list_events(db.connection())?.len();
    log::info!(
        "initialized store at {} (schema v{schema_version})",
        db_path.display()
    );

    let config = if options.create_config {
        seed_config(&options.data_dir.join(USER_CONFIG_FILE))?
    } else {
        ConfigOutcome::NotRequested
    };

    Ok(InitResult {
        data_dir: options.data_dir.clone(),
        data_dir_created,
        replaced,
        schema_version,
        event_count,
        config,
    })
}

/// Reads what a store file holds without running migrations on it, so an
/// incompatible file can still be reported and replaced.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read as `SQLite`.
pub fn inspect_store(db_path: &Path) -> Result<Option<ExistingStore>> {
    if !db_path.exists() {
        return Ok(None);
    }
    let conn = Connection::open(db_path)?;
    let schema_version = get_schema_version(&conn)?;
    Ok(Some(ExistingStore {
        schema_version,
        events: count_rows(&conn, "SELECT COUNT(*) FROM events")?,
        active_reservations: count_rows(
            &conn,
            "SELECT COUNT(*) FROM reservations WHERE status <> 'cancelled'",
        )?,
    }))
}

// Missing tables count as empty.
fn count_rows(conn: &Connection, sql: &str) -> Result<usize> {
    let Ok(mut stmt) = conn.prepare(sql) else {
        return Ok(0);
    };
    let count: Option<i64> = stmt.query_row([], |row| row.get(0)).optional()?;
    Ok(count.map_or(0, |n| usize::try_from(n).unwrap_or(0)))
}

fn seed_config(path: &Path) -> Result<ConfigOutcome> {
    if path.exists() {
        return Ok(ConfigOutcome::KeptExisting);
    }
    fs::write(path, config_template(&ReservationPolicy::default()))?;
    Ok(ConfigOutcome::Written)
}

/// Renders a commented `config.yaml` listing `policy`'s values. Every line
/// is a comment, so the file loads as an empty config until edited.
#[must_use]
pub fn config_template(policy: &ReservationPolicy) -> String {
    let max_tickets = policy
        .max_tickets_per_reservation
        .map_or_else(|| "~".to_string(), |n| n.to_string());
    format!(
        "# ticketbook configuration\n\
         \n\
         # reservations:\n\
         #   cancellation_lead_hours: {lead}\n\
         #   max_conflict_retries: {retries}\n\
         #   code_prefix: {prefix}\n\
         #   max_tickets_per_reservation: {max_tickets}\n\
         \n\
         # Seconds to wait for another process's write lock\n\
         # maximum_lock_wait_seconds: {DEFAULT_LOCK_WAIT_SECONDS}\n",
        lead = policy.cancellation_lead_hours,
        retries = policy.max_conflict_retries,
        prefix = policy.code_prefix,
    )
}
