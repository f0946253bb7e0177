//! Database connection management.
//!
//! This module provides the main database connection type with proper
//! initialization and PRAGMA settings for concurrent `SQLite` access.

use rusqlite::{Connection, OpenFlags};

use crate::error::{Error, Result};

use super::config::DatabaseConfig;

/// A database connection wrapper with configuration.
///
/// One `Database` is one `SQLite` connection and is not shared between
/// threads; use [`Database::reconnect`] to get another connection to the
/// same file.
///
/// # Examples
///
/// ```no_run
/// use ticketbook::database::{Database, DatabaseConfig};
///
/// let config = DatabaseConfig::new("/tmp/ticketbook.db");
/// let db = Database::open(config).unwrap();
/// ```
#[derive(Debug)]
pub struct Database {
    pub(super) conn: Connection,
    config: DatabaseConfig,
}

impl Database {
    /// Opens a database connection with the given configuration.
    ///
    /// This function will:
    /// - Create the parent directory if `auto_create` is enabled
    /// - Open the database with appropriate flags
    /// - Set WAL mode for concurrent access
    /// - Configure busy timeout
    /// - Initialize or verify the database schema
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The database file does not exist and `auto_create` is disabled
    /// - The database file cannot be opened
    /// - The parent directory cannot be created
    /// - PRAGMA settings cannot be applied
    /// - Schema initialization or verification fails
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        if !config.path.exists() {
            if !config.auto_create {
                return Err(Error::DataDirectoryNotFound {
                    path: config.path.clone(),
                });
            }
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let flags = if config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else if config.auto_create {
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };

        let conn = Connection::open_with_flags(&config.path, flags)?;

        // busy_timeout first so the remaining setup waits on a locked file
        conn.busy_timeout(config.busy_timeout)?;
        if !config.read_only {
            // PRAGMA journal_mode returns a row
            let _: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON")?;

        if config.read_only {
            let version = super::migrations::get_schema_version(&conn)?;
            if version != super::schema::CURRENT_SCHEMA_VERSION {
                return Err(Error::UnsupportedSchemaVersion {
                    expected: super::schema::CURRENT_SCHEMA_VERSION,
                    found: version,
                });
            }
        } else {
            super::migrations::check_schema_compatibility(&conn)?;
        }

        log::debug!("opened database at {}", config.path.display());
        Ok(Self { conn, config })
    }

    /// Opens a fresh connection to the same database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn reconnect(&self) -> Result<Self> {
        Self::open(self.config.clone())
    }

    /// Returns the configuration this connection was opened with.
    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns a reference to the underlying `SQLite` connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns a mutable reference to the underlying `SQLite` connection.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
