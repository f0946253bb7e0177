//! Database schema management and migrations.
//!
//! This module handles database schema initialization and version checking.

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::schema::{
    CREATE_ACTIVE_RESERVATION_INDEX, CREATE_EVENTS_TABLE, CREATE_EVENT_INDEX,
    CREATE_METADATA_TABLE, CREATE_RESERVATIONS_TABLE, CREATE_USER_INDEX, CURRENT_SCHEMA_VERSION,
    INSERT_SCHEMA_VERSION, SELECT_SCHEMA_VERSION,
};

/// Initializes the database schema.
///
/// This function creates all tables, indices, and metadata for a fresh
/// database. Every statement is idempotent, so two processes racing to
/// initialize the same file end up with the same schema.
///
/// # Errors
///
/// Returns an error if any SQL statement fails to execute.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use ticketbook::database::migrations::initialize_schema;
///
/// let conn = Connection::open_in_memory().unwrap();
/// initialize_schema(&conn).unwrap();
/// ```
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;
    conn.execute(CREATE_EVENTS_TABLE, [])?;
    conn.execute(CREATE_RESERVATIONS_TABLE, [])?;

    conn.execute(CREATE_ACTIVE_RESERVATION_INDEX, [])?;
    conn.execute(CREATE_EVENT_INDEX, [])?;
    conn.execute(CREATE_USER_INDEX, [])?;

    conn.execute(INSERT_SCHEMA_VERSION, [CURRENT_SCHEMA_VERSION])?;

    Ok(())
}

/// Gets the current schema version from the database.
///
/// # Errors
///
/// Returns an error if the query fails for reasons other than
/// "no rows returned" (which indicates version 0).
///
/// # Returns
///
/// - `Ok(0)` if the metadata table doesn't exist or has no version
/// - `Ok(version)` if a version is found
/// - `Err(_)` if a database error occurs
pub fn get_schema_version(conn: &Connection) -> Result<u32> {
    match conn.query_row(SELECT_SCHEMA_VERSION, [], |row| {
        let value: String = row.get(0)?;
        value
            .parse::<u32>()
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => {
            // "no such table" surfaces as a generic SQLITE_ERROR
            if let rusqlite::Error::SqliteFailure(ref sqlite_err, _) = e {
                if sqlite_err.code == rusqlite::ErrorCode::Unknown {
                    return Ok(0);
                }
            }
            Err(e.into())
        }
    }
}

/// Checks schema compatibility and initializes if needed.
///
/// A fresh database is initialized. A database written by an older or newer
/// client is rejected with [`Error::UnsupportedSchemaVersion`].
///
/// # Errors
///
/// Returns an error if:
/// - Schema version is incompatible (too old or too new)
/// - Schema initialization fails
/// - Database queries fail
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use ticketbook::database::migrations::check_schema_compatibility;
///
/// let conn = Connection::open_in_memory().unwrap();
/// check_schema_compatibility(&conn).unwrap();
/// ```
pub fn check_schema_compatibility(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version == 0 {
        initialize_schema(conn)?;
    } else if version != CURRENT_SCHEMA_VERSION {
        return Err(Error::UnsupportedSchemaVersion {
            expected: CURRENT_SCHEMA_VERSION,
            found: version,
        });
    }

    Ok(())
}
