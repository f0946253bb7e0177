//! Database schema definitions and SQL constants.
//!
//! This module contains all SQL table definitions, indices, and constants
//! related to the database schema for the ticketbook store.

/// Current schema version for the database.
///
/// This version is stored in the metadata table and is used to ensure
/// compatibility between the database and the application.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// SQL statement to create the metadata table.
///
/// The metadata table stores key-value pairs for database configuration
/// and versioning information.
pub const CREATE_METADATA_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    )";

/// SQL statement to create the events table.
///
/// `available_capacity` is bounded by a CHECK so that no code path can store
/// a negative count or one above `total_capacity`. `version` is bumped on
/// every capacity write and drives the ledger's compare-and-swap.
pub const CREATE_EVENTS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        venue TEXT,
        starts_at INTEGER NOT NULL,
        price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
        total_capacity INTEGER NOT NULL CHECK (total_capacity > 0),
        available_capacity INTEGER NOT NULL,
        status TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        CHECK (available_capacity >= 0 AND available_capacity <= total_capacity)
    )";

/// SQL statement to create the reservations table.
///
/// The `code` column is UNIQUE; a collision is reported to the workflow,
/// which regenerates the code.
pub const CREATE_RESERVATIONS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS reservations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_id INTEGER NOT NULL REFERENCES events(id),
        user_id INTEGER NOT NULL,
        ticket_count INTEGER NOT NULL CHECK (ticket_count > 0),
        total_amount_cents INTEGER NOT NULL CHECK (total_amount_cents >= 0),
        status TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE,
        special_requests TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )";

/// Name of the partial unique index backing the duplicate guard.
pub const ACTIVE_RESERVATION_INDEX: &str = "idx_reservations_active_user_event";

/// SQL statement to create the partial unique index on active reservations.
///
/// At most one non-cancelled reservation may exist per (user, event).
pub const CREATE_ACTIVE_RESERVATION_INDEX: &str = r"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_reservations_active_user_event
    ON reservations(user_id, event_id)
    WHERE status <> 'cancelled'";

/// SQL statement to create an index on the reservation event column.
pub const CREATE_EVENT_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_reservations_event ON reservations(event_id)";

/// SQL statement to create an index on the reservation user column.
pub const CREATE_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_reservations_user ON reservations(user_id)";

/// SQL statement to select the schema version from the metadata table.
pub const SELECT_SCHEMA_VERSION: &str = "SELECT value FROM metadata WHERE key = 'schema_version'";

/// SQL statement to insert or update the schema version in the metadata table.
pub const INSERT_SCHEMA_VERSION: &str =
    "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)";

/// Column list shared by every event query, in row-mapper order.
pub const EVENT_COLUMNS: &str = "id, title, venue, starts_at, price_cents, total_capacity, \
     available_capacity, status, version";

/// Column list shared by every reservation query, in row-mapper order.
pub const RESERVATION_COLUMNS: &str = "id, event_id, user_id, ticket_count, total_amount_cents, \
     status, code, special_requests, created_at, updated_at";
