//! Database layer for persistent storage of events and reservations.
//!
//! This module provides a SQLite-based storage layer: connection management,
//! schema versioning, row mapping, queries, and the immediate-mode
//! transactions every reservation unit of work runs in.
//!
//! # Examples
//!
//! ```no_run
//! use ticketbook::database::{Database, DatabaseConfig};
//! use ticketbook::{EventInventory, Money};
//! use chrono::{Duration, Utc};
//!
//! let mut db = Database::open(DatabaseConfig::new("/tmp/ticketbook.db")).unwrap();
//!
//! let event = EventInventory::builder("Launch party", Utc::now() + Duration::days(30), 100)
//!     .price(Money::from_cents(2500).unwrap())
//!     .build()
//!     .unwrap();
//!
//! let tx = db.begin_transaction().unwrap();
//! let stored = Database::insert_event(&tx, &event, Utc::now()).unwrap();
//! tx.commit().unwrap();
//!
//! println!("created event {:?}", stored.id());
//! ```

mod config;
mod connection;
pub mod migrations;
mod operations;
mod schema;
mod transaction;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{
    default_data_dir, resolve_data_dir, resolve_database_path, DatabaseConfig, DATABASE_FILE_NAME,
    DATA_DIR_ENV,
};
pub use connection::Database;
pub use operations::CapacityAudit;

pub(crate) use transaction::is_busy;

// Re-export migration functions for advanced use cases
pub use migrations::{check_schema_compatibility, get_schema_version, initialize_schema};
