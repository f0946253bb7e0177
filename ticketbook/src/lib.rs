#![deny(missing_docs, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # ticketbook
//!
//! Capacity accounting and reservation workflow for event ticketing.
//!
//! Every event has a fixed number of tickets. Reservations take tickets out
//! of that pool and cancellations put them back; no interleaving of
//! concurrent requests can oversell an event, give a user two active
//! reservations for the same event, or leave a status change without its
//! capacity change.
//!
//! ## Core Types
//!
//! - [`EventInventory`]: An event and its ticket counts
//! - [`Reservation`] and [`ReservationCode`]: A booking and its public code
//! - [`ReservationService`]: Create, cancel and administer reservations
//! - [`CapacityLedger`](ledger::CapacityLedger): Versioned capacity updates
//! - [`Error`] and [`Result`]: Error handling types
//! - [`Logger`] and [`LogLevel`]: Logging infrastructure
//!
//! ## Examples
//!
//! ```
//! use ticketbook::{Money, ReservationStatus};
//!
//! let price = Money::from_cents(2500).unwrap();
//! assert_eq!(price.checked_mul(3), Some(Money::from_cents(7500).unwrap()));
//!
//! // Only confirmed reservations may go back to cancelled
//! assert!(ReservationStatus::Confirmed
//!     .transition_to(ReservationStatus::Cancelled)
//!     .is_ok());
//! assert!(ReservationStatus::Completed
//!     .transition_to(ReservationStatus::Cancelled)
//!     .is_err());
//! ```

pub mod clock;
pub mod code;
pub mod config;
pub mod database;
pub mod error;
pub mod event;
pub mod guard;
pub mod ledger;
pub mod locks;
pub mod logging;
pub mod money;
pub mod reservation;
pub mod workflow;

// Re-export key types at crate root for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use code::{CodeGenerator, RandomCodeGenerator};
pub use config::{Config, ConfigBuilder, ReservationPolicy};
pub use database::{CapacityAudit, Database, DatabaseConfig};
pub use error::{Error, NotBookableReason, Result};
pub use event::{EventId, EventInventory, EventStatus, EventUpdate};
pub use logging::{init_logger, LogLevel, Logger};
pub use money::Money;
pub use reservation::{
    Actor, CapacityEffect, Reservation, ReservationCode, ReservationId, ReservationStatus, Role,
    UserId,
};
pub use workflow::{CreateRequest, ReservationService};
