//! Configuration system for ticketbook.
//!
//! Configuration is merged from several sources, highest precedence first:
//!
//! 1. Programmatic overrides (via `ConfigBuilder::with_config`)
//! 2. Environment variables (`TICKETBOOK_*`)
//! 3. An explicit file (via `ConfigBuilder::with_config_file`)
//! 4. User config (`<data-dir>/config.yaml`)
//! 5. Built-in defaults
//!
//! # Examples
//!
//! ```no_run
//! use ticketbook::config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new().build().unwrap();
//! let policy = config.policy();
//! println!("cancellation closes {}h before start", policy.cancellation_lead_hours);
//! ```

pub mod builder;
pub mod environment;
pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

#[cfg(test)]
mod proptests;

pub use builder::ConfigBuilder;
pub use environment::EnvironmentConfig;
pub use loader::{ConfigLoader, ConfigSource};
pub use merger::ConfigMerger;
pub use schema::{Config, ReservationConfig, ReservationPolicy};
pub use validator::ConfigValidator;
