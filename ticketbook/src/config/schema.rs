//! Configuration schema definitions.
//!
//! [`Config`] mirrors the YAML file layout: every field is optional so that
//! several sources can be layered on top of each other. [`ReservationPolicy`]
//! is the resolved view with defaults filled in.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::code::DEFAULT_CODE_PREFIX;
use crate::ledger::DEFAULT_MAX_ATTEMPTS;

/// Default cancellation lead time, in hours.
pub const DEFAULT_CANCELLATION_LEAD_HOURS: u32 = 24;

/// Default maximum time to wait for the database write lock, in seconds.
pub const DEFAULT_LOCK_WAIT_SECONDS: u64 = 5;

/// Complete configuration structure.
///
/// # Examples
///
/// ```
/// use ticketbook::config::{Config, ReservationConfig};
///
/// let config = Config {
///     reservations: Some(ReservationConfig {
///         cancellation_lead_hours: Some(48),
///         ..Default::default()
///     }),
///     ..Default::default()
/// };
/// assert_eq!(config.policy().cancellation_lead_hours, 48);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Reservation workflow settings.
    pub reservations: Option<ReservationConfig>,

    /// Maximum time to wait for database lock acquisition (seconds).
    pub maximum_lock_wait_seconds: Option<u64>,

    /// Disable automatic database initialization.
    pub disable_autoinit: Option<bool>,
}

/// Reservation workflow settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReservationConfig {
    /// Hours before the event start after which customers can no longer cancel.
    pub cancellation_lead_hours: Option<u32>,

    /// Attempts made before a contended event yields a transient conflict.
    pub max_conflict_retries: Option<u32>,

    /// Prefix of generated reservation codes.
    pub code_prefix: Option<String>,

    /// Largest ticket count a single reservation may request.
    pub max_tickets_per_reservation: Option<u32>,
}

impl Config {
    /// Built-in defaults, used as the lowest-precedence source.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            reservations: Some(ReservationConfig {
                cancellation_lead_hours: Some(DEFAULT_CANCELLATION_LEAD_HOURS),
                max_conflict_retries: Some(DEFAULT_MAX_ATTEMPTS),
                code_prefix: Some(DEFAULT_CODE_PREFIX.to_string()),
                max_tickets_per_reservation: None,
            }),
            maximum_lock_wait_seconds: Some(DEFAULT_LOCK_WAIT_SECONDS),
            disable_autoinit: Some(false),
        }
    }

    /// Resolves the reservation settings, filling gaps with defaults.
    #[must_use]
    pub fn policy(&self) -> ReservationPolicy {
        let defaults = ReservationPolicy::default();
        let Some(r) = &self.reservations else {
            return defaults;
        };
        ReservationPolicy {
            cancellation_lead_hours: r
                .cancellation_lead_hours
                .unwrap_or(defaults.cancellation_lead_hours),
            max_conflict_retries: r
                .max_conflict_retries
                .unwrap_or(defaults.max_conflict_retries),
            code_prefix: r.code_prefix.clone().unwrap_or(defaults.code_prefix),
            max_tickets_per_reservation: r.max_tickets_per_reservation,
        }
    }

    /// Returns the lock wait, falling back to the default.
    #[must_use]
    pub fn lock_wait_seconds(&self) -> u64 {
        self.maximum_lock_wait_seconds
            .unwrap_or(DEFAULT_LOCK_WAIT_SECONDS)
    }
}

/// Resolved reservation settings used by the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationPolicy {
    /// Hours before the event start after which customers can no longer cancel.
    pub cancellation_lead_hours: u32,
    /// Attempts made before a contended event yields a transient conflict.
    pub max_conflict_retries: u32,
    /// Prefix of generated reservation codes.
    pub code_prefix: String,
    /// Largest ticket count a single reservation may request, if capped.
    pub max_tickets_per_reservation: Option<u32>,
}

impl ReservationPolicy {
    /// The cancellation lead time as a duration.
    #[must_use]
    pub fn cancellation_lead(&self) -> Duration {
        Duration::hours(i64::from(self.cancellation_lead_hours))
    }
}

impl Default for ReservationPolicy {
    fn default() -> Self {
        Self {
            cancellation_lead_hours: DEFAULT_CANCELLATION_LEAD_HOURS,
            max_conflict_retries: DEFAULT_MAX_ATTEMPTS,
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            max_tickets_per_reservation: None,
        }
    }
}
