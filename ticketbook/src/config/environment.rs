//! Environment variable handling for configuration overrides.
//!
//! Every `TICKETBOOK_*` variable overrides the matching configuration file
//! value.

use crate::config::schema::{Config, ReservationConfig};
use crate::error::{Error, Result};
use std::env;
use std::str::FromStr;

/// Overrides `reservations.cancellation_lead_hours`.
pub const CANCELLATION_LEAD_HOURS_ENV: &str = "TICKETBOOK_CANCELLATION_LEAD_HOURS";
/// Overrides `reservations.max_conflict_retries`.
pub const MAX_CONFLICT_RETRIES_ENV: &str = "TICKETBOOK_MAX_CONFLICT_RETRIES";
/// Overrides `reservations.code_prefix`.
pub const CODE_PREFIX_ENV: &str = "TICKETBOOK_CODE_PREFIX";
/// Overrides `reservations.max_tickets_per_reservation`.
pub const MAX_TICKETS_ENV: &str = "TICKETBOOK_MAX_TICKETS";
/// Overrides `maximum_lock_wait_seconds`.
pub const MAXIMUM_LOCK_WAIT_SECONDS_ENV: &str = "TICKETBOOK_MAXIMUM_LOCK_WAIT_SECONDS";
/// Overrides `disable_autoinit`.
pub const DISABLE_AUTOINIT_ENV: &str = "TICKETBOOK_DISABLE_AUTOINIT";

/// Every variable read by [`EnvironmentConfig::apply_overrides`].
pub const ALL_ENV_VARS: [&str; 6] = [
    CANCELLATION_LEAD_HOURS_ENV,
    MAX_CONFLICT_RETRIES_ENV,
    CODE_PREFIX_ENV,
    MAX_TICKETS_ENV,
    MAXIMUM_LOCK_WAIT_SECONDS_ENV,
    DISABLE_AUTOINIT_ENV,
];

/// Handles environment variable overrides for configuration.
///
/// # Examples
///
/// ```no_run
/// use ticketbook::config::{Config, EnvironmentConfig};
///
/// let mut config = Config::default();
/// EnvironmentConfig::apply_overrides(&mut config).unwrap();
/// ```
pub struct EnvironmentConfig;

impl EnvironmentConfig {
    /// Apply environment variable overrides to config.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable holds a value of the wrong type
    /// (non-numeric count, invalid boolean).
    pub fn apply_overrides(config: &mut Config) -> Result<()> {
        Self::apply_reservation_overrides(config)?;

        if let Ok(seconds) = env::var(MAXIMUM_LOCK_WAIT_SECONDS_ENV) {
            config.maximum_lock_wait_seconds =
                Some(Self::parse_number(MAXIMUM_LOCK_WAIT_SECONDS_ENV, &seconds)?);
        }

        if let Ok(val) = env::var(DISABLE_AUTOINIT_ENV) {
            config.disable_autoinit = Some(Self::parse_bool(DISABLE_AUTOINIT_ENV, &val)?);
        }

        Ok(())
    }

    fn apply_reservation_overrides(config: &mut Config) -> Result<()> {
        let mut reservations: ReservationConfig = config.reservations.clone().unwrap_or_default();
        let mut modified = false;

        if let Ok(hours) = env::var(CANCELLATION_LEAD_HOURS_ENV) {
            reservations.cancellation_lead_hours =
                Some(Self::parse_number(CANCELLATION_LEAD_HOURS_ENV, &hours)?);
            modified = true;
        }

        if let Ok(retries) = env::var(MAX_CONFLICT_RETRIES_ENV) {
            reservations.max_conflict_retries =
                Some(Self::parse_number(MAX_CONFLICT_RETRIES_ENV, &retries)?);
            modified = true;
        }

        if let Ok(prefix) = env::var(CODE_PREFIX_ENV) {
            reservations.code_prefix = Some(prefix.trim().to_string());
            modified = true;
        }

        if let Ok(max) = env::var(MAX_TICKETS_ENV) {
            reservations.max_tickets_per_reservation =
                Some(Self::parse_number(MAX_TICKETS_ENV, &max)?);
            modified = true;
        }

        if modified {
            config.reservations = Some(reservations);
        }

        Ok(())
    }

    fn parse_number<T: FromStr>(field: &str, s: &str) -> Result<T> {
        s.trim().parse().map_err(|_| Error::Validation {
            field: field.into(),
            message: format!("Must be a non-negative integer, got '{s}'"),
        })
    }

    /// Parse a boolean value from a string.
    ///
    /// Accepts: true/1/yes/on for true, false/0/no/off for false (case-insensitive).
    fn parse_bool(field: &str, s: &str) -> Result<bool> {
        match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(Error::Validation {
                field: field.into(),
                message: format!(
                    "Invalid boolean value: '{s}' (expected true/false/1/0/yes/no/on/off)"
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in ALL_ENV_VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_parse_bool_variants() {
        for s in ["true", "TRUE", "1", "yes", "On"] {
            assert!(EnvironmentConfig::parse_bool("test", s).unwrap());
        }
        for s in ["false", "FALSE", "0", "no", "off"] {
            assert!(!EnvironmentConfig::parse_bool("test", s).unwrap());
        }
        assert!(EnvironmentConfig::parse_bool("test", "maybe").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(EnvironmentConfig::parse_number::<u32>("f", " 12 ").unwrap(), 12);
        let err = EnvironmentConfig::parse_number::<u32>("f", "-3").unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "f"));
    }

    #[test]
    #[serial]
    fn test_no_env_leaves_config_untouched() {
        clear_env();
        let mut config = Config::default();
        EnvironmentConfig::apply_overrides(&mut config).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    #[serial]
    fn test_reservation_overrides() {
        clear_env();
        env::set_var(CANCELLATION_LEAD_HOURS_ENV, "6");
        env::set_var(CODE_PREFIX_ENV, "TIX");
        env::set_var(MAX_TICKETS_ENV, "4");

        let mut config = Config {
            reservations: Some(ReservationConfig {
                max_conflict_retries: Some(7),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = EnvironmentConfig::apply_overrides(&mut config);
        clear_env();
        result.unwrap();

        let policy = config.policy();
        assert_eq!(policy.cancellation_lead_hours, 6);
        assert_eq!(policy.code_prefix, "TIX");
        assert_eq!(policy.max_tickets_per_reservation, Some(4));
        // Values not named in the environment survive
        assert_eq!(policy.max_conflict_retries, 7);
    }

    #[test]
    #[serial]
    fn test_lock_wait_and_autoinit_overrides() {
        clear_env();
        env::set_var(MAXIMUM_LOCK_WAIT_SECONDS_ENV, "30");
        env::set_var(DISABLE_AUTOINIT_ENV, "yes");

        let mut config = Config::default();
        let result = EnvironmentConfig::apply_overrides(&mut config);
        clear_env();
        result.unwrap();

        assert_eq!(config.maximum_lock_wait_seconds, Some(30));
        assert_eq!(config.disable_autoinit, Some(true));
    }

    #[test]
    #[serial]
    fn test_invalid_value_reports_variable() {
        clear_env();
        env::set_var(MAX_CONFLICT_RETRIES_ENV, "many");

        let mut config = Config::default();
        let result = EnvironmentConfig::apply_overrides(&mut config);
        clear_env();

        assert!(matches!(
            result,
            Err(Error::Validation { ref field, .. }) if field == MAX_CONFLICT_RETRIES_ENV
        ));
    }
}
