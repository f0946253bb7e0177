//! Configuration validation.

use crate::code::validate_prefix;
use crate::config::schema::{Config, ReservationConfig};
use crate::error::{Error, Result};

/// Longest cancellation lead time accepted, one year.
pub const MAX_CANCELLATION_LEAD_HOURS: u32 = 24 * 365;

/// Validates configuration values.
///
/// # Examples
///
/// ```
/// use ticketbook::config::{Config, ConfigValidator};
///
/// ConfigValidator::validate(&Config::defaults()).unwrap();
/// ```
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a complete configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        if let Some(ref reservations) = config.reservations {
            Self::validate_reservations(reservations)?;
        }

        if let Some(timeout) = config.maximum_lock_wait_seconds {
            if timeout == 0 {
                return Err(Error::Validation {
                    field: "maximum_lock_wait_seconds".into(),
                    message: "Timeout must be greater than 0".into(),
                });
            }
        }

        Ok(())
    }

    fn validate_reservations(reservations: &ReservationConfig) -> Result<()> {
        if reservations.max_conflict_retries == Some(0) {
            return Err(Error::Validation {
                field: "reservations.max_conflict_retries".into(),
                message: "At least one attempt is required".into(),
            });
        }

        if let Some(hours) = reservations.cancellation_lead_hours {
            if hours > MAX_CANCELLATION_LEAD_HOURS {
                return Err(Error::Validation {
                    field: "reservations.cancellation_lead_hours".into(),
                    message: format!("Must be at most {MAX_CANCELLATION_LEAD_HOURS} hours"),
                });
            }
        }

        if let Some(ref prefix) = reservations.code_prefix {
            validate_prefix(prefix).map_err(|e| Error::Validation {
                field: "reservations.code_prefix".into(),
                message: e.message,
            })?;
        }

        if reservations.max_tickets_per_reservation == Some(0) {
            return Err(Error::Validation {
                field: "reservations.max_tickets_per_reservation".into(),
                message: "Must allow at least one ticket".into(),
            });
        }

        Ok(())
    }
}
