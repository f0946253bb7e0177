//! Configuration merging and precedence handling.

use crate::config::loader::ConfigSource;
use crate::config::schema::{Config, ReservationConfig};

/// Merges configuration sources according to precedence rules.
///
/// # Examples
///
/// ```
/// use ticketbook::config::{Config, ConfigMerger};
///
/// let low = Config { maximum_lock_wait_seconds: Some(5), ..Default::default() };
/// let high = Config { maximum_lock_wait_seconds: Some(9), ..Default::default() };
///
/// let mut result = low;
/// ConfigMerger::merge_into(&mut result, &high);
/// assert_eq!(result.maximum_lock_wait_seconds, Some(9));
/// ```
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge multiple configuration sources into final config.
    ///
    /// Sources should be provided in order from lowest to highest precedence.
    #[must_use]
    pub fn merge(sources: Vec<ConfigSource>) -> Config {
        let mut result = Config::default();
        for source in sources {
            Self::merge_into(&mut result, &source.config);
        }
        result
    }

    /// Merge source config into target (source overwrites target).
    ///
    /// Simple fields are overwritten when set in `source`. The
    /// `reservations` section is merged field by field.
    pub fn merge_into(target: &mut Config, source: &Config) {
        if source.disable_autoinit.is_some() {
            target.disable_autoinit = source.disable_autoinit;
        }

        if source.maximum_lock_wait_seconds.is_some() {
            target.maximum_lock_wait_seconds = source.maximum_lock_wait_seconds;
        }

        if let Some(ref source_reservations) = source.reservations {
            target.reservations = Some(match &target.reservations {
                Some(target_reservations) => {
                    Self::merge_reservations(target_reservations, source_reservations)
                }
                None => source_reservations.clone(),
            });
        }
    }

    fn merge_reservations(target: &ReservationConfig, source: &ReservationConfig) -> ReservationConfig {
        ReservationConfig {
            cancellation_lead_hours: source
                .cancellation_lead_hours
                .or(target.cancellation_lead_hours),
            max_conflict_retries: source.max_conflict_retries.or(target.max_conflict_retries),
            code_prefix: source
                .code_prefix
                .clone()
                .or_else(|| target.code_prefix.clone()),
            max_tickets_per_reservation: source
                .max_tickets_per_reservation
                .or(target.max_tickets_per_reservation),
        }
    }
}
