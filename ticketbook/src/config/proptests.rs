//! Property-based tests for configuration merging and validation.

use super::merger::ConfigMerger;
use super::schema::{Config, ReservationConfig};
use super::validator::ConfigValidator;
use proptest::prelude::*;

fn reservation_strategy() -> impl Strategy<Value = ReservationConfig> {
    (
        prop::option::of(0u32..200),
        prop::option::of(1u32..10),
        prop::option::of("[A-Z]{1,8}"),
        prop::option::of(1u32..50),
    )
        .prop_map(|(lead, retries, prefix, max)| ReservationConfig {
            cancellation_lead_hours: lead,
            max_conflict_retries: retries,
            code_prefix: prefix,
            max_tickets_per_reservation: max,
        })
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of(reservation_strategy()),
        prop::option::of(1u64..120),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(reservations, wait, autoinit)| Config {
            reservations,
            maximum_lock_wait_seconds: wait,
            disable_autoinit: autoinit,
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Set fields of the higher-precedence config win; unset fields fall through
    #[test]
    fn config_merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut result = low.clone();
        ConfigMerger::merge_into(&mut result, &high);

        prop_assert_eq!(
            result.maximum_lock_wait_seconds,
            high.maximum_lock_wait_seconds.or(low.maximum_lock_wait_seconds)
        );
        prop_assert_eq!(result.disable_autoinit, high.disable_autoinit.or(low.disable_autoinit));

        let merged = result.policy();
        let (low_r, high_r) = (low.reservations.unwrap_or_default(), high.reservations.unwrap_or_default());
        let expected_lead = high_r.cancellation_lead_hours.or(low_r.cancellation_lead_hours);
        if let Some(lead) = expected_lead {
            prop_assert_eq!(merged.cancellation_lead_hours, lead);
        }
        let expected_prefix = high_r.code_prefix.or(low_r.code_prefix);
        if let Some(prefix) = expected_prefix {
            prop_assert_eq!(merged.code_prefix, prefix);
        }
    }

    // Empty config is the identity element for merge
    #[test]
    fn config_merge_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(merged, config);
    }

    // Merging is associative
    #[test]
    fn config_merge_associative(a in config_strategy(), b in config_strategy(), c in config_strategy()) {
        let mut left = a.clone();
        ConfigMerger::merge_into(&mut left, &b);
        ConfigMerger::merge_into(&mut left, &c);

        let mut b_merge_c = b;
        ConfigMerger::merge_into(&mut b_merge_c, &c);
        let mut right = a;
        ConfigMerger::merge_into(&mut right, &b_merge_c);

        prop_assert_eq!(left, right);
    }

    // Every generated config is valid, and stays valid over the defaults
    #[test]
    fn generated_configs_validate(config in config_strategy()) {
        prop_assert!(ConfigValidator::validate(&config).is_ok());
        let mut merged = Config::defaults();
        ConfigMerger::merge_into(&mut merged, &config);
        prop_assert!(ConfigValidator::validate(&merged).is_ok());
    }

    // Lowercase prefixes never validate
    #[test]
    fn lowercase_prefix_rejected(prefix in "[a-z]{1,8}") {
        let config = Config {
            reservations: Some(ReservationConfig {
                code_prefix: Some(prefix),
                ..Default::default()
            }),
            ..Default::default()
        };
        prop_assert!(ConfigValidator::validate(&config).is_err());
    }
}
