//! Property-based tests for reservation types and status transitions.

use super::{CapacityEffect, Reservation, ReservationCode, ReservationStatus, UserId};
use crate::event::EventId;
use crate::money::Money;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = ReservationStatus> {
    prop::sample::select(ReservationStatus::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Every accepted transition moves capacity exactly by the change in the
    // capacity-holding predicate.
    #[test]
    fn transition_effect_matches_holding_predicate(from in status_strategy(), to in status_strategy()) {
        if let Ok(effect) = from.transition_to(to) {
            let expected = match (from.holds_capacity(), to.holds_capacity()) {
                (true, false) => CapacityEffect::Release,
                (false, true) => CapacityEffect::Reclaim,
                _ => CapacityEffect::None,
            };
            prop_assert_eq!(effect, expected);
        }
    }

    // Completed is terminal.
    #[test]
    fn completed_never_leaves(to in status_strategy()) {
        let result = ReservationStatus::Completed.transition_to(to);
        prop_assert_eq!(result.is_ok(), to == ReservationStatus::Completed);
    }

    // Nothing moves back into pending.
    #[test]
    fn pending_is_initial_only(from in status_strategy()) {
        let result = from.transition_to(ReservationStatus::Pending);
        prop_assert_eq!(result.is_ok(), from == ReservationStatus::Pending);
    }

    // Status names parse back to the same status regardless of case.
    #[test]
    fn status_parse_case_insensitive(status in status_strategy(), upper in any::<bool>()) {
        let text = if upper {
            status.as_str().to_ascii_uppercase()
        } else {
            status.as_str().to_string()
        };
        prop_assert_eq!(text.parse::<ReservationStatus>().unwrap(), status);
    }

    // The lead-time window is strict: cancellable iff start > now + lead.
    #[test]
    fn cancellation_window_is_strict(offset_minutes in -5000i64..5000, lead_hours in 0i64..96) {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let lead = Duration::hours(lead_hours);
        let starts = now + lead + Duration::minutes(offset_minutes);
        let r = Reservation::builder(
            EventId::new(1),
            UserId::new(1),
            1,
            ReservationCode::new("RES-PROP").unwrap(),
        )
        .build()
        .unwrap();

        prop_assert_eq!(r.check_cancellable(starts, now, lead).is_ok(), offset_minutes > 0);
    }

    // Any positive ticket count builds, and the amount is stored untouched.
    #[test]
    fn builder_accepts_positive_counts(count in 1u32..10_000, cents in 0i64..1_000_000) {
        let amount = Money::from_cents(cents).unwrap();
        let r = Reservation::builder(
            EventId::new(3),
            UserId::new(4),
            count,
            ReservationCode::new("RES-PROP").unwrap(),
        )
        .total_amount(amount)
        .build()
        .unwrap();

        prop_assert_eq!(r.ticket_count(), count);
        prop_assert_eq!(r.total_amount(), amount);
    }
}
