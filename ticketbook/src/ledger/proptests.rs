//! Property-based tests for the capacity ledger.

use super::CapacityLedger;
use crate::database::migrations::initialize_schema;
use crate::database::Database;
use crate::error::Error;
use crate::event::EventInventory;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
enum Op {
    Reserve(u32),
    Release(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..8).prop_map(Op::Reserve),
        (1u32..8).prop_map(Op::Release),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        .. ProptestConfig::default()
    })]

    // Replaying any sequence of reserve/release calls against a simple model
    // keeps the stored capacity within [0, total] and equal to the model.
    #[test]
    fn capacity_tracks_model(total in 1u32..30, ops in prop::collection::vec(op_strategy(), 0..40)) {
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        let event = EventInventory::builder("Prop", now + Duration::days(1), total).build().unwrap();
        let id = Database::insert_event(&conn, &event, now).unwrap().id().unwrap();
        let ledger = CapacityLedger::new(&conn);

        let mut model = total;
        let mut granted: u64 = 0;
        for op in ops {
            match op {
                Op::Reserve(q) => match ledger.reserve(id, q, now) {
                    Ok(after) => {
                        prop_assert!(q <= model);
                        model -= q;
                        granted += u64::from(q);
                        prop_assert_eq!(after.available_capacity(), model);
                    }
                    Err(Error::InsufficientCapacity { available, .. }) => {
                        prop_assert!(q > model);
                        prop_assert_eq!(available, model);
                    }
                    Err(Error::EventNotBookable { .. }) => prop_assert_eq!(model, 0),
                    Err(other) => prop_assert!(false, "unexpected error {other}"),
                },
                Op::Release(q) => {
                    let after = ledger.release(id, q).unwrap();
                    model = (model + q).min(total);
                    granted = granted.saturating_sub(u64::from(q));
                    prop_assert_eq!(after.available_capacity(), model);
                }
            }

            let stored = ledger.snapshot(id).unwrap();
            prop_assert!(stored.available_capacity() <= stored.total_capacity());
            prop_assert_eq!(stored.available_capacity(), model);
        }
        prop_assert!(granted <= u64::from(total));
    }
}
