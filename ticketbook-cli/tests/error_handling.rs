//! Exit code tests.
//!
//! - 0: success
//! - 1: request rejected or audit mismatch
//! - 2: contention or lock timeout (also clap usage errors)
//! - 3: no data directory
//! - 4: invalid arguments
//! - 7: configuration error

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_unknown_event_is_rejected() {
    let env = TestEnv::new();
    env.command()
        .args(["reserve", "--event", "999", "--as-user", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: not found: event 999"));
}

#[test]
fn test_unknown_reservation_is_rejected() {
    let env = TestEnv::new();
    env.command()
        .args(["show", "RES-AAAAAAAAAAAA", "--as-user", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_zero_quantity_is_invalid() {
    let env = TestEnv::new();
    let event = env.create_event(5, "1.00");
    env.command()
        .args(["reserve", "--event", &event.to_string(), "-n", "0", "--as-user", "1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("quantity"));
}

#[test]
fn test_invalid_price_is_invalid_argument() {
    let env = TestEnv::new();
    env.command()
        .args(["event", "create", "--title", "Gala", "--capacity", "5", "--admin"])
        .args(["--starts-at", common::FAR_FUTURE, "--price", "twelve"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("price"));
}

#[test]
fn test_zero_capacity_event_is_invalid() {
    let env = TestEnv::new();
    env.command()
        .args(["event", "create", "--title", "Gala", "--capacity", "0", "--admin"])
        .args(["--starts-at", common::FAR_FUTURE])
        .assert()
        .code(4);
}

#[test]
fn test_missing_database_with_autoinit_disabled() {
    let env = TestEnv::new();
    env.command()
        .args(["--disable-autoinit", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ticketbook init"));
    assert!(!env.data_dir.join("ticketbook.db").exists());
}

#[test]
fn test_autoinit_disabled_by_config_file() {
    let env = TestEnv::new();
    env.write_config("disable_autoinit: true\n");
    env.command().arg("list").assert().code(3);
}

#[test]
fn test_malformed_config_file() {
    let env = TestEnv::new();
    env.write_config("reservations: [not, a, map\n");
    env.command()
        .arg("list")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unknown_config_key() {
    let env = TestEnv::new();
    env.write_config("bogus_key: 1\n");
    env.command().arg("list").assert().code(7);
}

#[test]
fn test_invalid_env_config() {
    let env = TestEnv::new();
    env.command()
        .env("TICKETBOOK_MAX_TICKETS", "lots")
        .arg("list")
        .assert()
        .code(7)
        .stderr(predicate::str::contains("TICKETBOOK_MAX_TICKETS"));
}

#[test]
fn test_policy_cap_from_config() {
    let env = TestEnv::new();
    env.write_config("reservations:\n  max_tickets_per_reservation: 2\n");
    let event = env.create_event(10, "1.00");
    env.command()
        .args(["reserve", "--event", &event.to_string(), "-n", "3", "--as-user", "1"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("at most 2"));
}
