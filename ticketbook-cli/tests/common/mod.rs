//! Common test utilities for CLI integration tests.
//!
//! Each [`TestEnv`] owns a temporary data directory, so tests never share a
//! database.

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Far enough ahead that no cancellation window is ever hit.
pub const FAR_FUTURE: &str = "2099-06-01T19:00:00Z";

/// Test environment with isolated data directory.
pub struct TestEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the ticketbook data directory
    pub data_dir: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new test environment. The data directory is not created;
    /// the first command (or `init`) does that.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("ticketbook-data");
        Self { temp_dir, data_dir }
    }

    /// The binary with no flags preset.
    pub fn command_bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("ticketbook").expect("Failed to find ticketbook binary");
        for var in [
            "TICKETBOOK_DATA_DIR",
            "TICKETBOOK_USER",
            "TICKETBOOK_BUSY_TIMEOUT",
            "TICKETBOOK_DISABLE_AUTOINIT",
            "TICKETBOOK_OUTPUT_FORMAT",
            "TICKETBOOK_CANCELLATION_LEAD_HOURS",
            "TICKETBOOK_MAX_CONFLICT_RETRIES",
            "TICKETBOOK_CODE_PREFIX",
            "TICKETBOOK_MAX_TICKETS",
            "TICKETBOOK_MAXIMUM_LOCK_WAIT_SECONDS",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// The binary with `--data-dir` pointing at this environment.
    pub fn command(&self) -> Command {
        let mut cmd = self.command_bare();
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    /// Write `contents` to the data directory's config.yaml.
    pub fn write_config(&self, contents: &str) {
        std::fs::create_dir_all(&self.data_dir).expect("Failed to create data dir");
        std::fs::write(self.data_dir.join("config.yaml"), contents)
            .expect("Failed to write config");
    }

    /// Create an event as an administrator and return its id.
    pub fn create_event(&self, capacity: u32, price: &str) -> i64 {
        self.create_event_at(capacity, price, FAR_FUTURE)
    }

    /// Create an event starting at `starts_at` and return its id.
    pub fn create_event_at(&self, capacity: u32, price: &str, starts_at: &str) -> i64 {
        let output = self
            .command()
            .args(["event", "create", "--title", "Test Event", "--admin"])
            .args(["--starts-at", starts_at])
            .args(["--capacity", &capacity.to_string()])
            .args(["--price", price])
            .output()
            .expect("Failed to run event create");

        assert!(
            output.status.success(),
            "event create failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout)
            .expect("Invalid UTF-8 in output")
            .trim()
            .parse()
            .expect("Output is not an event id")
    }

    /// Reserve tickets as `user` and return the reservation code.
    pub fn reserve(&self, event: i64, user: i64, quantity: u32) -> String {
        let output = self
            .command()
            .args(["reserve", "--event", &event.to_string()])
            .args(["--quantity", &quantity.to_string()])
            .args(["--as-user", &user.to_string()])
            .output()
            .expect("Failed to run reserve");

        assert!(
            output.status.success(),
            "reserve failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout)
            .expect("Invalid UTF-8 in output")
            .trim()
            .to_string()
    }

    /// Run `audit --format json` and return the parsed report.
    pub fn audit(&self, event: i64) -> serde_json::Value {
        let output = self
            .command()
            .args(["audit", &event.to_string(), "--format", "json"])
            .output()
            .expect("Failed to run audit");
        serde_json::from_slice(&output.stdout).expect("audit output is not JSON")
    }

    /// Tickets still available for `event`.
    pub fn available(&self, event: i64) -> u64 {
        self.audit(event)["available"]
            .as_u64()
            .expect("available is not a number")
    }
}
