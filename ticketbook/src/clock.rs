//! Time source abstraction.
//!
//! Bookability and cancellation windows are computed against "now". The
//! workflow reads it through [`Clock`] so tests can pin it to a fixed
//! instant.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use ticketbook::{Clock, FixedClock};
///
/// let start = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
/// let clock = FixedClock::new(start);
/// clock.advance(Duration::hours(2));
/// assert_eq!(clock.now(), start + Duration::hours(2));
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.lock();
        *guard += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned timestamp is still a valid timestamp.
        self.now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_frozen() {
        let t = Utc.with_ymd_and_hms(2031, 5, 1, 8, 30, 0).unwrap();
        let clock = FixedClock::new(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), t);
    }

    #[test]
    fn test_fixed_clock_set_and_advance() {
        let t = Utc.with_ymd_and_hms(2031, 5, 1, 8, 30, 0).unwrap();
        let clock = FixedClock::new(t);
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), t + Duration::minutes(90));

        let later = Utc.with_ymd_and_hms(2032, 1, 1, 0, 0, 0).unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
