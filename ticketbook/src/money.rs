//! Monetary amounts.
//!
//! Amounts are kept in minor units (cents) so that `price × tickets` is exact.
//! They parse from and print as decimal strings with two fractional digits,
//! e.g. `"12.50"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::reservation::ValidationError;

/// A non-negative amount of money in minor units.
///
/// # Examples
///
/// ```
/// use ticketbook::Money;
///
/// let price: Money = "12.50".parse().unwrap();
/// assert_eq!(price.cents(), 1250);
/// assert_eq!(price.checked_mul(3).unwrap().to_string(), "37.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    ///
    /// # Errors
    ///
    /// Returns an error if `cents` is negative.
    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError {
                field: "amount".into(),
                message: format!("amount must not be negative, got {cents} cents"),
            });
        }
        Ok(Self(cents))
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Multiplies by a ticket count, returning `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, count: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(count)).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError {
            field: "amount".into(),
            message: format!("'{s}' is not a valid amount (expected e.g. 12.50)"),
        };

        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
