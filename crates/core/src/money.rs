//! Non-negative money amounts in minor currency units.

use core::iter::Sum;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Minor units per major unit (two decimal places).
const MINOR_PER_MAJOR: u64 = 100;

/// Amount in the smallest currency unit (e.g. cents).
///
/// Single-currency by construction. Arithmetic saturates instead of wrapping,
/// so a pathological quantity can never produce a total smaller than a line.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub fn from_major(major: u64) -> Self {
        Self(major.saturating_mul(MINOR_PER_MAJOR))
    }

    pub fn minor_units(&self) -> u64 {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    pub fn times(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(u64::from(quantity)))
    }

    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }
}

impl ValueObject for Money {}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Money::saturating_add)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / MINOR_PER_MAJOR, self.0 % MINOR_PER_MAJOR)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parses `"50"`, `"12.5"` or `"12.50"`. Negative amounts and more than two
    /// decimal places are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (major, minor, has_point) = match s.split_once('.') {
            Some((major, minor)) => (major, minor, true),
            None => (s, "", false),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        let dangling_point = has_point && minor.is_empty();
        if major.is_empty() || dangling_point || !all_digits(major) || !all_digits(minor) {
            return Err(DomainError::validation(format!("invalid amount: {s:?}")));
        }
        if minor.len() > 2 {
            return Err(DomainError::validation(format!(
                "amount has more than two decimal places: {s:?}"
            )));
        }

        let major: u64 = major
            .parse()
            .map_err(|_| DomainError::validation(format!("amount out of range: {s:?}")))?;
        let minor: u64 = match minor.len() {
            0 => 0,
            1 => u64::from(minor.as_bytes()[0] - b'0') * 10,
            _ => u64::from(minor.as_bytes()[0] - b'0') * 10 + u64::from(minor.as_bytes()[1] - b'0'),
        };

        major
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(minor))
            .map(Money)
            .ok_or_else(|| DomainError::validation(format!("amount out of range: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!("50".parse::<Money>().unwrap(), Money::from_major(50));
        assert_eq!("12.5".parse::<Money>().unwrap(), Money::from_minor(1250));
        assert_eq!("12.05".parse::<Money>().unwrap(), Money::from_minor(1205));
        assert_eq!("0".parse::<Money>().unwrap(), Money::ZERO);
    }

    #[test]
    fn rejects_negative_and_malformed_amounts() {
        for input in ["-1", "", ".5", "1.234", "abc", "1.2x", "1e3"] {
            let err = input.parse::<Money>().unwrap_err();
            match err {
                DomainError::Validation(_) => {}
                _ => panic!("Expected Validation error for {input:?}"),
            }
        }
    }

    #[test]
    fn rejects_decimal_point_without_digits() {
        for input in ["5.", "5. ", "."] {
            match input.parse::<Money>() {
                Err(DomainError::Validation(_)) => {}
                other => panic!("Expected Validation error for {input:?}, got {other:?}"),
            }
        }
        assert_eq!("5.0".parse::<Money>().unwrap(), Money::from_major(5));
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Money::from_major(50).to_string(), "50.00");
        assert_eq!(Money::from_minor(1205).to_string(), "12.05");
    }

    #[test]
    fn times_and_sum_saturate() {
        let huge = Money::from_minor(u64::MAX / 2);
        assert_eq!(huge.times(3), Money::from_minor(u64::MAX));
        let total: Money = [huge, huge, huge].into_iter().sum();
        assert_eq!(total, Money::from_minor(u64::MAX));
    }

    #[test]
    fn serializes_as_minor_units() {
        let json = serde_json::to_string(&Money::from_major(50)).unwrap();
        assert_eq!(json, "5000");
    }
}
