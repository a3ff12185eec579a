//! Fixed-point money in the smallest currency unit
//!
//! All aggregation happens on integer paise so repeated sums never drift.
//! Conversion to rupees (and to the "Cr"/"L" display form) only happens at
//! presentation time.

use serde::Serialize;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Paise per rupee
const PAISE_PER_RUPEE: u64 = 100;

/// Non-negative amount in paise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_paise(paise: u64) -> Self {
        Self(paise)
    }

    /// Whole rupees, for tests and fixtures
    pub const fn from_whole_rupees(rupees: u64) -> Self {
        Self(rupees.saturating_mul(PAISE_PER_RUPEE))
    }

    /// Convert a parsed rupee amount, rounding to the nearest paisa
    ///
    /// Returns `None` for negative, NaN or infinite input, and for amounts
    /// too large to represent.
    pub fn from_rupees(rupees: f64) -> Option<Self> {
        if !rupees.is_finite() || rupees < 0.0 {
            return None;
        }
        let paise = (rupees * PAISE_PER_RUPEE as f64).round();
        if paise > u64::MAX as f64 {
            return None;
        }
        Some(Self(paise as u64))
    }

    pub const fn paise(self) -> u64 {
        self.0
    }

    pub fn rupees(self) -> f64 {
        self.0 as f64 / PAISE_PER_RUPEE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// |self - other|
    pub fn abs_diff(self, other: Money) -> Money {
        Money(self.0.abs_diff(other.0))
    }

    /// Indian-style display: ₹1.25 Cr, ₹4.50 L, ₹12.5K, ₹640.00
    pub fn format_inr(self) -> String {
        let rupees = self.rupees();
        if rupees >= 10_000_000.0 {
            format!("₹{:.2} Cr", rupees / 10_000_000.0)
        } else if rupees >= 100_000.0 {
            format!("₹{:.2} L", rupees / 100_000.0)
        } else if rupees >= 1_000.0 {
            format!("₹{:.1}K", rupees / 1_000.0)
        } else {
            format!("₹{:.2}", rupees)
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_inr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rupees_rounds_to_paise() {
        assert_eq!(Money::from_rupees(10.005).map(Money::paise), Some(1001));
        assert_eq!(Money::from_rupees(0.0), Some(Money::ZERO));
    }

    #[test]
    fn test_from_rupees_rejects_invalid() {
        assert_eq!(Money::from_rupees(-1.0), None);
        assert_eq!(Money::from_rupees(f64::NAN), None);
        assert_eq!(Money::from_rupees(f64::INFINITY), None);
    }

    #[test]
    fn test_sum_is_exact() {
        // 0.1 + 0.2 drifts in f64, not in paise
        let total: Money = [0.1, 0.2, 0.3]
            .iter()
            .filter_map(|r| Money::from_rupees(*r))
            .sum();
        assert_eq!(total.paise(), 60);
    }

    #[test]
    fn test_format_inr_units() {
        assert_eq!(Money::from_whole_rupees(25_000_000).format_inr(), "₹2.50 Cr");
        assert_eq!(Money::from_whole_rupees(450_000).format_inr(), "₹4.50 L");
        assert_eq!(Money::from_whole_rupees(12_500).format_inr(), "₹12.5K");
        assert_eq!(Money::from_paise(64_050).format_inr(), "₹640.50");
        assert_eq!(Money::ZERO.format_inr(), "₹0.00");
    }

    #[test]
    fn test_abs_diff() {
        let a = Money::from_whole_rupees(100);
        let b = Money::from_whole_rupees(30);
        assert_eq!(a.abs_diff(b), Money::from_whole_rupees(70));
        assert_eq!(b.abs_diff(a), Money::from_whole_rupees(70));
    }
}
