//! Money represented in integer cents.

use serde::{Deserialize, Serialize};

/// Money amount in cents to avoid floating point drift in totals.
/// Serializes as the bare cent count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Creates a money amount from a whole dollar value.
    pub fn from_dollars(dollars: i64) -> Self {
        Self {
            cents: dollars * 100,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by an item quantity.
    pub fn times(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents * quantity as i64,
        }
    }

    /// Applies a fractional rate (e.g., a 0.08 tax rate), rounding to the
    /// nearest cent.
    pub fn times_rate(&self, rate: f64) -> Money {
        Money {
            cents: (self.cents as f64 * rate).round() as i64,
        }
    }

    /// Applies a whole-number percentage (e.g., a 20% discount), rounding
    /// to the nearest cent.
    pub fn percent(&self, percent: u32) -> Money {
        self.times_rate(percent as f64 / 100.0)
    }

    /// Returns the smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        Money {
            cents: self.cents.min(other.cents),
        }
    }

    /// Clamps a negative amount up to zero.
    pub fn clamp_non_negative(self) -> Money {
        Money {
            cents: self.cents.max(0),
        }
    }

    fn dollars_part(&self) -> i64 {
        self.cents.abs() / 100
    }

    fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars_part(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars_part(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money { cents: -self.cents }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_and_dollars() {
        assert_eq!(Money::from_cents(1234).cents(), 1234);
        assert_eq!(Money::from_dollars(50).cents(), 5000);
    }

    #[test]
    fn display_formatting() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(300);
        assert_eq!((a + b).cents(), 1300);
        assert_eq!((a - b).cents(), 700);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(a.times(3).cents(), 3000);
    }

    #[test]
    fn times_rate_rounds_to_nearest_cent() {
        // 999 * 0.0825 = 82.4175 -> 82
        assert_eq!(Money::from_cents(999).times_rate(0.0825).cents(), 82);
        // 1010 * 0.0825 = 83.325 -> 83
        assert_eq!(Money::from_cents(1010).times_rate(0.0825).cents(), 83);
        // 2000 * 0.1 = 200 exactly
        assert_eq!(Money::from_cents(2000).times_rate(0.1).cents(), 200);
    }

    #[test]
    fn percent_of_subtotal() {
        assert_eq!(Money::from_cents(10000).percent(20).cents(), 2000);
        // 333 * 15% = 49.95 -> 50
        assert_eq!(Money::from_cents(333).percent(15).cents(), 50);
    }

    #[test]
    fn min_and_clamp() {
        let a = Money::from_cents(500);
        let b = Money::from_cents(200);
        assert_eq!(a.min(b), b);
        assert_eq!(Money::from_cents(-50).clamp_non_negative(), Money::zero());
        assert_eq!(a.clamp_non_negative(), a);
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = [100, 250, 5].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 355);
    }

    #[test]
    fn serializes_as_bare_cents() {
        let m = Money::from_cents(4599);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "4599");
        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, deserialized);
    }
}
