use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Signed money amount in exact decimal.
///
/// Serialized as a decimal string so the value survives stores that have no
/// native decimal type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Amount(value)
    }

    /// `minor` units at the given scale, e.g. `from_minor(1550, 2)` is 15.50.
    pub fn from_minor(minor: i64, scale: u32) -> Self {
        Amount(Decimal::new(minor, scale))
    }

    pub fn from_i64(value: i64) -> Self {
        Amount(Decimal::from(value))
    }

    pub fn to_decimal(&self) -> Decimal {
        self.0
    }

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn abs(&self) -> Self {
        Amount(self.0.abs())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_add(self, other: Amount) -> Amount {
        Amount(self.0.saturating_add(other.0))
    }

    /// Sum that is exact whenever the true total is representable, in any
    /// term order. Credits and debits are interleaved so the running total
    /// never drifts further from zero than the largest term; a total that
    /// really is out of range saturates.
    pub fn balanced_sum(values: impl IntoIterator<Item = Amount>) -> Amount {
        let (mut credits, mut debits): (Vec<Amount>, Vec<Amount>) = values
            .into_iter()
            .filter(|a| !a.is_zero())
            .partition(|a| a.is_positive());

        let mut total = Amount::ZERO;
        loop {
            let next = if total.is_negative() {
                credits.pop().or_else(|| debits.pop())
            } else {
                debits.pop().or_else(|| credits.pop())
            };
            match next {
                Some(value) => total = total.saturating_add(value),
                None => return total,
            }
        }
    }
}

impl Add for Amount {
    type Output = Amount;
    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Amount;
    fn sub(self, other: Amount) -> Amount {
        Amount(self.0 - other.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Amount) {
        self.0 += other.0;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, other: Amount) {
        self.0 -= other.0;
    }
}

impl Neg for Amount {
    type Output = Amount;
    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + *a)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s.trim()).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn repeated_small_amounts_do_not_drift() {
        let tenth = Amount::from_minor(1, 1);
        let total: Amount = std::iter::repeat(tenth).take(10).sum();
        assert_eq!(total, Amount::from_i64(1));
    }

    #[test]
    fn display_strips_trailing_zeros() {
        assert_eq!(Amount::new(dec!(15.00)).to_string(), "15");
        assert_eq!(Amount::new(dec!(12.50)).to_string(), "12.5");
    }

    #[test]
    fn serializes_as_string_and_reads_numbers() {
        let json = serde_json::to_string(&Amount::new(dec!(15.50))).unwrap();
        assert_eq!(json, "\"15.50\"");

        let from_str: Amount = serde_json::from_str("\"0.1\"").unwrap();
        let from_int: Amount = serde_json::from_str("42").unwrap();
        assert_eq!(from_str, Amount::from_minor(1, 1));
        assert_eq!(from_int, Amount::from_i64(42));
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let huge: Amount = "60000000000000000000000000000".parse().unwrap();
        assert!(huge.checked_add(huge).is_none());
        assert!((-huge).checked_sub(huge).is_none());
        assert_eq!(huge.checked_sub(huge), Some(Amount::ZERO));
    }

    #[test]
    fn balanced_sum_survives_large_terms_of_both_signs() {
        let huge: Amount = "60000000000000000000000000000".parse().unwrap();
        // Summed left to right this would overflow after the second term.
        let terms = [huge, huge, -huge, -huge, Amount::from_i64(3)];
        assert_eq!(Amount::balanced_sum(terms), Amount::from_i64(3));
        assert_eq!(
            Amount::balanced_sum([Amount::from_minor(1, 1), Amount::from_minor(-3, 1)]),
            Amount::from_minor(-2, 1)
        );
    }

    #[test]
    fn parses_exact_decimal() {
        let parsed: Amount = "19.99".parse().unwrap();
        assert_eq!(parsed, Amount::new(dec!(19.99)));
        assert!("abc".parse::<Amount>().is_err());
    }
}
