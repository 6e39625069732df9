use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
};

/// Represents an amount of money in USD currency.
///
/// The amount is stored as an exact decimal, so sums and products of prices
/// never pick up floating-point error. The [`Display`] implementation formats
/// it as dollars rounded to 2 decimal places, halves away from zero.
///
/// Multiplying by a quantity is checked, see [`Usd::checked_mul`]. Addition
/// is not: the cleaner bounds the table so that no sum over it overflows.
///
/// # Examples
///
/// ```
/// # use sales_analyzer::Usd;
/// let price: Usd = "$1,234.50".parse().unwrap();
/// assert_eq!(price.checked_mul(2), Some("2469".parse::<Usd>().unwrap()));
/// assert_eq!(price.to_string(), "1234.50");
/// ```
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Usd(Decimal);

impl Usd {
    /// Returns the amount as a float, for plotting and statistics.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Returns `self * quantity`, or `None` if the result overflows.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Returns `self + rhs`, or `None` if the result overflows.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Returns the amount without its sign.
    #[must_use]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cents = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        f.pad(&format!("{cents:.2}"))
    }
}

impl FromStr for Usd {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let cleaned = s.trim().trim_start_matches('$').replace(',', "");
        Ok(Self(Decimal::from_str(&cleaned)?))
    }
}

impl Add for Usd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_fn_accepts_dollar_sign_and_thousands_separators() {
        let usd = Usd::from_str("$3,409.15").unwrap();
        assert_eq!(usd, Usd::from_str("3409.15").unwrap());
    }

    #[test]
    fn from_str_fn_rejects_non_numeric_input() {
        assert!(Usd::from_str("ten dollars").is_err());
        assert!(Usd::from_str("").is_err());
    }

    #[test]
    fn checked_mul_fn_is_exact_for_decimal_prices() {
        let price = Usd::from_str("0.10").unwrap();
        assert_eq!(price.checked_mul(3), Some(Usd::from_str("0.3").unwrap()));
    }

    #[test]
    fn checked_mul_fn_returns_none_on_overflow() {
        let price = Usd::from_str("100000000000000000000").unwrap();
        assert_eq!(price.checked_mul(4_000_000_000), None);
    }

    #[test]
    fn checked_add_fn_returns_none_on_overflow() {
        let big = Usd::from_str("70000000000000000000000000000").unwrap();
        assert_eq!(big.checked_add(big), None);
        assert_eq!(
            big.checked_add(Usd::from_str("1").unwrap()),
            Some(Usd::from_str("70000000000000000000000000001").unwrap())
        );
    }

    #[test]
    fn sum_fn_adds_amounts_exactly() {
        let total: Usd = ["0.10", "0.20", "19.99"]
            .iter()
            .map(|s| Usd::from_str(s).unwrap())
            .sum();
        assert_eq!(total, Usd::from_str("20.29").unwrap());
    }

    #[test]
    fn display_fn_formats_two_decimal_places_and_honours_width() {
        let usd = Usd::from_str("10").unwrap();
        assert_eq!(usd.to_string(), "10.00");
        assert_eq!(format!("{usd:>8}"), "   10.00");
    }

    #[test]
    fn display_fn_rounds_half_cents_away_from_zero() {
        for (amount, want) in [
            ("1.999", "2.00"),
            ("0.135", "0.14"),
            ("0.125", "0.13"),
            ("0.124", "0.12"),
            ("-0.125", "-0.13"),
        ] {
            assert_eq!(Usd::from_str(amount).unwrap().to_string(), want, "{amount}");
        }
    }
}
