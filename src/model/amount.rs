//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal`. It is lenient when reading old
//! documents (numbers or numeric strings), strict when parsing user input, and knows how to format
//! itself for display in a given `Currency`.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use tracing::warn;

/// Two amounts closer than this are considered the same when matching a formatted display value
/// back to a stored record.
pub const MATCH_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 3);

/// The largest amount accepted from user input, `999 999 999 999 999`.
pub const MAX_AMOUNT: Amount = Amount(Decimal::from_parts(2_764_472_319, 232_830, 0, false, 0));

/// Documents store amounts as JSON numbers, which hold this many significant digits exactly.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 15;

/// How amounts are shown to the user.
///
/// # Examples
///  - `Currency{ symbol: "FCFA", decimals: 0 }` -> `1 000 FCFA`, `2.5 FCFA`
///  - `Currency{ symbol: "EUR", decimals: 2 }` -> `1 000.00 EUR`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
    /// Printed after the number, separated by a space. May be empty.
    pub symbol: String,
    /// The minimum number of fractional digits to print.
    pub decimals: u32,
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            symbol: String::from("FCFA"),
            decimals: 0,
        }
    }
}

/// Represents a money amount.
///
/// # Examples
///
/// ```
/// # use budget_tracker::model::{Amount, Currency};
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1500").unwrap();
/// assert_eq!(amount.display(&Currency::default()).to_string(), "1 500 FCFA");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// The number of digits written without trailing fractional zeros, e.g. 3 for `0.0125` and 4
    /// for `1500.00`.
    pub fn significant_digits(&self) -> u32 {
        self.0
            .normalize()
            .mantissa()
            .unsigned_abs()
            .checked_ilog10()
            .map_or(1, |d| d + 1)
    }

    /// Returns a value that formats this amount for `currency`.
    pub fn display<'a>(&self, currency: &'a Currency) -> Formatted<'a> {
        Formatted {
            amount: *self,
            currency,
        }
    }

    /// Reads a number back out of a formatted display value such as `1 000 FCFA`. Whitespace is
    /// dropped, a comma is read as a decimal point, and the first run of digits and points is
    /// parsed. Returns `None` if no number can be found.
    pub fn parse_display(s: &str) -> Option<Amount> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let number: String = cleaned
            .chars()
            .skip_while(|c| !(c.is_ascii_digit() || *c == '.'))
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        Decimal::from_str(&number).ok().map(Amount)
    }

    /// True when the two amounts differ by less than `MATCH_TOLERANCE`.
    pub fn approx_eq(&self, other: &Amount) -> bool {
        self.0
            .checked_sub(other.0)
            .is_some_and(|diff| diff.abs() < MATCH_TOLERANCE)
    }

    /// Converts a legacy string value, falling back to zero when it is not a number.
    fn coerce(s: &str) -> Amount {
        match Decimal::from_str(s.trim()) {
            Ok(value) => Amount::storable(value),
            Err(_) => {
                warn!("The stored amount '{s}' is not a number, using 0");
                Amount::ZERO
            }
        }
    }

    /// Rounds a fractional value to the closest one a JSON number can hold, so that a loaded
    /// amount is unchanged by the next save. Whole numbers are kept as they are.
    fn storable(value: Decimal) -> Amount {
        let value = value.normalize();
        if value.scale() == 0 {
            return Amount(value);
        }
        let stored = value
            .to_string()
            .parse::<f64>()
            .ok()
            .and_then(decimal_from_f64)
            .unwrap_or(value);
        if stored != value {
            warn!("The stored amount {value} has too many digits, using {stored}");
        }
        Amount(stored)
    }
}

/// Reads `v` through its shortest decimal form, so that `0.1` becomes exactly `0.1`.
fn decimal_from_f64(v: f64) -> Option<Decimal> {
    Decimal::from_str(&v.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(v))
        .map(|d| d.normalize())
}

/// Inserts a space between each group of three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}

/// An error that can occur when parsing strings into `Amount` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Amount).map_err(AmountError)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0.normalize(), f)
    }
}

/// An `Amount` paired with the `Currency` it should be shown in.
pub struct Formatted<'a> {
    amount: Amount,
    currency: &'a Currency,
}

impl Display for Formatted<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let value = self.amount.value().normalize();
        let decimals = value.scale().max(self.currency.decimals);
        let text = format!("{:.*}", decimals as usize, value.abs());
        let (whole, fraction) = match text.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (text.as_str(), None),
        };
        let sign = if value.is_sign_negative() && !value.is_zero() {
            "-"
        } else {
            ""
        };
        let mut number = format!("{sign}{}", group_thousands(whole));
        if let Some(fraction) = fraction {
            number.push('.');
            number.push_str(fraction);
        }
        if self.currency.symbol.is_empty() {
            write!(f, "{number}")
        } else {
            write!(f, "{number} {}", self.currency.symbol)
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = self.0.normalize();
        if value.scale() == 0 {
            if let Some(i) = value.to_i128() {
                return serializer.serialize_i128(i);
            }
        }
        // Parsing the decimal text gives the f64 closest to the value.
        let number = value
            .to_string()
            .parse::<f64>()
            .unwrap_or_else(|_| value.to_f64().unwrap_or_default());
        serializer.serialize_f64(number)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        match decimal_from_f64(v) {
            Some(value) => Ok(Amount(value)),
            None => {
                warn!("The stored amount {v} is out of range, using 0");
                Ok(Amount::ZERO)
            }
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Ok(Amount::coerce(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::ZERO)
    }
}

impl std::ops::Add for Amount {
    type Output = Amount;

    /// Saturates at the largest representable amount instead of overflowing.
    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

impl<'a> std::iter::Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str(" 50.25 ").unwrap();
        assert_eq!(amount.value(), dec("50.25"));
    }

    #[test]
    fn test_parse_rejects_text() {
        assert!(Amount::from_str("abc").is_err());
        assert!(Amount::from_str("").is_err());
    }

    #[test]
    fn test_is_positive() {
        assert!(Amount::from_str("0.01").unwrap().is_positive());
        assert!(!Amount::from_str("0").unwrap().is_positive());
        assert!(!Amount::from_str("-5").unwrap().is_positive());
    }

    #[test]
    fn test_display_groups_thousands_with_spaces() {
        let currency = Currency::default();
        let amount = Amount::new(dec("1234567"));
        assert_eq!(amount.display(&currency).to_string(), "1 234 567 FCFA");
    }

    #[test]
    fn test_display_keeps_fraction() {
        let currency = Currency::default();
        let amount = Amount::new(dec("2.50"));
        assert_eq!(amount.display(&currency).to_string(), "2.5 FCFA");
    }

    #[test]
    fn test_display_minimum_decimals_without_symbol() {
        let currency = Currency {
            symbol: String::new(),
            decimals: 2,
        };
        let amount = Amount::new(dec("1000"));
        assert_eq!(amount.display(&currency).to_string(), "1 000.00");
    }

    #[test]
    fn test_parse_display() {
        assert_eq!(
            Amount::parse_display("1 000 FCFA").unwrap().value(),
            dec("1000")
        );
        assert_eq!(
            Amount::parse_display("2,5 FCFA").unwrap().value(),
            dec("2.5")
        );
        assert_eq!(
            Amount::parse_display("1 234.56 EUR").unwrap().value(),
            dec("1234.56")
        );
        assert!(Amount::parse_display("FCFA").is_none());
    }

    #[test]
    fn test_approx_eq() {
        let a = Amount::new(dec("10.0000"));
        assert!(a.approx_eq(&Amount::new(dec("10.0009"))));
        assert!(!a.approx_eq(&Amount::new(dec("10.001"))));
        assert!(!Amount::new(Decimal::MAX).approx_eq(&Amount::new(Decimal::MIN)));
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let a: Amount = serde_json::from_str("1000").unwrap();
        assert_eq!(a.value(), dec("1000"));
        let b: Amount = serde_json::from_str("2.5").unwrap();
        assert_eq!(b.value(), dec("2.5"));
        let c: Amount = serde_json::from_str("\"42.5\"").unwrap();
        assert_eq!(c.value(), dec("42.5"));
    }

    #[test]
    fn test_deserialize_bad_string_is_zero() {
        let a: Amount = serde_json::from_str("\"twelve\"").unwrap();
        assert!(a.is_zero());
    }

    #[test]
    fn test_serialize_as_number() {
        assert_eq!(serde_json::to_string(&Amount::new(dec("1000.00"))).unwrap(), "1000");
        assert_eq!(serde_json::to_string(&Amount::new(dec("2.5"))).unwrap(), "2.5");
        assert_eq!(serde_json::to_string(&Amount::new(dec("0.1"))).unwrap(), "0.1");
    }

    #[test]
    fn test_long_amounts_survive_a_save() {
        for s in ["12345678901234567", "0.123456789012345", "99999999999999.9"] {
            let amount = Amount::new(dec(s));
            let json = serde_json::to_string(&amount).unwrap();
            let back: Amount = serde_json::from_str(&json).unwrap();
            assert_eq!(back, amount, "{s} was written as {json}");
        }
    }

    #[test]
    fn test_loaded_string_is_rounded_to_what_is_saved() {
        let loaded: Amount = serde_json::from_str("\"0.1234567890123456789\"").unwrap();
        let json = serde_json::to_string(&loaded).unwrap();
        let reloaded: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, loaded);
        assert!(loaded.approx_eq(&Amount::new(dec("0.1234567890123456789"))));
    }

    #[test]
    fn test_display_keeps_every_digit() {
        let currency = Currency::default();
        let amount = Amount::new(dec("12345678901234567"));
        let text = amount.display(&currency).to_string();
        assert_eq!(text, "12 345 678 901 234 567 FCFA");
        assert_eq!(Amount::parse_display(&text), Some(amount));
        assert_eq!(
            Amount::new(dec("-1500.25")).display(&currency).to_string(),
            "-1 500.25 FCFA"
        );
    }

    #[test]
    fn test_significant_digits() {
        assert_eq!(Amount::new(dec("0.0125")).significant_digits(), 3);
        assert_eq!(Amount::new(dec("1500.00")).significant_digits(), 4);
        assert_eq!(Amount::ZERO.significant_digits(), 1);
        assert_eq!(MAX_AMOUNT.significant_digits(), MAX_SIGNIFICANT_DIGITS);
        assert_eq!(MAX_AMOUNT.value(), dec("999999999999999"));
    }

    #[test]
    fn test_sum_saturates() {
        let huge = Amount::new(dec("50000000000000000000000000000"));
        let sum: Amount = [huge, huge].iter().sum();
        assert_eq!(sum.value(), Decimal::MAX);
        assert_eq!((Amount::ZERO - sum - huge).value(), Decimal::MIN);
    }
}
