//! Currency codes and conversion to payment-provider minor units.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors converting an amount for a payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Amount is zero or negative.
    #[error("amount must be greater than zero (got {0})")]
    NotPositive(Decimal),
    /// Amount does not fit in the provider's integer representation.
    #[error("amount {0} is too large")]
    Overflow(Decimal),
    /// Currency code is not a three-letter ISO 4217 code.
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),
}

/// Lowercase ISO 4217 currency code, as the payment provider expects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Philippine peso, the store's default currency.
    pub const DEFAULT_CODE: &'static str = "php";

    /// Parse a currency code, normalizing to lowercase.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::InvalidCurrency` unless the input is three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, MoneyError> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code.to_ascii_lowercase()))
        } else {
            Err(MoneyError::InvalidCurrency(code.to_owned()))
        }
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(Self::DEFAULT_CODE.to_owned())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Convert a decimal amount into the provider's smallest currency unit.
///
/// Rounds half away from zero, so `19.995` becomes `2000`.
///
/// # Errors
///
/// Returns `MoneyError::NotPositive` for amounts `<= 0` (including amounts
/// that round to zero) and `MoneyError::Overflow` if the result exceeds `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount <= Decimal::ZERO {
        return Err(MoneyError::NotPositive(amount));
    }

    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(MoneyError::Overflow(amount))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    let minor = scaled.to_i64().ok_or(MoneyError::Overflow(amount))?;
    if minor == 0 {
        return Err(MoneyError::NotPositive(amount));
    }
    Ok(minor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_whole_and_fractional_amounts() {
        assert_eq!(to_minor_units(dec("1299")).unwrap(), 129_900);
        assert_eq!(to_minor_units(dec("49.99")).unwrap(), 4999);
        assert_eq!(to_minor_units(dec("0.01")).unwrap(), 1);
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(dec("19.995")).unwrap(), 2000);
        assert_eq!(to_minor_units(dec("19.994")).unwrap(), 1999);
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            to_minor_units(Decimal::ZERO),
            Err(MoneyError::NotPositive(_))
        ));
        assert!(matches!(
            to_minor_units(dec("-5")),
            Err(MoneyError::NotPositive(_))
        ));
        assert!(matches!(
            to_minor_units(dec("0.004")),
            Err(MoneyError::NotPositive(_))
        ));
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(matches!(
            to_minor_units(Decimal::MAX),
            Err(MoneyError::Overflow(_))
        ));
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("PHP").unwrap().as_str(), "php");
        assert_eq!(Currency::default().as_str(), "php");
        assert!(Currency::parse("peso").is_err());
        assert!(Currency::parse("p1p").is_err());
    }
}
