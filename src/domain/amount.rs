//! Money types
//!
//! Domain primitives for currency values with business rule validation.
//! All values are validated at construction time, ensuring invalid values
//! cannot exist in the system. Every monetary column is `NUMERIC(15,2)`,
//! so the bounds below mirror that precision.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest value representable by a `NUMERIC(15,2)` column
const MAX_AMOUNT: &str = "9999999999999.99";

/// Maximum decimal places (currency cents)
const MAX_SCALE: u32 = 2;

/// Errors that can occur when creating a money value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount must not be negative (got {0})")]
    Negative(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

fn max_amount() -> Decimal {
    Decimal::from_str(MAX_AMOUNT).expect("Invalid MAX_AMOUNT constant")
}

/// Shared scale and upper-bound rules.
fn check_bounds(value: Decimal) -> Result<Decimal, AmountError> {
    // Trailing zeros ("100.000") are not extra precision
    let value = value.normalize();
    if value.scale() > MAX_SCALE {
        return Err(AmountError::TooManyDecimals(value.scale()));
    }
    if value > max_amount() {
        return Err(AmountError::Overflow);
    }
    Ok(value)
}

/// Amount represents a strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Maximum 2 decimal places
/// - Fits in `NUMERIC(15,2)`
///
/// # Example
/// ```
/// use rust_decimal::Decimal;
/// use multifinance_api::domain::Amount;
///
/// let amount = Amount::new(Decimal::new(4_000_000, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(4_000_000, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount with validation.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        check_bounds(value).map(Self)
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Charge is a fee-like value that may be zero (admin fee, interest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Charge(Decimal);

impl Charge {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        check_bounds(value).map(Self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Charge {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Charge::new(value)
    }
}

impl From<Charge> for Decimal {
    fn from(charge: Charge) -> Self {
        charge.0
    }
}

/// Balance represents what is left of a credit limit.
/// Unlike Amount, Balance can be zero, but it can never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    /// Create a new balance (zero or positive)
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }
        if value > max_amount() {
            return Err(AmountError::Overflow);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if balance covers the given cost
    pub fn is_sufficient_for(&self, cost: Decimal) -> bool {
        self.0 >= cost
    }

    /// Subtract a cost from the balance
    pub fn debit(&self, cost: Decimal) -> Result<Balance, AmountError> {
        Balance::new(self.0 - cost)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Balance::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(dec!(100));
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().value(), dec!(100));
    }

    #[test]
    fn test_amount_zero_rejected() {
        let amount = Amount::new(Decimal::ZERO);
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_negative_rejected() {
        let amount = Amount::new(dec!(-100));
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_too_many_decimals() {
        let amount = Amount::new(dec!(10.125));
        assert!(matches!(amount, Err(AmountError::TooManyDecimals(3))));
    }

    #[test]
    fn test_amount_trailing_zeros_ok() {
        let amount = Amount::new(dec!(10.500)).unwrap();
        assert_eq!(amount.value(), dec!(10.5));
    }

    #[test]
    fn test_amount_overflow() {
        let amount = Amount::new(dec!(10000000000000));
        assert!(matches!(amount, Err(AmountError::Overflow)));
    }

    #[test]
    fn test_amount_max_value_ok() {
        assert!(Amount::new(dec!(9999999999999.99)).is_ok());
    }

    #[test]
    fn test_amount_from_str() {
        let amount: Amount = "4000000.50".parse().unwrap();
        assert_eq!(amount.value(), dec!(4000000.50));
        assert!("abc".parse::<Amount>().is_err());
    }

    #[test]
    fn test_charge_allows_zero() {
        assert_eq!(Charge::new(Decimal::ZERO).unwrap().value(), Decimal::ZERO);
        assert!(matches!(Charge::new(dec!(-1)), Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_amount_deserializes_from_number_and_string() {
        let from_number: Amount = serde_json::from_str("4000000").unwrap();
        let from_string: Amount = serde_json::from_str("\"4000000\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<Amount>("0").is_err());
    }

    #[test]
    fn test_balance_debit() {
        let balance = Balance::new(dec!(5000000)).unwrap();
        let balance = balance.debit(dec!(4200000)).unwrap();
        assert_eq!(balance.value(), dec!(800000));
    }

    #[test]
    fn test_balance_exact_debit_reaches_zero() {
        let balance = Balance::new(dec!(100)).unwrap();
        assert_eq!(balance.debit(dec!(100)).unwrap().value(), Decimal::ZERO);
    }

    #[test]
    fn test_balance_insufficient() {
        let balance = Balance::new(dec!(1000000)).unwrap();
        assert!(!balance.is_sufficient_for(dec!(4200000)));
        assert!(matches!(
            balance.debit(dec!(4200000)),
            Err(AmountError::Negative(_))
        ));
    }
}
