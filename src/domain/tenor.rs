//! Tenor
//!
//! Loan repayment duration in months, drawn from a small closed set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Repayment duration offered for installment purchases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Tenor {
    OneMonth,
    TwoMonths,
    ThreeMonths,
    SixMonths,
}

impl Tenor {
    pub const ALL: [Tenor; 4] = [
        Tenor::OneMonth,
        Tenor::TwoMonths,
        Tenor::ThreeMonths,
        Tenor::SixMonths,
    ];

    pub fn months(&self) -> i32 {
        match self {
            Tenor::OneMonth => 1,
            Tenor::TwoMonths => 2,
            Tenor::ThreeMonths => 3,
            Tenor::SixMonths => 6,
        }
    }
}

impl TryFrom<i32> for Tenor {
    type Error = DomainError;

    fn try_from(months: i32) -> Result<Self, Self::Error> {
        match months {
            1 => Ok(Tenor::OneMonth),
            2 => Ok(Tenor::TwoMonths),
            3 => Ok(Tenor::ThreeMonths),
            6 => Ok(Tenor::SixMonths),
            other => Err(DomainError::InvalidInput(format!(
                "tenor_months must be one of 1, 2, 3, 6 (got {})",
                other
            ))),
        }
    }
}

impl From<Tenor> for i32 {
    fn from(tenor: Tenor) -> Self {
        tenor.months()
    }
}

impl FromStr for Tenor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let months: i32 = s
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidInput(format!("invalid tenor months format: {}", s)))?;
        Tenor::try_from(months)
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.months())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenor_round_trips_through_months() {
        for tenor in Tenor::ALL {
            assert_eq!(Tenor::try_from(tenor.months()).unwrap(), tenor);
        }
    }

    #[test]
    fn test_tenor_rejects_values_outside_enum() {
        for months in [0, 4, 5, 12, -1] {
            assert!(matches!(
                Tenor::try_from(months),
                Err(DomainError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_tenor_from_str() {
        assert_eq!("6".parse::<Tenor>().unwrap(), Tenor::SixMonths);
        let err = "six".parse::<Tenor>().unwrap_err();
        assert!(err.to_string().contains("invalid tenor months format"));
    }

    #[test]
    fn test_tenor_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Tenor::ThreeMonths).unwrap(), "3");
        let tenor: Tenor = serde_json::from_str("2").unwrap();
        assert_eq!(tenor, Tenor::TwoMonths);
        assert!(serde_json::from_str::<Tenor>("12").is_err());
    }
}
