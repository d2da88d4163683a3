//! Credit Limit
//!
//! One row per (customer, tenor) pair; the amount still available to draw.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Balance, DomainError, Tenor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLimit {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub tenor: Tenor,
    pub limit_amount: Balance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditLimit {
    /// Compute the balance left after drawing `cost` from this limit.
    ///
    /// Fails with `InsufficientCredit` when the cost exceeds the limit; the
    /// limit itself is never modified here.
    pub fn reserve(&self, cost: Decimal) -> Result<Balance, DomainError> {
        let available = self.limit_amount.value();

        if !self.limit_amount.is_sufficient_for(cost) {
            return Err(DomainError::insufficient_credit(cost, available));
        }

        self.limit_amount
            .debit(cost)
            .map_err(|_| DomainError::insufficient_credit(cost, available))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn limit(amount: Decimal) -> CreditLimit {
        CreditLimit {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            tenor: Tenor::ThreeMonths,
            limit_amount: Balance::new(amount).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reserve_within_limit() {
        let remaining = limit(dec!(5000000)).reserve(dec!(4200000)).unwrap();
        assert_eq!(remaining.value(), dec!(800000));
    }

    #[test]
    fn test_reserve_exact_limit() {
        let remaining = limit(dec!(4200000)).reserve(dec!(4200000)).unwrap();
        assert_eq!(remaining.value(), Decimal::ZERO);
    }

    #[test]
    fn test_reserve_over_limit() {
        let result = limit(dec!(1000000)).reserve(dec!(4200000));
        assert_eq!(
            result,
            Err(DomainError::insufficient_credit(dec!(4200000), dec!(1000000)))
        );
    }

    #[test]
    fn test_cached_limit_round_trips_through_json() {
        let original = limit(dec!(750000.50));
        let json = serde_json::to_string(&original).unwrap();
        let back: CreditLimit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_negative_limit_is_not_a_valid_cache_entry() {
        let mut value = serde_json::to_value(limit(dec!(100))).unwrap();
        value["limit_amount"] = serde_json::json!("-5.00");
        assert!(serde_json::from_value::<CreditLimit>(value).is_err());
    }
}
