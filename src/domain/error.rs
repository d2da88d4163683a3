//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::{AmountError, Tenor};

/// Domain-specific errors
///
/// These errors represent business rule violations and domain invariant failures.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Structurally invalid request (missing field, bad range, bad enum value)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// No credit limit configured for the (customer, tenor) pair
    #[error("Credit limit for tenor {tenor} not found for customer {customer_id}")]
    CreditLimitNotFound { customer_id: Uuid, tenor: Tenor },

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Uniqueness violation (NIK, contract number, customer/tenor pair)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Purchase cost exceeds the remaining limit
    #[error("Insufficient credit: required {required}, available {available}")]
    InsufficientCredit {
        required: Decimal,
        available: Decimal,
    },
}

impl DomainError {
    /// Create an insufficient credit error
    pub fn insufficient_credit(required: Decimal, available: Decimal) -> Self {
        Self::InsufficientCredit {
            required,
            available,
        }
    }

    /// Prefix an amount validation failure with the offending field
    pub fn invalid_amount(field: &str, err: AmountError) -> Self {
        Self::InvalidInput(format!("{}: {}", field, err))
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::InsufficientCredit { .. }
        )
    }

    /// Check if this error names something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CustomerNotFound(_)
                | Self::CreditLimitNotFound { .. }
                | Self::TransactionNotFound(_)
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict_error(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}
