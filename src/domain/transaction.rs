//! Transaction
//!
//! Installment purchases. Records are append-only: created once, never
//! updated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, Charge, Tenor};

/// A validated purchase request, ready to be reserved against a limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub customer_id: Uuid,
    pub contract_number: String,
    pub tenor: Tenor,
    pub otr_amount: Amount,
    pub admin_fee: Charge,
    pub installment_amount: Amount,
    pub interest_amount: Charge,
    pub asset_name: String,
}

impl Purchase {
    /// Amount drawn from the credit limit.
    ///
    /// The installment amount is the repayment figure, not a draw, so it is
    /// not part of the cost.
    pub fn total_cost(&self) -> Decimal {
        self.otr_amount.value() + self.admin_fee.value() + self.interest_amount.value()
    }
}

/// Stored transaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub contract_number: String,
    pub tenor: Tenor,
    pub otr_amount: Decimal,
    pub admin_fee: Decimal,
    pub installment_amount: Decimal,
    pub interest_amount: Decimal,
    pub asset_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
