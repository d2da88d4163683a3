//! Transaction Recorder
//!
//! Append-only purchase records, unique by contract number.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction as DbTransaction};
use uuid::Uuid;

use crate::domain::{Purchase, Tenor, Transaction};

use super::{StoreError, StoreResult};

type TransactionRow = (
    Uuid,
    Uuid,
    String,
    i32,
    Decimal,
    Decimal,
    Decimal,
    Decimal,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

const TRANSACTION_COLUMNS: &str = "id, customer_id, contract_number, tenor_months, otr_amount, \
     admin_fee, installment_amount, interest_amount, asset_name, created_at, updated_at";

fn transaction_from_row(row: TransactionRow) -> StoreResult<Transaction> {
    let (
        id,
        customer_id,
        contract_number,
        tenor_months,
        otr_amount,
        admin_fee,
        installment_amount,
        interest_amount,
        asset_name,
        created_at,
        updated_at,
    ) = row;

    let tenor = Tenor::try_from(tenor_months)
        .map_err(|e| StoreError::InvalidRow(format!("transaction {}: {}", id, e)))?;

    Ok(Transaction {
        id,
        customer_id,
        contract_number,
        tenor,
        otr_amount,
        admin_fee,
        installment_amount,
        interest_amount,
        asset_name,
        created_at,
        updated_at,
    })
}

/// Transaction Recorder
#[derive(Debug, Clone)]
pub struct TransactionRecorder {
    pool: PgPool,
}

impl TransactionRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert inside the caller's transaction.
    ///
    /// A reused contract number is reported as `Duplicate`; the caller must
    /// roll back.
    pub async fn insert(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        purchase: &Purchase,
    ) -> StoreResult<Transaction> {
        let row: TransactionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO transactions (
                id, customer_id, contract_number, tenor_months, otr_amount,
                admin_fee, installment_amount, interest_amount, asset_name
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(purchase.customer_id)
        .bind(&purchase.contract_number)
        .bind(purchase.tenor.months())
        .bind(purchase.otr_amount.value())
        .bind(purchase.admin_fee.value())
        .bind(purchase.installment_amount.value())
        .bind(purchase.interest_amount.value())
        .bind(&purchase.asset_name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| {
            StoreError::from_write(e, |_| {
                format!(
                    "transaction with contract number {} already exists",
                    purchase.contract_number
                )
            })
        })?;

        transaction_from_row(row)
    }

    pub async fn find_by_contract_number(
        &self,
        contract_number: &str,
    ) -> StoreResult<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE contract_number = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(contract_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(transaction_from_row).transpose()
    }

    /// All transactions for a customer, newest first.
    pub async fn find_by_customer(&self, customer_id: Uuid) -> StoreResult<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE customer_id = $1 ORDER BY created_at DESC, id",
            TRANSACTION_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transaction_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_row_conversion() {
        let id = Uuid::new_v4();
        let row: TransactionRow = (
            id,
            Uuid::new_v4(),
            "TRX-001".to_string(),
            3,
            dec!(4000000),
            dec!(100000),
            dec!(1400000),
            dec!(100000),
            "Motor Honda Beat".to_string(),
            Utc::now(),
            Utc::now(),
        );

        let transaction = transaction_from_row(row).unwrap();
        assert_eq!(transaction.id, id);
        assert_eq!(transaction.tenor, Tenor::ThreeMonths);
        assert_eq!(transaction.installment_amount, dec!(1400000));
    }

    #[test]
    fn test_row_with_unknown_tenor_is_rejected() {
        let row: TransactionRow = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            "TRX-002".to_string(),
            12,
            dec!(1),
            dec!(0),
            dec!(1),
            dec!(0),
            "Asset".to_string(),
            Utc::now(),
            Utc::now(),
        );
        assert!(transaction_from_row(row).is_err());
    }
}
