//! Credit Limit Ledger
//!
//! Per-customer, per-tenor limit amounts. Plain reads go through the cache;
//! the debit path locks the row inside the caller's transaction and never
//! looks at the cache.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::cache::CacheAside;
use crate::domain::{Balance, CreditLimit, Tenor};

use super::{StoreError, StoreResult};

/// Upper bound on how long a limit stays cached. A read that races a debit
/// can re-cache the pre-debit row after the post-commit eviction.
pub const LIMIT_CACHE_TTL: Duration = Duration::from_secs(30);

type CreditLimitRow = (Uuid, Uuid, i32, Decimal, DateTime<Utc>, DateTime<Utc>);

pub fn credit_limit_key(customer_id: Uuid, tenor: Tenor) -> String {
    format!("credit_limit:{}:{}", customer_id, tenor.months())
}

fn credit_limit_from_row(row: CreditLimitRow) -> StoreResult<CreditLimit> {
    let (id, customer_id, tenor_months, limit_amount, created_at, updated_at) = row;

    let tenor = Tenor::try_from(tenor_months)
        .map_err(|e| StoreError::InvalidRow(format!("credit limit {}: {}", id, e)))?;
    let limit_amount = Balance::new(limit_amount)
        .map_err(|e| StoreError::InvalidRow(format!("credit limit {}: {}", id, e)))?;

    Ok(CreditLimit {
        id,
        customer_id,
        tenor,
        limit_amount,
        created_at,
        updated_at,
    })
}

/// Credit Limit Ledger
#[derive(Clone)]
pub struct CreditLimitLedger {
    pool: PgPool,
    cache: CacheAside,
}

impl CreditLimitLedger {
    pub fn new(pool: PgPool, cache: CacheAside) -> Self {
        Self { pool, cache }
    }

    fn limit_ttl(&self) -> Duration {
        self.cache.ttl().min(LIMIT_CACHE_TTL)
    }

    async fn remember(&self, key: &str, limit: &CreditLimit) {
        self.cache.write_for(key, limit, self.limit_ttl()).await;
    }

    /// Fetch one (customer, tenor) limit, cache first.
    pub async fn find(&self, customer_id: Uuid, tenor: Tenor) -> StoreResult<Option<CreditLimit>> {
        let key = credit_limit_key(customer_id, tenor);
        if let Some(limit) = self.cache.read::<CreditLimit>(&key).await {
            return Ok(Some(limit));
        }

        let row: Option<CreditLimitRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, tenor_months, limit_amount, created_at, updated_at
            FROM credit_limits
            WHERE customer_id = $1 AND tenor_months = $2
            "#,
        )
        .bind(customer_id)
        .bind(tenor.months())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let limit = credit_limit_from_row(row)?;
                self.remember(&key, &limit).await;
                Ok(Some(limit))
            }
            None => Ok(None),
        }
    }

    /// All limits for a customer, ordered by tenor.
    pub async fn find_all(&self, customer_id: Uuid) -> StoreResult<Vec<CreditLimit>> {
        let rows: Vec<CreditLimitRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, tenor_months, limit_amount, created_at, updated_at
            FROM credit_limits
            WHERE customer_id = $1
            ORDER BY tenor_months
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(credit_limit_from_row).collect()
    }

    /// Insert the first limit for a (customer, tenor) pair.
    ///
    /// Losing a race against another insert for the same pair surfaces as
    /// `Duplicate`.
    pub async fn insert(
        &self,
        customer_id: Uuid,
        tenor: Tenor,
        limit_amount: Decimal,
    ) -> StoreResult<CreditLimit> {
        let row: CreditLimitRow = sqlx::query_as(
            r#"
            INSERT INTO credit_limits (id, customer_id, tenor_months, limit_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, customer_id, tenor_months, limit_amount, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(tenor.months())
        .bind(limit_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            StoreError::from_write(e, |_| {
                format!(
                    "credit limit for customer {} and tenor {} already exists",
                    customer_id, tenor
                )
            })
        })?;

        let limit = credit_limit_from_row(row)?;
        self.remember(&credit_limit_key(customer_id, tenor), &limit)
            .await;

        Ok(limit)
    }

    /// Replace the amount of an existing limit. `None` if the row is gone.
    pub async fn replace(
        &self,
        customer_id: Uuid,
        tenor: Tenor,
        limit_amount: Decimal,
    ) -> StoreResult<Option<CreditLimit>> {
        let row: Option<CreditLimitRow> = sqlx::query_as(
            r#"
            UPDATE credit_limits
            SET limit_amount = $3, updated_at = NOW()
            WHERE customer_id = $1 AND tenor_months = $2
            RETURNING id, customer_id, tenor_months, limit_amount, created_at, updated_at
            "#,
        )
        .bind(customer_id)
        .bind(tenor.months())
        .bind(limit_amount)
        .fetch_optional(&self.pool)
        .await?;

        let key = credit_limit_key(customer_id, tenor);
        match row {
            Some(row) => {
                let limit = credit_limit_from_row(row)?;
                self.remember(&key, &limit).await;
                Ok(Some(limit))
            }
            None => {
                self.cache.evict(&key).await;
                Ok(None)
            }
        }
    }

    /// Read the (customer, tenor) row with `FOR UPDATE`.
    ///
    /// The row stays locked until `tx` commits or rolls back; concurrent
    /// debits of the same pair queue here.
    pub async fn lock_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer_id: Uuid,
        tenor: Tenor,
    ) -> StoreResult<Option<CreditLimit>> {
        let row: Option<CreditLimitRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, tenor_months, limit_amount, created_at, updated_at
            FROM credit_limits
            WHERE customer_id = $1 AND tenor_months = $2
            FOR UPDATE
            "#,
        )
        .bind(customer_id)
        .bind(tenor.months())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(credit_limit_from_row).transpose()
    }

    /// Persist the post-debit amount of a locked row.
    pub async fn apply_debit(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        limit_id: Uuid,
        remaining: Balance,
    ) -> StoreResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE credit_limits
            SET limit_amount = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(limit_id)
        .bind(remaining.value())
        .execute(&mut **tx)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        Ok(())
    }

    /// Drop the cached entry after a committed write.
    pub async fn evict(&self, customer_id: Uuid, tenor: Tenor) {
        self.cache.evict(&credit_limit_key(customer_id, tenor)).await;
    }
}
