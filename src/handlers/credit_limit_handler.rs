//! Credit Limit Handler
//!
//! Administrative set-limit plus limit lookups.

use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::CacheAside;
use crate::domain::{Amount, CreditLimit, DomainError, Tenor};
use crate::error::AppResult;
use crate::store::{CreditLimitLedger, CustomerDirectory};

use super::SetCreditLimitCommand;

pub struct CreditLimitHandler {
    directory: CustomerDirectory,
    ledger: CreditLimitLedger,
}

impl CreditLimitHandler {
    pub fn new(pool: PgPool, cache: CacheAside) -> Self {
        Self {
            directory: CustomerDirectory::new(pool.clone(), cache.clone()),
            ledger: CreditLimitLedger::new(pool, cache),
        }
    }

    /// Create the limit for a (customer, tenor) pair, or replace the amount
    /// of the existing one.
    ///
    /// Read-then-write without a lock: this is not a debit path. An insert
    /// that loses the race to a concurrent call falls back to a replace.
    pub async fn set(&self, command: SetCreditLimitCommand) -> AppResult<CreditLimit> {
        let (tenor, amount) = command.validate()?;
        self.require_customer(command.customer_id).await?;

        if self.ledger.find(command.customer_id, tenor).await?.is_some() {
            if let Some(credit_limit) = self.replace(&command, tenor, amount).await? {
                return Ok(credit_limit);
            }
        }

        match self
            .ledger
            .insert(command.customer_id, tenor, amount.value())
            .await
        {
            Ok(credit_limit) => {
                tracing::info!(
                    customer_id = %command.customer_id,
                    tenor = %tenor,
                    limit_amount = %amount,
                    "Credit limit created"
                );
                Ok(credit_limit)
            }
            Err(e) if e.is_duplicate() => {
                tracing::info!(
                    customer_id = %command.customer_id,
                    tenor = %tenor,
                    "Credit limit created concurrently, replacing"
                );
                match self.replace(&command, tenor, amount).await? {
                    Some(credit_limit) => Ok(credit_limit),
                    None => Err(e.into()),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(
        &self,
        command: &SetCreditLimitCommand,
        tenor: Tenor,
        amount: Amount,
    ) -> AppResult<Option<CreditLimit>> {
        let replaced = self
            .ledger
            .replace(command.customer_id, tenor, amount.value())
            .await?;

        if replaced.is_some() {
            tracing::info!(
                customer_id = %command.customer_id,
                tenor = %tenor,
                limit_amount = %amount,
                "Credit limit replaced"
            );
        }

        Ok(replaced)
    }

    pub async fn get(&self, customer_id: Uuid, tenor: Tenor) -> AppResult<CreditLimit> {
        self.require_customer(customer_id).await?;

        self.ledger
            .find(customer_id, tenor)
            .await?
            .ok_or_else(|| DomainError::CreditLimitNotFound { customer_id, tenor }.into())
    }

    /// All limits of a customer, ordered by tenor.
    pub async fn list(&self, customer_id: Uuid) -> AppResult<Vec<CreditLimit>> {
        self.require_customer(customer_id).await?;
        Ok(self.ledger.find_all(customer_id).await?)
    }

    async fn require_customer(&self, customer_id: Uuid) -> AppResult<()> {
        match self.directory.find_by_id(customer_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::CustomerNotFound(customer_id.to_string()).into()),
        }
    }
}
