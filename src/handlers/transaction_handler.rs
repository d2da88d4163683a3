//! Transaction Handler
//!
//! Installment purchases: the credit-limit reservation protocol plus the
//! transaction read paths.

use sqlx::{PgPool, Postgres, Transaction as DbTransaction};
use uuid::Uuid;

use crate::cache::CacheAside;
use crate::domain::{DomainError, OperationContext, Purchase, Transaction};
use crate::error::{AppError, AppResult};
use crate::store::{CreditLimitLedger, CustomerDirectory, TransactionRecorder};

use super::{CreateTransactionCommand, CreateTransactionResult};

#[derive(Debug, PartialEq)]
enum Rejection {
    Routine,
    Conflict,
    Failure,
}

fn classify(error: &AppError) -> Rejection {
    match error {
        AppError::Domain(e) if e.is_client_error() || e.is_not_found() => Rejection::Routine,
        AppError::Domain(e) if e.is_conflict_error() => Rejection::Conflict,
        AppError::InvalidRequest(_) => Rejection::Routine,
        _ => Rejection::Failure,
    }
}

/// Declined purchases are routine; anything unexpected is logged as an error.
fn log_rejection(error: &AppError, purchase: &Purchase, context: &OperationContext) {
    match classify(error) {
        Rejection::Routine => tracing::info!(
            correlation_id = ?context.correlation_id,
            customer_id = %purchase.customer_id,
            caller_id = ?context.customer_id,
            client_ip = ?context.client_ip,
            contract_number = %purchase.contract_number,
            error = %error,
            "Purchase rejected"
        ),
        Rejection::Conflict => tracing::warn!(
            correlation_id = ?context.correlation_id,
            customer_id = %purchase.customer_id,
            caller_id = ?context.customer_id,
            client_ip = ?context.client_ip,
            contract_number = %purchase.contract_number,
            error = %error,
            "Purchase conflicts with an existing record"
        ),
        Rejection::Failure => tracing::error!(
            correlation_id = ?context.correlation_id,
            customer_id = %purchase.customer_id,
            caller_id = ?context.customer_id,
            client_ip = ?context.client_ip,
            contract_number = %purchase.contract_number,
            error = %error,
            "Purchase failed"
        ),
    }
}

/// Handler for purchase transactions
pub struct TransactionHandler {
    pool: PgPool,
    directory: CustomerDirectory,
    ledger: CreditLimitLedger,
    recorder: TransactionRecorder,
}

impl TransactionHandler {
    pub fn new(pool: PgPool, cache: CacheAside) -> Self {
        Self {
            directory: CustomerDirectory::new(pool.clone(), cache.clone()),
            ledger: CreditLimitLedger::new(pool.clone(), cache),
            recorder: TransactionRecorder::new(pool.clone()),
            pool,
        }
    }

    /// Reserve the purchase cost against the customer's tenor limit and
    /// record the purchase, as one database transaction.
    ///
    /// On any error every change is rolled back before returning.
    pub async fn execute(
        &self,
        command: CreateTransactionCommand,
        context: &OperationContext,
    ) -> AppResult<CreateTransactionResult> {
        let purchase = command.validate()?;

        let mut tx = self.pool.begin().await?;

        let result = match self.reserve(&mut tx, &purchase).await {
            Ok(result) => result,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                log_rejection(&e, &purchase, context);
                return Err(e);
            }
        };

        tx.commit().await?;

        // The cached limit predates the debit.
        self.ledger
            .evict(purchase.customer_id, purchase.tenor)
            .await;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            customer_id = %purchase.customer_id,
            client_ip = ?context.client_ip,
            transaction_id = %result.transaction.id,
            contract_number = %purchase.contract_number,
            tenor = %purchase.tenor,
            cost = %purchase.total_cost(),
            remaining_limit = %result.remaining_limit,
            "Purchase recorded"
        );

        Ok(result)
    }

    /// Steps that run inside the transaction. Never commits or rolls back.
    async fn reserve(
        &self,
        tx: &mut DbTransaction<'_, Postgres>,
        purchase: &Purchase,
    ) -> AppResult<CreateTransactionResult> {
        if !self.directory.exists_in(tx, purchase.customer_id).await? {
            return Err(DomainError::CustomerNotFound(purchase.customer_id.to_string()).into());
        }

        // Blocks while another purchase holds this (customer, tenor) row.
        let limit = self
            .ledger
            .lock_for_update(tx, purchase.customer_id, purchase.tenor)
            .await?
            .ok_or(DomainError::CreditLimitNotFound {
                customer_id: purchase.customer_id,
                tenor: purchase.tenor,
            })?;

        let remaining = limit.reserve(purchase.total_cost())?;

        self.ledger.apply_debit(tx, limit.id, remaining).await?;

        let transaction = self.recorder.insert(tx, purchase).await?;

        Ok(CreateTransactionResult {
            transaction,
            remaining_limit: remaining.value(),
        })
    }

    pub async fn find_by_contract_number(&self, contract_number: &str) -> AppResult<Transaction> {
        self.recorder
            .find_by_contract_number(contract_number)
            .await?
            .ok_or_else(|| DomainError::TransactionNotFound(contract_number.to_string()).into())
    }

    /// A customer's transactions, newest first. Unknown customer is 404;
    /// a known one without purchases gets an empty list.
    pub async fn list_for_customer(&self, customer_id: Uuid) -> AppResult<Vec<Transaction>> {
        if self.directory.find_by_id(customer_id).await?.is_none() {
            return Err(AppError::Domain(DomainError::CustomerNotFound(
                customer_id.to_string(),
            )));
        }

        Ok(self.recorder.find_by_customer(customer_id).await?)
    }
}
