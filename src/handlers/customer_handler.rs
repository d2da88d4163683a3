//! Customer Handler
//!
//! Registration and profile lookups.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::cache::CacheAside;
use crate::domain::{Customer, DomainError, Nik};
use crate::error::{AppError, AppResult};
use crate::store::CustomerDirectory;

use super::RegisterCustomerCommand;

pub struct CustomerHandler {
    directory: CustomerDirectory,
}

impl CustomerHandler {
    pub fn new(pool: PgPool, cache: CacheAside) -> Self {
        Self {
            directory: CustomerDirectory::new(pool, cache),
        }
    }

    /// Register a new customer. A taken NIK is `AlreadyExists`.
    pub async fn register(&self, command: RegisterCustomerCommand) -> AppResult<Customer> {
        let registration = command.validate(Utc::now().date_naive())?;

        let password = registration.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))??;

        let customer = self
            .directory
            .create(registration.into_new_customer(password_hash))
            .await?;

        tracing::info!(customer_id = %customer.id, "Customer registered");

        Ok(customer)
    }

    pub async fn find_by_id(&self, customer_id: Uuid) -> AppResult<Customer> {
        self.directory
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| DomainError::CustomerNotFound(customer_id.to_string()).into())
    }

    pub async fn find_by_nik(&self, nik: &str) -> AppResult<Customer> {
        let nik = Nik::parse(nik)?;
        self.directory
            .find_by_nik(&nik)
            .await?
            .ok_or_else(|| DomainError::CustomerNotFound(nik.to_string()).into())
    }
}
