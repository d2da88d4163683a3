//! Customer Directory
//!
//! Customer identity lookups by id and by NIK. Reads are cache-aside with
//! both keys kept in sync; the password hash never enters the cache.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::cache::CacheAside;
use crate::domain::{Customer, CustomerCredentials, NewCustomer, Nik};

use super::{StoreError, StoreResult};

const CUSTOMER_COLUMNS: &str = "id, nik, full_name, legal_name, birth_place, birth_date, salary, \
     ktp_photo_url, selfie_photo_url, created_at, updated_at";

type CustomerRow = (
    Uuid,
    String,
    String,
    String,
    String,
    NaiveDate,
    Decimal,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

pub fn customer_key(id: Uuid) -> String {
    format!("customer:{}", id)
}

pub fn customer_nik_key(nik: &Nik) -> String {
    format!("customer_nik:{}", nik)
}

fn customer_from_row(row: CustomerRow) -> StoreResult<Customer> {
    let (
        id,
        nik,
        full_name,
        legal_name,
        birth_place,
        birth_date,
        salary,
        ktp_photo_url,
        selfie_photo_url,
        created_at,
        updated_at,
    ) = row;

    let nik = Nik::parse(&nik)
        .map_err(|e| StoreError::InvalidRow(format!("customer {}: {}", id, e)))?;

    Ok(Customer {
        id,
        nik,
        full_name,
        legal_name,
        birth_place,
        birth_date,
        salary,
        ktp_photo_url,
        selfie_photo_url,
        created_at,
        updated_at,
    })
}

/// Customer Directory
#[derive(Clone)]
pub struct CustomerDirectory {
    pool: PgPool,
    cache: CacheAside,
}

impl CustomerDirectory {
    pub fn new(pool: PgPool, cache: CacheAside) -> Self {
        Self { pool, cache }
    }

    /// Insert a new customer. A taken NIK is reported as `Duplicate`.
    pub async fn create(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let nik = customer.nik.clone();

        let row: CustomerRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO customers (
                id, nik, full_name, legal_name, birth_place, birth_date, salary,
                ktp_photo_url, selfie_photo_url, password_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        ))
        .bind(customer.id)
        .bind(customer.nik.as_str())
        .bind(&customer.full_name)
        .bind(&customer.legal_name)
        .bind(&customer.birth_place)
        .bind(customer.birth_date)
        .bind(customer.salary)
        .bind(&customer.ktp_photo_url)
        .bind(&customer.selfie_photo_url)
        .bind(&customer.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            StoreError::from_write(e, |_| format!("customer with nik {} already exists", nik))
        })?;

        let created = customer_from_row(row)?;
        self.remember(&created).await;

        tracing::debug!(customer_id = %created.id, "Customer created");

        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        if let Some(customer) = self.cache.read::<Customer>(&customer_key(id)).await {
            return Ok(Some(customer));
        }

        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        self.load(row).await
    }

    pub async fn find_by_nik(&self, nik: &Nik) -> StoreResult<Option<Customer>> {
        if let Some(customer) = self.cache.read::<Customer>(&customer_nik_key(nik)).await {
            return Ok(Some(customer));
        }

        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE nik = $1",
            CUSTOMER_COLUMNS
        ))
        .bind(nik.as_str())
        .fetch_optional(&self.pool)
        .await?;

        self.load(row).await
    }

    /// Login material, always read from the store.
    pub async fn find_credentials_by_nik(
        &self,
        nik: &Nik,
    ) -> StoreResult<Option<CustomerCredentials>> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, password_hash FROM customers WHERE nik = $1")
                .bind(nik.as_str())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(customer_id, password_hash)| CustomerCredentials {
            customer_id,
            nik: nik.clone(),
            password_hash,
        }))
    }

    /// Existence check inside a caller's transaction. Bypasses the cache.
    pub async fn exists_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut **tx)
                .await?;

        Ok(exists)
    }

    async fn load(&self, row: Option<CustomerRow>) -> StoreResult<Option<Customer>> {
        match row {
            Some(row) => {
                let customer = customer_from_row(row)?;
                self.remember(&customer).await;
                Ok(Some(customer))
            }
            None => Ok(None),
        }
    }

    /// Populate both cache keys.
    async fn remember(&self, customer: &Customer) {
        self.cache.write(&customer_key(customer.id), customer).await;
        self.cache
            .write(&customer_nik_key(&customer.nik), customer)
            .await;
    }
}
