//! Customer
//!
//! Identity record created once at registration.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::DomainError;

/// Length of a national identity number (NIK)
pub const NIK_LENGTH: usize = 16;

/// National identity number: exactly 16 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nik(String);

impl Nik {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let value = value.trim();
        if value.len() != NIK_LENGTH || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidInput(format!(
                "nik must be exactly {} digits",
                NIK_LENGTH
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Nik {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Nik::parse(&value)
    }
}

impl From<Nik> for String {
    fn from(nik: Nik) -> Self {
        nik.0
    }
}

impl fmt::Display for Nik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored customer profile. The password hash is deliberately absent:
/// this is the shape that is cached and returned to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub nik: Nik,
    pub full_name: String,
    pub legal_name: String,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub salary: Decimal,
    pub ktp_photo_url: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated registration data, ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub id: Uuid,
    pub nik: Nik,
    pub full_name: String,
    pub legal_name: String,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub salary: Decimal,
    pub ktp_photo_url: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub password_hash: String,
}

/// Login material, only ever read straight from the store.
#[derive(Debug, Clone)]
pub struct CustomerCredentials {
    pub customer_id: Uuid,
    pub nik: Nik,
    pub password_hash: String,
}
