//! Command definitions
//!
//! Commands represent intentions to change the system state. Each one is
//! deserialized straight from a request body and validated into domain
//! types before any store access.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::{
    Amount, Charge, DomainError, NewCustomer, Nik, Purchase, Tenor, Transaction,
};

/// Maximum length of a contract number
pub const MAX_CONTRACT_NUMBER_LEN: usize = 100;

/// Maximum length of an asset name
pub const MAX_ASSET_NAME_LEN: usize = 255;

/// Maximum length of the customer name fields
pub const MAX_NAME_LEN: usize = 100;

pub const MIN_PASSWORD_LEN: usize = 8;

fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::InvalidInput(format!("{} is required", field)));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

fn optional_url(field: &str, value: &Option<String>) -> Result<Option<String>, DomainError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(Some(url.to_string()))
        }
        Some(_) => Err(DomainError::InvalidInput(format!(
            "{} must be an http(s) URL",
            field
        ))),
    }
}

// =========================================================================
// CreateTransactionCommand
// =========================================================================

/// Command to record an installment purchase against a credit limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionCommand {
    pub customer_id: Uuid,
    pub contract_number: String,
    pub tenor_months: i32,
    pub otr_amount: Decimal,
    pub admin_fee: Decimal,
    pub installment_amount: Decimal,
    pub interest_amount: Decimal,
    pub asset_name: String,
}

impl CreateTransactionCommand {
    pub fn validate(&self) -> Result<Purchase, DomainError> {
        let contract_number =
            required_text("contract_number", &self.contract_number, MAX_CONTRACT_NUMBER_LEN)?;
        let asset_name = required_text("asset_name", &self.asset_name, MAX_ASSET_NAME_LEN)?;
        let tenor = Tenor::try_from(self.tenor_months)?;

        let otr_amount = Amount::new(self.otr_amount)
            .map_err(|e| DomainError::invalid_amount("otr_amount", e))?;
        let admin_fee = Charge::new(self.admin_fee)
            .map_err(|e| DomainError::invalid_amount("admin_fee", e))?;
        let installment_amount = Amount::new(self.installment_amount)
            .map_err(|e| DomainError::invalid_amount("installment_amount", e))?;
        let interest_amount = Charge::new(self.interest_amount)
            .map_err(|e| DomainError::invalid_amount("interest_amount", e))?;

        Ok(Purchase {
            customer_id: self.customer_id,
            contract_number,
            tenor,
            otr_amount,
            admin_fee,
            installment_amount,
            interest_amount,
            asset_name,
        })
    }
}

/// Result of a successful purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionResult {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Limit left for the tenor after the debit
    pub remaining_limit: Decimal,
}

// =========================================================================
// SetCreditLimitCommand
// =========================================================================

/// Command to create or replace a (customer, tenor) limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCreditLimitCommand {
    pub customer_id: Uuid,
    pub tenor_months: i32,
    pub limit_amount: Decimal,
}

impl SetCreditLimitCommand {
    pub fn validate(&self) -> Result<(Tenor, Amount), DomainError> {
        let tenor = Tenor::try_from(self.tenor_months)?;
        let amount = Amount::new(self.limit_amount)
            .map_err(|e| DomainError::invalid_amount("limit_amount", e))?;
        Ok((tenor, amount))
    }
}

// =========================================================================
// RegisterCustomerCommand
// =========================================================================

/// Command to register a new customer
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterCustomerCommand {
    pub nik: String,
    pub full_name: String,
    pub legal_name: String,
    pub birth_place: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub salary: Decimal,
    #[serde(default)]
    pub ktp_photo_url: Option<String>,
    #[serde(default)]
    pub selfie_photo_url: Option<String>,
    pub password: String,
}

impl fmt::Debug for RegisterCustomerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCustomerCommand")
            .field("nik", &self.nik)
            .field("full_name", &self.full_name)
            .field("birth_date", &self.birth_date)
            .field("password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Registration data that passed validation; still carries the plain
/// password, which the handler hashes before building a `NewCustomer`.
pub struct ValidRegistration {
    pub nik: Nik,
    pub full_name: String,
    pub legal_name: String,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub salary: Decimal,
    pub ktp_photo_url: Option<String>,
    pub selfie_photo_url: Option<String>,
    pub password: String,
}

impl ValidRegistration {
    pub fn into_new_customer(self, password_hash: String) -> NewCustomer {
        NewCustomer {
            id: Uuid::new_v4(),
            nik: self.nik,
            full_name: self.full_name,
            legal_name: self.legal_name,
            birth_place: self.birth_place,
            birth_date: self.birth_date,
            salary: self.salary,
            ktp_photo_url: self.ktp_photo_url,
            selfie_photo_url: self.selfie_photo_url,
            password_hash,
        }
    }
}

impl RegisterCustomerCommand {
    /// Validate against `today` (birth dates may not lie after it).
    pub fn validate(&self, today: NaiveDate) -> Result<ValidRegistration, DomainError> {
        let nik = Nik::parse(&self.nik)?;
        let full_name = required_text("full_name", &self.full_name, MAX_NAME_LEN)?;
        let legal_name = required_text("legal_name", &self.legal_name, MAX_NAME_LEN)?;
        let birth_place = required_text("birth_place", &self.birth_place, MAX_NAME_LEN)?;

        let birth_date = NaiveDate::parse_from_str(self.birth_date.trim(), "%Y-%m-%d")
            .map_err(|_| {
                DomainError::InvalidInput("birth_date must be formatted YYYY-MM-DD".to_string())
            })?;
        if birth_date > today {
            return Err(DomainError::InvalidInput(
                "birth_date cannot be in the future".to_string(),
            ));
        }

        let salary = Amount::new(self.salary)
            .map_err(|e| DomainError::invalid_amount("salary", e))?
            .value();

        let ktp_photo_url = optional_url("ktp_photo_url", &self.ktp_photo_url)?;
        let selfie_photo_url = optional_url("selfie_photo_url", &self.selfie_photo_url)?;

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        Ok(ValidRegistration {
            nik,
            full_name,
            legal_name,
            birth_place,
            birth_date,
            salary,
            ktp_photo_url,
            selfie_photo_url,
            password: self.password.clone(),
        })
    }
}

// =========================================================================
// Auth commands
// =========================================================================

#[derive(Clone, Deserialize)]
pub struct LoginCommand {
    pub nik: String,
    pub password: String,
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("nik", &self.nik)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenCommand {
    pub refresh_token: String,
}

/// Tokens handed out on login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
}

