//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod context;
pub mod credit_limit;
pub mod customer;
pub mod error;
pub mod tenor;
pub mod transaction;

pub use amount::{Amount, AmountError, Balance, Charge};
pub use context::OperationContext;
pub use credit_limit::CreditLimit;
pub use customer::{Customer, CustomerCredentials, NewCustomer, Nik};
pub use error::DomainError;
pub use tenor::Tenor;
pub use transaction::{Purchase, Transaction};
