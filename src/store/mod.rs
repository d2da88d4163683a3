//! Store module
//!
//! Persistence components over PostgreSQL. The customer directory and the
//! credit limit ledger read cache-aside; transaction records always come
//! from the store.

mod credit_limit_ledger;
mod customer_directory;
mod error;
mod transaction_recorder;

pub use credit_limit_ledger::{credit_limit_key, CreditLimitLedger};
pub use customer_directory::{customer_key, customer_nik_key, CustomerDirectory};
pub use error::{StoreError, StoreResult};
pub use transaction_recorder::TransactionRecorder;
