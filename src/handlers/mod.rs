//! Command Handlers module
//!
//! Handlers that orchestrate business operations over the store
//! components. Each is cheap to build per request from the shared pool
//! and cache.

mod auth_handler;
mod commands;
mod credit_limit_handler;
mod customer_handler;
mod transaction_handler;


pub use auth_handler::AuthHandler;
pub use commands::*;
pub use credit_limit_handler::CreditLimitHandler;
pub use customer_handler::CustomerHandler;
pub use transaction_handler::TransactionHandler;
