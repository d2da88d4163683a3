//! multifinance API Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod auth;
pub mod cache;
pub mod domain;
pub mod handlers;
pub mod store;

pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{Amount, AmountError, Balance, DomainError, OperationContext, Tenor};
