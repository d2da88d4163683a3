//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::auth::AuthError;
use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => AppError::Domain(DomainError::AlreadyExists(what)),
            StoreError::InvalidRow(msg) => AppError::Internal(msg),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

/// Malformed JSON bodies are client errors (400), not axum's default 422.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 401 Unauthorized
            AppError::Auth(auth_err) => match auth_err {
                AuthError::MissingHeader => (StatusCode::UNAUTHORIZED, "missing_token", None),
                AuthError::MalformedHeader => {
                    (StatusCode::UNAUTHORIZED, "malformed_authorization", None)
                }
                AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "invalid_credentials", None)
                }
                AuthError::Encoding(_) | AuthError::Hashing(_) => {
                    tracing::error!("Auth error: {}", auth_err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
                }
            },

            // 429 Too Many Requests
            AppError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded", None)
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InvalidInput(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_input", Some(msg.clone()))
                }
                DomainError::CustomerNotFound(id) => {
                    (StatusCode::NOT_FOUND, "customer_not_found", Some(id.clone()))
                }
                DomainError::CreditLimitNotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    "credit_limit_not_found",
                    Some(domain_err.to_string()),
                ),
                DomainError::TransactionNotFound(contract) => (
                    StatusCode::NOT_FOUND,
                    "transaction_not_found",
                    Some(contract.clone()),
                ),
                DomainError::AlreadyExists(what) => {
                    (StatusCode::CONFLICT, "already_exists", Some(what.clone()))
                }
                DomainError::InsufficientCredit { .. } => (
                    StatusCode::PAYMENT_REQUIRED,
                    "insufficient_credit",
                    Some(domain_err.to_string()),
                ),
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.parts();

        // Server-side failures never leak their internals to the caller.
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
