//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::domain::{CreditLimit, Customer, OperationContext, Tenor, Transaction};
use crate::error::AppResult;
use crate::handlers::{
    AuthHandler, AuthTokens, CreateTransactionCommand, CreateTransactionResult,
    CreditLimitHandler, CustomerHandler, LoginCommand, RefreshTokenCommand,
    RegisterCustomerCommand, SetCreditLimitCommand, TransactionHandler,
};

use super::extract::{ApiJson, ApiPath};
use super::middleware::AuthenticatedCustomer;
use super::AppState;

// =========================================================================
// API Routers
// =========================================================================

/// Routes that need no bearer token
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Routes behind the bearer-token middleware
pub fn protected_router() -> Router<AppState> {
    Router::new()
        // Transactions
        .route("/transactions", post(create_transaction))
        .route(
            "/transactions/contract/:contract_number",
            get(get_transaction_by_contract),
        )
        // Credit limits
        .route("/credit-limits", post(set_credit_limit))
        // Customers
        .route("/customers", post(create_customer))
        .route("/customers/me", get(get_current_customer))
        .route("/customers/me/transactions", get(get_current_customer_transactions))
        .route("/customers/nik/:nik", get(get_customer_by_nik))
        .route("/customers/:customer_id", get(get_customer))
        .route(
            "/customers/:customer_id/transactions",
            get(get_customer_transactions),
        )
        .route(
            "/customers/:customer_id/credit-limits",
            get(get_customer_credit_limits),
        )
        .route(
            "/customers/:customer_id/credit-limits/:tenor_months",
            get(get_customer_credit_limit),
        )
}

// =========================================================================
// Auth
// =========================================================================

/// POST /auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<RegisterCustomerCommand>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let handler = CustomerHandler::new(state.pool, state.cache);
    let customer = handler.register(command).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<LoginCommand>,
) -> AppResult<Json<AuthTokens>> {
    let handler = AuthHandler::new(state.pool, state.cache, state.tokens);
    Ok(Json(handler.login(command).await?))
}

/// POST /auth/refresh
async fn refresh(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<RefreshTokenCommand>,
) -> AppResult<Json<AuthTokens>> {
    let handler = AuthHandler::new(state.pool, state.cache, state.tokens);
    Ok(Json(handler.refresh(command)?))
}

// =========================================================================
// Transactions
// =========================================================================

/// POST /transactions
async fn create_transaction(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(command): ApiJson<CreateTransactionCommand>,
) -> AppResult<(StatusCode, Json<CreateTransactionResult>)> {
    let handler = TransactionHandler::new(state.pool, state.cache);
    let result = handler.execute(command, &context).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// GET /transactions/contract/:contract_number
async fn get_transaction_by_contract(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
) -> AppResult<Json<Transaction>> {
    let handler = TransactionHandler::new(state.pool, state.cache);
    Ok(Json(handler.find_by_contract_number(&contract_number).await?))
}

/// GET /customers/:customer_id/transactions
async fn get_customer_transactions(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<Transaction>>> {
    let handler = TransactionHandler::new(state.pool, state.cache);
    Ok(Json(handler.list_for_customer(customer_id).await?))
}

/// GET /customers/me/transactions
async fn get_current_customer_transactions(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthenticatedCustomer>,
) -> AppResult<Json<Vec<Transaction>>> {
    let handler = TransactionHandler::new(state.pool, state.cache);
    Ok(Json(handler.list_for_customer(customer.customer_id).await?))
}

// =========================================================================
// Credit limits
// =========================================================================

/// POST /credit-limits
async fn set_credit_limit(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<SetCreditLimitCommand>,
) -> AppResult<(StatusCode, Json<CreditLimit>)> {
    let handler = CreditLimitHandler::new(state.pool, state.cache);
    let credit_limit = handler.set(command).await?;
    Ok((StatusCode::CREATED, Json(credit_limit)))
}

/// GET /customers/:customer_id/credit-limits
async fn get_customer_credit_limits(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<Uuid>,
) -> AppResult<Json<Vec<CreditLimit>>> {
    let handler = CreditLimitHandler::new(state.pool, state.cache);
    Ok(Json(handler.list(customer_id).await?))
}

/// GET /customers/:customer_id/credit-limits/:tenor_months
///
/// The tenor arrives as text so a non-integer is a 400 like any other bad
/// tenor.
async fn get_customer_credit_limit(
    State(state): State<AppState>,
    ApiPath((customer_id, tenor_months)): ApiPath<(Uuid, String)>,
) -> AppResult<Json<CreditLimit>> {
    let tenor: Tenor = tenor_months.parse()?;
    let handler = CreditLimitHandler::new(state.pool, state.cache);
    Ok(Json(handler.get(customer_id, tenor).await?))
}

// =========================================================================
// Customers
// =========================================================================

/// POST /customers
async fn create_customer(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<RegisterCustomerCommand>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let handler = CustomerHandler::new(state.pool, state.cache);
    let customer = handler.register(command).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/me
async fn get_current_customer(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthenticatedCustomer>,
) -> AppResult<Json<Customer>> {
    let handler = CustomerHandler::new(state.pool, state.cache);
    Ok(Json(handler.find_by_id(customer.customer_id).await?))
}

/// GET /customers/:customer_id
async fn get_customer(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<Uuid>,
) -> AppResult<Json<Customer>> {
    let handler = CustomerHandler::new(state.pool, state.cache);
    Ok(Json(handler.find_by_id(customer_id).await?))
}

/// GET /customers/nik/:nik
async fn get_customer_by_nik(
    State(state): State<AppState>,
    ApiPath(nik): ApiPath<String>,
) -> AppResult<Json<Customer>> {
    let handler = CustomerHandler::new(state.pool, state.cache);
    Ok(Json(handler.find_by_nik(&nik).await?))
}
