//! API module
//!
//! HTTP API endpoints and middleware.

mod extract;
pub mod middleware;
pub mod routes;
mod state;

pub use state::AppState;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let protected = routes::protected_router().route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::auth_middleware,
    ));

    // Axum layers are applied in reverse order (last added = first executed)
    // Order: logging -> rate_limit -> auth -> handler
    let api_router = routes::public_router()
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    Router::new()
        // Health check (no auth)
        .route("/health", get(health_check))
        .nest("/api/v1", api_router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
