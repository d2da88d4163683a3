//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use multifinance_api::api::{build_router, AppState};
use multifinance_api::auth::TokenService;
use multifinance_api::cache::{CacheAside, CacheError, CacheStore, MemoryCache};
use multifinance_api::Config;

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

/// Configuration with an in-process cache and the given per-window limit.
pub fn test_config(rate_limit: i64) -> Config {
    let rate_limit = rate_limit.to_string();
    Config::from_lookup(|key| {
        let value = match key {
            "DATABASE_URL" => "postgres://localhost/unused",
            "CACHE_BACKEND" => "memory",
            "JWT_SECRET" => ACCESS_SECRET,
            "JWT_REFRESH_SECRET" => REFRESH_SECRET,
            "RATE_LIMIT_PER_SECOND" => rate_limit.as_str(),
            // Wide window so a slow test run does not roll it over.
            "RATE_LIMIT_WINDOW_SECONDS" => "60",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config must load")
}

pub fn memory_cache() -> CacheAside {
    CacheAside::new(Arc::new(MemoryCache::new()), Duration::from_secs(60))
}

/// Cache backend that is down: every call fails.
pub struct UnreachableCache;

#[async_trait]
impl CacheStore for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Backend("unreachable".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("unreachable".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("unreachable".to_string()))
    }

    async fn increment(&self, _key: &str, _window: Duration) -> Result<(i64, Duration), CacheError> {
        Err(CacheError::Backend("unreachable".to_string()))
    }
}

pub fn unreachable_cache() -> CacheAside {
    CacheAside::new(Arc::new(UnreachableCache), Duration::from_secs(60))
}

/// State over a pool that never connects. Good for every request that is
/// rejected before touching the database.
pub fn lazy_state(rate_limit: i64) -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .expect("lazy pool");
    let config = test_config(rate_limit);
    let tokens = TokenService::from_config(&config);
    AppState::new(pool, memory_cache(), tokens, config)
}

pub fn lazy_app(rate_limit: i64) -> (Router, AppState) {
    let state = lazy_state(rate_limit);
    (build_router(state.clone()), state)
}

pub fn bearer(state: &AppState, customer_id: Uuid) -> String {
    let pair = state
        .tokens
        .issue(customer_id, "3201010101900001")
        .expect("issue token");
    format!("Bearer {}", pair.access_token)
}

/// Connect to `DATABASE_URL` and make sure the schema exists.
///
/// Tests isolate themselves with fresh ids instead of truncating, so they
/// can run against a shared database.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    (&pool)
        .execute(include_str!("../../migrations/0001_init.sql"))
        .await
        .expect("Failed to apply schema");

    pool
}

/// A NIK nobody else in the database has.
pub fn unique_nik() -> String {
    format!("{:016}", Uuid::new_v4().as_u128() % 10u128.pow(16))
}
