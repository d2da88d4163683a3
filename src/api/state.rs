//! Shared application state
//!
//! Every collaborator is built once in `main` and handed to the router;
//! handlers and middleware receive it through axum's `State`.

use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::cache::CacheAside;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cache: CacheAside,
    pub tokens: TokenService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, cache: CacheAside, tokens: TokenService, config: Config) -> Self {
        Self {
            pool,
            cache,
            tokens,
            config: Arc::new(config),
        }
    }
}
