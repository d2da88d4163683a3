//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Which cache backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            _ => Err(ConfigError::InvalidValue("CACHE_BACKEND")),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub cache_backend: CacheBackend,

    /// Only read when the backend is Redis
    pub redis_url: String,

    /// Expiry of cache-aside entries
    pub cache_ttl_seconds: u64,

    /// Signing secret for access tokens
    pub jwt_secret: String,

    /// Signing secret for refresh tokens
    pub jwt_refresh_secret: String,

    pub access_token_expiry_minutes: i64,

    pub refresh_token_expiry_days: i64,

    /// Rate limit: requests per window per client IP
    pub rate_limit_per_second: i64,

    pub rate_limit_window_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = var("HOST", "127.0.0.1");

        let port = var("PORT", "8080")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = var("ENVIRONMENT", "development");

        let cache_backend = var("CACHE_BACKEND", "redis").parse()?;

        let redis_url = var("REDIS_URL", "redis://127.0.0.1:6379");

        let cache_ttl_seconds = var("CACHE_TTL_SECONDS", "3600")
            .parse()
            .map_err(|_| ConfigError::InvalidValue("CACHE_TTL_SECONDS"))?;

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEnv("JWT_SECRET"))?;

        let jwt_refresh_secret = lookup("JWT_REFRESH_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEnv("JWT_REFRESH_SECRET"))?;

        let access_token_expiry_minutes = positive(
            var("ACCESS_TOKEN_EXPIRY_MINUTES", "15").parse().ok(),
            "ACCESS_TOKEN_EXPIRY_MINUTES",
        )?;

        let refresh_token_expiry_days = positive(
            var("REFRESH_TOKEN_EXPIRY_DAYS", "7").parse().ok(),
            "REFRESH_TOKEN_EXPIRY_DAYS",
        )?;

        let rate_limit_per_second = positive(
            var("RATE_LIMIT_PER_SECOND", "10").parse().ok(),
            "RATE_LIMIT_PER_SECOND",
        )?;

        let rate_limit_window_seconds = var("RATE_LIMIT_WINDOW_SECONDS", "1")
            .parse::<u64>()
            .ok()
            .filter(|w| *w > 0)
            .ok_or(ConfigError::InvalidValue("RATE_LIMIT_WINDOW_SECONDS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            cache_backend,
            redis_url,
            cache_ttl_seconds,
            jwt_secret,
            jwt_refresh_secret,
            access_token_expiry_minutes,
            refresh_token_expiry_days,
            rate_limit_per_second,
            rate_limit_window_seconds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }
}

fn positive(value: Option<i64>, key: &'static str) -> Result<i64, ConfigError> {
    value
        .filter(|v| *v > 0)
        .ok_or(ConfigError::InvalidValue(key))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
