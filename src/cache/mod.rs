//! Cache module
//!
//! Best-effort key/value side channel in front of the store. The store is
//! always the source of truth: every failure in here degrades to a miss.

mod memory;
mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Cache backend errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Key/value store with expiring entries.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value; `Ok(None)` on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Increment a fixed-window counter.
    ///
    /// Returns the count after incrementing and the time left until the
    /// window's key expires.
    async fn increment(&self, key: &str, window: Duration) -> Result<(i64, Duration), CacheError>;
}

/// Typed JSON read-through / write-through helpers over a [`CacheStore`].
///
/// Nothing here returns an error: backend failures and undecodable entries
/// are logged and treated as misses.
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Underlying store (used by the rate limiter's counters)
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read and decode an entry.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::trace!(key = %key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt cache entry, falling back to store");
                self.evict(key).await;
                None
            }
        }
    }

    /// Encode and store an entry with the configured expiry.
    pub async fn write<T: Serialize>(&self, key: &str, value: &T) {
        self.write_for(key, value, self.ttl).await
    }

    /// Encode and store an entry with an explicit expiry.
    pub async fn write_for<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        if let Err(e) = self.store.set(key, &raw, ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    pub async fn evict(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Cache delete failed");
        }
    }
}
