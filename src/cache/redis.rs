//! Redis cache backend.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;
use tracing::info;

use super::{CacheError, CacheStore};

/// Redis-backed cache.
///
/// The connection manager reconnects on its own; each call clones it,
/// which only clones a handle.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!(url = %url, "Connected to Redis cache");

        Ok(Self { conn })
    }
}

/// Redis expiries are whole seconds; never ask for zero.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl_seconds(ttl)).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<(i64, Duration), CacheError> {
        let mut conn = self.conn.clone();
        let seconds = ttl_seconds(window) as i64;

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1i64)
            .expire(key, seconds)
            .ignore()
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        // TTL is -1/-2 when the key has no expiry or vanished in between.
        let remaining = if ttl > 0 { ttl as u64 } else { seconds as u64 };
        Ok((count, Duration::from_secs(remaining)))
    }
}
