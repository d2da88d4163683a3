//! In-process cache backend, for single-node deployments and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CacheError, CacheStore};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Expired entries are reclaimed after this many writes.
const SWEEP_EVERY: u32 = 64;

#[derive(Default)]
struct Entries {
    map: HashMap<String, Entry>,
    writes: u32,
}

impl Entries {
    /// Count a write, dropping every expired entry once per `SWEEP_EVERY`.
    /// Rate-limit window keys are never read again after their window.
    fn note_write(&mut self, now: Instant) {
        self.writes += 1;
        if self.writes >= SWEEP_EVERY {
            self.writes = 0;
            self.map.retain(|_, entry| entry.is_live(now));
        }
    }
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<Entries>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.map.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.note_write(now);
        entries.map.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().await.map.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<(i64, Duration), CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.note_write(now);

        let entry = entries
            .map
            .entry(key.to_string())
            .and_modify(|entry| {
                if !entry.is_live(now) {
                    entry.value = "0".to_string();
                    entry.expires_at = now + window;
                }
            })
            .or_insert_with(|| Entry {
                value: "0".to_string(),
                expires_at: now + window,
            });

        let count = entry
            .value
            .parse::<i64>()
            .map_err(|_| CacheError::Backend(format!("counter at {} is not an integer", key)))?
            + 1;
        entry.value = count.to_string();

        Ok((count, entry.expires_at.saturating_duration_since(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new();

        cache.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_increment_counts_within_window() {
        let cache = MemoryCache::new();
        let window = Duration::from_secs(1);

        assert_eq!(cache.increment("rl", window).await.unwrap().0, 1);
        assert_eq!(cache.increment("rl", window).await.unwrap().0, 2);
        let (count, remaining) = cache.increment("rl", window).await.unwrap();
        assert_eq!(count, 3);
        assert!(remaining <= window);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.increment("rl", window).await.unwrap().0, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_window_keys_are_reclaimed() {
        let cache = MemoryCache::new();
        let window = Duration::from_secs(1);

        for i in 0..10_000 {
            let key = format!("rate_limit:10.0.0.1:{}", i);
            assert_eq!(cache.increment(&key, window).await.unwrap().0, 1);
            tokio::time::advance(window).await;
        }

        let retained = cache.entries.lock().await.map.len();
        assert!(retained <= SWEEP_EVERY as usize, "retained {}", retained);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_live_entries() {
        let cache = MemoryCache::new();
        cache.set("customer:1", "{}", Duration::from_secs(3600)).await.unwrap();

        for i in 0..(SWEEP_EVERY * 2) {
            cache
                .set(&format!("short:{}", i), "v", Duration::from_secs(1))
                .await
                .unwrap();
            tokio::time::advance(Duration::from_secs(2)).await;
        }

        assert_eq!(cache.get("customer:1").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_increment_rejects_non_numeric_value() {
        let cache = MemoryCache::new();
        cache.set("rl", "abc", Duration::from_secs(60)).await.unwrap();
        assert!(cache.increment("rl", Duration::from_secs(1)).await.is_err());
    }
}
