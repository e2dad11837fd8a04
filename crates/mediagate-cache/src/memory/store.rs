//! moka-backed in-process cache.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use tracing::debug;

use mediagate_core::config::cache::CacheConfig;
use mediagate_core::result::AppResult;
use mediagate_core::traits::cache::CacheProvider;

/// Stored value plus the instant it stops being valid.
///
/// moka only applies TTL cache-wide, while [`CacheProvider`] promises
/// a lifetime per entry. Carrying the deadline inside the entry closes
/// that gap; `get` treats a stale entry as a miss and evicts it.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    deadline: i64,
}

/// [`CacheProvider`] over a bounded moka cache.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    entries: Cache<String, Entry>,
}

impl MemoryCacheProvider {
    /// Build a cache sized from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(config.memory.max_capacity)
                .build(),
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match self.entries.get(key).await {
            Some(entry) if entry.deadline <= Utc::now().timestamp() => {
                self.entries.remove(key).await;
                debug!(key, "Dropped stale cache entry on read");
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        let entry = Entry {
            value: value.to_string(),
            deadline: Utc::now().timestamp() + ttl.as_secs() as i64,
        };
        self.entries.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mediagate_core::config::cache::MemoryCacheConfig;

    use super::*;

    fn cache() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&CacheConfig {
            default_ttl_seconds: 60,
            memory: MemoryCacheConfig { max_capacity: 64 },
        })
    }

    #[tokio::test]
    async fn live_entries_round_trip() {
        let cache = cache();
        cache
            .set("greeting", "hello", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            cache.get("greeting").await.unwrap(),
            Some("hello".to_string())
        );
    }

    #[tokio::test]
    async fn a_missing_key_is_none() {
        assert_eq!(cache().get("never-set").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_outlive_their_ttl_as_misses() {
        let cache = cache();
        cache
            .set("stale", "old", Duration::from_secs(0))
            .await
            .unwrap();

        assert_eq!(cache.get("stale").await.unwrap(), None);
    }

    #[tokio::test]
    async fn each_entry_keeps_its_own_ttl() {
        let cache = cache();
        cache
            .set("short", "gone", Duration::from_secs(0))
            .await
            .unwrap();
        cache
            .set("long", "kept", Duration::from_secs(120))
            .await
            .unwrap();

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap(), Some("kept".to_string()));
    }

    #[tokio::test]
    async fn deleted_entries_are_gone() {
        let cache = cache();
        cache
            .set("doomed", "value", Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("doomed").await.unwrap();

        assert_eq!(cache.get("doomed").await.unwrap(), None);
    }
}
