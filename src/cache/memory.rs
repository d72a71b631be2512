use crate::cache::{CacheKey, CacheStats, ResponseCache};
use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// In-memory response cache backed by moka with a fixed TTL.
/// Unbounded unless `max_capacity` is given. All methods are `&self`.
pub struct MemoryResponseCache {
    entries: Cache<String, Arc<CacheEntry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryResponseCache {
    pub fn new(ttl: Duration, max_capacity: Option<u64>) -> Self {
        let mut builder = Cache::builder().time_to_live(ttl);
        if let Some(capacity) = max_capacity {
            builder = builder.max_capacity(capacity);
        }

        MemoryResponseCache {
            entries: builder.build(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ResponseCache for MemoryResponseCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        match self.entries.get(key.as_str()).await {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    age_ms = entry.stored_at.elapsed().as_millis() as u64,
                    "Cache hit: {}",
                    key
                );
                Some(entry.value.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Cache miss: {}", key);
                None
            }
        }
    }

    async fn set(&self, key: &CacheKey, value: Value) {
        let entry = Arc::new(CacheEntry {
            value,
            stored_at: Instant::now(),
        });
        self.entries.insert(key.as_str().to_string(), entry).await;
        tracing::debug!("Cached response: {}", key);
    }

    async fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
        tracing::info!("Map response cache cleared");
    }

    async fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks().await;
        CacheStats::new(
            self.entries.entry_count(),
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.ttl.as_secs(),
        )
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(name: &str) -> CacheKey {
        CacheKey::builder("test").param("name", name).build()
    }

    #[tokio::test]
    async fn cache_miss() {
        let cache = MemoryResponseCache::new(Duration::from_secs(300), None);
        assert!(cache.get(&key("nonexistent")).await.is_none());
    }

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryResponseCache::new(Duration::from_secs(300), None);
        cache.set(&key("a"), json!({"places": [1, 2]})).await;

        let cached = cache.get(&key("a")).await.unwrap();
        assert_eq!(cached["places"], json!([1, 2]));
    }

    #[tokio::test]
    async fn set_overwrites() {
        let cache = MemoryResponseCache::new(Duration::from_secs(300), None);
        cache.set(&key("a"), json!(1)).await;
        cache.set(&key("a"), json!(2)).await;
        assert_eq!(cache.get(&key("a")).await, Some(json!(2)));
    }

    #[tokio::test]
    async fn clear_empties_cache() {
        let cache = MemoryResponseCache::new(Duration::from_secs(300), None);
        cache.set(&key("a"), json!(1)).await;
        cache.set(&key("b"), json!(2)).await;

        cache.clear().await;

        assert!(cache.get(&key("a")).await.is_none());
        assert!(cache.get(&key("b")).await.is_none());
        assert_eq!(cache.stats().await.entries, 0);
    }

    #[tokio::test]
    async fn stats_tracking() {
        let cache = MemoryResponseCache::new(Duration::from_secs(300), None);
        cache.set(&key("a"), json!(1)).await;

        // 1 miss
        cache.get(&key("missing")).await;
        // 2 hits
        cache.get(&key("a")).await;
        cache.get(&key("a")).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.ttl_seconds, 300);
        assert!((stats.hit_rate - 66.666).abs() < 1.0);
    }

    #[tokio::test]
    async fn backend_name_is_memory() {
        let cache = MemoryResponseCache::new(Duration::from_secs(300), None);
        assert_eq!(cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn ttl_expiry() {
        let cache = MemoryResponseCache::new(Duration::from_millis(200), None);
        cache.set(&key("a"), json!(1)).await;

        assert!(cache.get(&key("a")).await.is_some());

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(cache.get(&key("a")).await.is_none());
    }
}
