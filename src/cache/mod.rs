pub mod key;
pub mod memory;

pub use key::CacheKey;
pub use memory::MemoryResponseCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Time-boxed memoization of map responses.
///
/// Values are stored as JSON so one cache can hold every response type.
/// Implementations must never return an entry older than their TTL.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Value>;
    async fn set(&self, key: &CacheKey, value: Value);
    async fn clear(&self);
    async fn stats(&self) -> CacheStats;
    fn backend_name(&self) -> &'static str;
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_seconds: u64,
}

impl CacheStats {
    pub fn new(entries: u64, hits: u64, misses: u64, ttl_seconds: u64) -> Self {
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            entries,
            hits,
            misses,
            hit_rate,
            ttl_seconds,
        }
    }
}
