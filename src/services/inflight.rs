use crate::cache::CacheKey;
use crate::error::{MapError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type SharedCall = Shared<BoxFuture<'static, Result<Value>>>;

/// Coalesces concurrent calls that share a cache key into one network request.
///
/// Each request runs on a spawned task that removes its entry when it
/// resolves, so a caller arriving afterwards always starts a fresh call.
/// Dropping waiters never cancels the request. Must be called within a tokio
/// runtime.
#[derive(Default)]
pub struct InflightRequests {
    pending: Arc<Mutex<HashMap<String, SharedCall>>>,
}

impl InflightRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run<F>(&self, key: &CacheKey, make_call: F) -> Result<Value>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Value>>,
    {
        let shared = {
            let mut pending = lock(&self.pending);
            match pending.get(key.as_str()) {
                Some(existing) => {
                    tracing::debug!("Joining in-flight request: {}", key);
                    existing.clone()
                }
                None => {
                    let registry = Arc::clone(&self.pending);
                    let owned_key = key.as_str().to_string();
                    let call = make_call();
                    // Driven by its own task so it finishes and deregisters
                    // even when every waiter has gone away.
                    let task = tokio::spawn(async move {
                        let result = call.await;
                        lock(&registry).remove(&owned_key);
                        result
                    });
                    let shared = async move {
                        task.await.unwrap_or_else(|e| {
                            Err(MapError::Transport(format!("request task failed: {}", e)))
                        })
                    }
                    .boxed()
                    .shared();
                    pending.insert(key.as_str().to_string(), shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }
}

fn lock(map: &Mutex<HashMap<String, SharedCall>>) -> MutexGuard<'_, HashMap<String, SharedCall>> {
    // The map holds no invariants a panic could break.
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(name: &str) -> CacheKey {
        CacheKey::builder("test").param("name", name).build()
    }

    #[tokio::test]
    async fn concurrent_identical_calls_share_one_request() {
        let inflight = InflightRequests::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = || {
            let calls = Arc::clone(&calls);
            move || {
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, MapError>(json!("done"))
                }
                .boxed()
            }
        };

        let k = key("same");
        let (a, b, c) = tokio::join!(
            inflight.run(&k, make()),
            inflight.run(&k, make()),
            inflight.run(&k, make()),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), json!("done"));
        assert_eq!(b.unwrap(), json!("done"));
        assert_eq!(c.unwrap(), json!("done"));
        assert_eq!(inflight.in_flight(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_run_independently() {
        let inflight = InflightRequests::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counted = |value: &'static str| {
            let calls = Arc::clone(&calls);
            move || {
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, MapError>(json!(value))
                }
                .boxed()
            }
        };

        let (ka, kb) = (key("a"), key("b"));
        let (a, b) = tokio::join!(
            inflight.run(&ka, counted("a")),
            inflight.run(&kb, counted("b")),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(a.unwrap(), json!("a"));
        assert_eq!(b.unwrap(), json!("b"));
    }

    #[tokio::test]
    async fn errors_are_shared_and_not_retained() {
        let inflight = InflightRequests::new();
        let k = key("err");

        let result = inflight
            .run(&k, || async { Err::<Value, _>(MapError::Timeout) }.boxed())
            .await;
        assert_eq!(result, Err(MapError::Timeout));
        assert_eq!(inflight.in_flight(), 0);

        // A later call starts over
        let retry = inflight.run(&k, || async { Ok::<_, MapError>(json!(1)) }.boxed()).await;
        assert_eq!(retry, Ok(json!(1)));
    }

    #[tokio::test]
    async fn abandoned_request_runs_to_completion() {
        let inflight = InflightRequests::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let k = key("abandoned");

        let counter = Arc::clone(&finished);
        let waiter = inflight.run(&k, move || {
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, MapError>(json!("late"))
            }
            .boxed()
        });

        // The only waiter gives up before the response arrives
        assert!(tokio::time::timeout(Duration::from_millis(10), waiter)
            .await
            .is_err());
        assert_eq!(inflight.in_flight(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
        assert_eq!(inflight.in_flight(), 0);
    }
}
