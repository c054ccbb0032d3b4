//! Request de-duplication and result cache keyed by identity tuple.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;

use super::error::QueryError;
use super::key::QueryKey;
use crate::api::AbortSignal;

type SharedValue = Arc<dyn Any + Send + Sync>;
type SharedResult = Result<SharedValue, QueryError>;
type Slot = Arc<OnceCell<SharedResult>>;

/// Cache behaviour for a [`QueryClient`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// How long a successful result is served without refetching.
    /// Zero means every fetch goes to the network (after de-duplication).
    pub stale_time: Duration,
}

struct CacheEntry {
    value: SharedValue,
    fetched_at: Instant,
}

/// Shared query cache.
///
/// Concurrent fetches for the same [`QueryKey`] share one in-flight request:
/// the first caller's fetcher runs, every other caller awaits its result.
/// Failed results are handed to all waiters but never cached.
#[derive(Default)]
pub struct QueryClient {
    options: QueryOptions,
    inflight: Mutex<HashMap<QueryKey, Slot>>,
    cache: Mutex<HashMap<QueryKey, CacheEntry>>,
    requests_started: AtomicU64,
}

impl QueryClient {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Fetch `key`, joining an in-flight request for the same key if one exists.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, QueryError>>,
    {
        self.fetch_with_signal(key, None, fetcher).await
    }

    /// Like [`fetch`](Self::fetch), but stops waiting once `signal` fires.
    ///
    /// If this caller was the one running the shared request, dropping its
    /// future aborts the transport call; any remaining waiter takes over and
    /// issues the request again.
    pub async fn fetch_with_signal<T, F, Fut>(
        &self,
        key: &QueryKey,
        signal: Option<&AbortSignal>,
        fetcher: F,
    ) -> Result<Arc<T>, QueryError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, QueryError>>,
    {
        if let Some(value) = self.fresh_value(key) {
            tracing::debug!(%key, "serving fresh cached result");
            return downcast(value, key);
        }

        let slot = self.slot(key);
        let init = slot.get_or_init(|| async {
            self.requests_started.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%key, "starting request");
            fetcher().await.map(|v| Arc::new(v) as SharedValue)
        });

        let result = match signal {
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.aborted() => return Err(QueryError::Aborted),
                    result = init => result.clone(),
                }
            }
            None => init.await.clone(),
        };

        self.settle(key, &slot, &result);
        result.and_then(|value| downcast(value, key))
    }

    /// Last successful result for `key`, fresh or not.
    pub fn get_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let cache = lock(&self.cache);
        cache
            .get(key)
            .and_then(|entry| entry.value.clone().downcast::<T>().ok())
    }

    /// Seed or overwrite the cached result for `key`.
    pub fn set_query_data<T: Send + Sync + 'static>(&self, key: &QueryKey, data: T) {
        lock(&self.cache).insert(
            key.clone(),
            CacheEntry {
                value: Arc::new(data),
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop every cached result whose key starts with `prefix`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut cache = lock(&self.cache);
        let before = cache.len();
        cache.retain(|key, _| !key.starts_with(prefix));
        let removed = before - cache.len();
        if removed > 0 {
            tracing::debug!(%prefix, removed, "invalidated cached queries");
        }
        removed
    }

    /// Number of fetchers actually started (after de-duplication).
    pub fn requests_started(&self) -> u64 {
        self.requests_started.load(Ordering::Relaxed)
    }

    fn fresh_value(&self, key: &QueryKey) -> Option<SharedValue> {
        if self.options.stale_time.is_zero() {
            return None;
        }
        let cache = lock(&self.cache);
        cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.options.stale_time)
            .map(|entry| entry.value.clone())
    }

    fn slot(&self, key: &QueryKey) -> Slot {
        lock(&self.inflight).entry(key.clone()).or_default().clone()
    }

    /// Retire the in-flight slot once its result is known. Only the first
    /// waiter to get here does the bookkeeping.
    fn settle(&self, key: &QueryKey, slot: &Slot, result: &SharedResult) {
        {
            let mut inflight = lock(&self.inflight);
            let is_current = inflight.get(key).is_some_and(|s| Arc::ptr_eq(s, slot));
            if !is_current {
                return;
            }
            inflight.remove(key);
        }

        if let Ok(value) = result {
            lock(&self.cache).insert(
                key.clone(),
                CacheEntry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
    }
}

fn downcast<T: Send + Sync + 'static>(value: SharedValue, key: &QueryKey) -> Result<Arc<T>, QueryError> {
    value.downcast::<T>().map_err(|_| QueryError::TypeMismatch {
        key: key.to_string(),
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::api::AbortController;

    fn key(name: &str) -> QueryKey {
        QueryKey::new("GetRepo").with("gh").with("codecov").with(name)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_for_same_key_share_one_request() {
        let client = QueryClient::default();
        let calls = AtomicUsize::new(0);
        let fetcher = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, QueryError>("gazebo".to_string())
        };

        let k = key("gazebo");
        let (a, b, c) = tokio::join!(
            client.fetch(&k, fetcher),
            client.fetch(&k, fetcher),
            client.fetch(&k, fetcher),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.requests_started(), 1);
        let a = a.expect("first consumer");
        let b = b.expect("second consumer");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*c.expect("third consumer"), "gazebo");
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_do_not_share_requests() {
        let client = QueryClient::default();
        let (ka, kb) = (key("a"), key("b"));
        let (a, b) = tokio::join!(
            client.fetch(&ka, || async { Ok::<_, QueryError>(1u32) }),
            client.fetch(&kb, || async { Ok::<_, QueryError>(2u32) }),
        );
        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 2);
        assert_eq!(client.requests_started(), 2);
    }

    #[tokio::test]
    async fn sequential_fetches_refetch_when_stale_time_is_zero() {
        let client = QueryClient::default();
        let k = key("gazebo");
        client.fetch(&k, || async { Ok::<_, QueryError>(1u32) }).await.unwrap();
        let second = client.fetch(&k, || async { Ok::<_, QueryError>(2u32) }).await.unwrap();
        assert_eq!(*second, 2);
        assert_eq!(client.requests_started(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_results_are_served_from_cache() {
        let client = QueryClient::new(QueryOptions {
            stale_time: Duration::from_secs(60),
        });
        let k = key("gazebo");
        client.fetch(&k, || async { Ok::<_, QueryError>(1u32) }).await.unwrap();
        let cached = client.fetch(&k, || async { Ok::<_, QueryError>(2u32) }).await.unwrap();
        assert_eq!(*cached, 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        let refreshed = client.fetch(&k, || async { Ok::<_, QueryError>(3u32) }).await.unwrap();
        assert_eq!(*refreshed, 3);
    }

    #[tokio::test]
    async fn errors_are_shared_but_not_cached() {
        let client = QueryClient::default();
        let k = key("broken");
        let err = client
            .fetch(&k, || async {
                Err::<u32, _>(QueryError::Transport {
                    message: "down".to_string(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::Transport { .. }));
        assert!(client.get_query_data::<u32>(&k).is_none());

        let ok = client.fetch(&k, || async { Ok::<_, QueryError>(7u32) }).await.unwrap();
        assert_eq!(*ok, 7);
    }

    #[tokio::test]
    async fn invalidate_removes_matching_prefix() {
        let client = QueryClient::default();
        client.set_query_data(&key("a"), 1u32);
        client.set_query_data(&key("b"), 2u32);
        client.set_query_data(&QueryKey::new("users").with("gh"), 3u32);

        let removed = client.invalidate(&QueryKey::new("GetRepo").with("gh"));
        assert_eq!(removed, 2);
        assert!(client.get_query_data::<u32>(&key("a")).is_none());
        assert_eq!(
            client
                .get_query_data::<u32>(&QueryKey::new("users").with("gh"))
                .as_deref(),
            Some(&3)
        );
    }

    #[tokio::test]
    async fn type_mismatch_is_reported() {
        let client = QueryClient::new(QueryOptions {
            stale_time: Duration::from_secs(60),
        });
        let k = key("typed");
        client.set_query_data(&k, 1u32);
        let err = client
            .fetch(&k, || async { Ok::<_, QueryError>("x".to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::TypeMismatch { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_initializer_hands_request_to_remaining_waiter() {
        let client = QueryClient::default();
        let k = key("handoff");
        let controller = AbortController::new();
        let signal = controller.signal();
        let calls = AtomicUsize::new(0);
        let fetcher = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, QueryError>(5u32)
        };

        let aborting = async {
            let result = client.fetch_with_signal(&k, Some(&signal), fetcher).await;
            assert!(matches!(result, Err(QueryError::Aborted)));
        };
        let waiting = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let value = client.fetch(&k, fetcher).await.expect("waiter should succeed");
            assert_eq!(*value, 5);
        };
        let abort = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            controller.abort();
        };

        tokio::join!(aborting, waiting, abort);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
