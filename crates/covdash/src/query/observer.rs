use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::client::QueryClient;
use super::error::QueryError;
use super::key::QueryKey;
use super::state::QueryState;
use crate::api::AbortController;

/// A single query observer bound to one key at a time.
///
/// Changing the key aborts the previous request and immediately publishes a
/// loading state with no data, so a consumer never sees the old key's result
/// under the new key. Only the most recently started request may publish.
pub struct Query<T> {
    client: Arc<QueryClient>,
    state: Arc<watch::Sender<QueryState<T>>>,
    controller: Mutex<Option<AbortController>>,
}

impl<T: Send + Sync + 'static> Query<T> {
    pub fn new(client: Arc<QueryClient>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            client,
            state: Arc::new(state),
            controller: Mutex::new(None),
        }
    }

    /// Receiver notified on every published state change.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }

    /// Point the observer at `key`.
    ///
    /// Does nothing if `key` is already current and did not fail; returns the
    /// handle of the spawned request otherwise.
    pub fn set_key<F, Fut>(&self, key: QueryKey, fetcher: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        {
            let current = self.state.borrow();
            if current.key.as_ref() == Some(&key) && !current.is_error() {
                return None;
            }
        }
        Some(self.fetch(key, fetcher))
    }

    /// Start a request for `key` unconditionally, superseding any in-flight one.
    pub fn fetch<F, Fut>(&self, key: QueryKey, fetcher: F) -> JoinHandle<()>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, QueryError>> + Send + 'static,
    {
        let controller = AbortController::new();
        let signal = controller.signal();
        let previous = self
            .controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(controller);
        if let Some(previous) = previous {
            previous.abort();
        }

        let mut generation = 0;
        self.state.send_modify(|state| {
            generation = state.generation + 1;
            *state = QueryState::loading(key.clone(), generation);
        });

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let result = client.fetch_with_signal(&key, Some(&signal), fetcher).await;
            if matches!(result, Err(QueryError::Aborted)) {
                tracing::debug!(%key, "query aborted");
                return;
            }

            let applied = state.send_if_modified(|current| {
                if current.generation != generation {
                    return false;
                }
                *current = QueryState::settled(key.clone(), generation, result);
                true
            });
            if !applied {
                tracing::debug!(%key, generation, "discarding superseded result");
            }
        })
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        let controller = self
            .controller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(controller) = controller {
            controller.abort();
        }
    }
}
