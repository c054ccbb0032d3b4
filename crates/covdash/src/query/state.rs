use std::sync::Arc;

use super::error::QueryError;
use super::key::QueryKey;

/// Lifecycle of a query observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// No key has been set yet.
    Idle,
    /// A request for the current key is in flight and no result is available.
    Loading,
    Success,
    Error,
}

/// Snapshot of a query observer, as seen by the rendering layer.
#[derive(Debug)]
pub struct QueryState<T> {
    /// Identity tuple this state belongs to.
    pub key: Option<QueryKey>,
    pub status: QueryStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    /// Monotonic request counter; only the latest request may settle.
    pub(crate) generation: u64,
}

impl<T> QueryState<T> {
    pub(crate) fn loading(key: QueryKey, generation: u64) -> Self {
        Self {
            key: Some(key),
            status: QueryStatus::Loading,
            data: None,
            error: None,
            is_fetching: true,
            generation,
        }
    }

    pub(crate) fn settled(
        key: QueryKey,
        generation: u64,
        result: Result<Arc<T>, QueryError>,
    ) -> Self {
        let (status, data, error) = match result {
            Ok(data) => (QueryStatus::Success, Some(data), None),
            Err(error) => (QueryStatus::Error, None, Some(error)),
        };
        Self {
            key: Some(key),
            status,
            data,
            error,
            is_fetching: false,
            generation,
        }
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            key: None,
            status: QueryStatus::Idle,
            data: None,
            error: None,
            is_fetching: false,
            generation: 0,
        }
    }
}

// Manual impl: `T` itself need not be Clone, data is shared via Arc.
impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            generation: self.generation,
        }
    }
}
