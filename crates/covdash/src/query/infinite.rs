use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;

use super::client::QueryClient;
use super::error::QueryError;
use super::key::QueryKey;

/// Cursor information returned alongside each page of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
}

/// One fetched page.
#[derive(Debug, Clone)]
pub struct PageResult<P> {
    pub data: P,
    pub page_info: PageInfo,
}

/// Position of a page relative to one already loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageCursor {
    /// The page following `endCursor`.
    After(String),
    /// The page preceding `startCursor`.
    Before(String),
}

impl PageCursor {
    fn key_parts(&self) -> (&'static str, &str) {
        match self {
            Self::After(cursor) => ("after", cursor),
            Self::Before(cursor) => ("before", cursor),
        }
    }
}

struct LoadedPage<P> {
    cursor: Option<PageCursor>,
    result: Arc<PageResult<P>>,
}

type PageFuture<P> = Pin<Box<dyn Future<Output = Result<PageResult<P>, QueryError>> + Send>>;
type PageFetcher<P> = Arc<dyn Fn(Option<PageCursor>) -> PageFuture<P> + Send + Sync>;

/// Cursor-paginated query that accumulates pages in order.
///
/// A cursor is fetched at most once while its page is held, so loading more
/// never duplicates a page.
pub struct InfiniteQuery<P> {
    client: Arc<QueryClient>,
    key: QueryKey,
    fetch_page: PageFetcher<P>,
    pages: Mutex<VecDeque<LoadedPage<P>>>,
}

impl<P: Send + Sync + 'static> InfiniteQuery<P> {
    pub fn new<F, Fut>(client: Arc<QueryClient>, key: QueryKey, fetch_page: F) -> Self
    where
        F: Fn(Option<PageCursor>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PageResult<P>, QueryError>> + Send + 'static,
    {
        let fetch_page: PageFetcher<P> = Arc::new(move |cursor| Box::pin(fetch_page(cursor)));
        Self {
            client,
            key,
            fetch_page,
            pages: Mutex::new(VecDeque::new()),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Load the first page if nothing has been loaded yet.
    pub async fn fetch_first_page(&self) -> Result<(), QueryError> {
        let mut pages = self.pages.lock().await;
        if pages.is_empty() {
            let result = self.load(None).await?;
            pages.push_back(LoadedPage {
                cursor: None,
                result,
            });
        }
        Ok(())
    }

    /// Append the page after the last loaded one.
    ///
    /// Returns `Ok(false)` when there is no next page.
    pub async fn fetch_next_page(&self) -> Result<bool, QueryError> {
        let mut pages = self.pages.lock().await;
        let cursor = match pages.back() {
            None => None,
            Some(last) => {
                let info = &last.result.page_info;
                match (&info.end_cursor, info.has_next_page) {
                    (Some(cursor), true) => Some(PageCursor::After(cursor.clone())),
                    _ => return Ok(false),
                }
            }
        };
        if cursor.is_some() && pages.iter().any(|p| p.cursor == cursor) {
            tracing::debug!(key = %self.key, ?cursor, "page already loaded");
            return Ok(false);
        }

        let result = self.load(cursor.clone()).await?;
        pages.push_back(LoadedPage { cursor, result });
        Ok(true)
    }

    /// Prepend the page before the first loaded one.
    ///
    /// Returns `Ok(false)` when there is no previous page.
    pub async fn fetch_previous_page(&self) -> Result<bool, QueryError> {
        let mut pages = self.pages.lock().await;
        let Some(first) = pages.front() else {
            return Ok(false);
        };
        let info = &first.result.page_info;
        let cursor = match (&info.start_cursor, info.has_previous_page) {
            (Some(cursor), true) => Some(PageCursor::Before(cursor.clone())),
            _ => return Ok(false),
        };
        if pages.iter().any(|p| p.cursor == cursor) {
            tracing::debug!(key = %self.key, ?cursor, "page already loaded");
            return Ok(false);
        }

        let result = self.load(cursor.clone()).await?;
        pages.push_front(LoadedPage { cursor, result });
        Ok(true)
    }

    pub async fn has_next_page(&self) -> bool {
        let pages = self.pages.lock().await;
        pages.back().is_some_and(|p| {
            p.result.page_info.has_next_page && p.result.page_info.end_cursor.is_some()
        })
    }

    pub async fn has_previous_page(&self) -> bool {
        let pages = self.pages.lock().await;
        pages.front().is_some_and(|p| {
            p.result.page_info.has_previous_page && p.result.page_info.start_cursor.is_some()
        })
    }

    /// Loaded pages in display order.
    pub async fn pages(&self) -> Vec<Arc<PageResult<P>>> {
        let pages = self.pages.lock().await;
        pages.iter().map(|p| Arc::clone(&p.result)).collect()
    }

    async fn load(&self, cursor: Option<PageCursor>) -> Result<Arc<PageResult<P>>, QueryError> {
        let key = match &cursor {
            None => self.key.page(None),
            Some(cursor) => {
                let (direction, value) = cursor.key_parts();
                self.key.page(Some(direction)).with(value)
            }
        };
        let fetch_page = Arc::clone(&self.fetch_page);
        self.client.fetch(&key, move || fetch_page(cursor)).await
    }
}

impl<P: Clone + Send + Sync + 'static> InfiniteQuery<P> {
    /// Clone the data of every loaded page.
    pub async fn page_data(&self) -> Vec<P> {
        let pages = self.pages.lock().await;
        pages.iter().map(|p| p.result.data.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn numbered_pages(
        calls: Arc<AtomicUsize>,
    ) -> impl Fn(Option<PageCursor>) -> std::future::Ready<Result<PageResult<Vec<u32>>, QueryError>>
    + Send
    + Sync
    + 'static {
        move |cursor| {
            calls.fetch_add(1, Ordering::SeqCst);
            let index: u32 = match &cursor {
                None => 0,
                Some(PageCursor::After(c)) => c.parse::<u32>().map_or(0, |i| i + 1),
                Some(PageCursor::Before(c)) => c.parse::<u32>().map_or(0, |i| i.saturating_sub(1)),
            };
            std::future::ready(Ok(PageResult {
                data: vec![index * 10, index * 10 + 1],
                page_info: PageInfo {
                    has_next_page: index < 2,
                    end_cursor: Some(index.to_string()),
                    has_previous_page: index > 0,
                    start_cursor: Some(index.to_string()),
                },
            }))
        }
    }

    #[tokio::test]
    async fn next_pages_accumulate_until_exhausted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let query = InfiniteQuery::new(
            Arc::new(QueryClient::default()),
            QueryKey::new("Commits").with("gh"),
            numbered_pages(Arc::clone(&calls)),
        );

        query.fetch_first_page().await.unwrap();
        assert!(query.fetch_next_page().await.unwrap());
        assert!(query.fetch_next_page().await.unwrap());
        assert!(!query.fetch_next_page().await.unwrap());
        assert!(!query.has_next_page().await);

        let data: Vec<u32> = query.page_data().await.into_iter().flatten().collect();
        assert_eq!(data, vec![0, 1, 10, 11, 20, 21]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_page_is_loaded_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let query = InfiniteQuery::new(
            Arc::new(QueryClient::default()),
            QueryKey::new("Commits").with("gh"),
            numbered_pages(Arc::clone(&calls)),
        );
        query.fetch_first_page().await.unwrap();
        query.fetch_first_page().await.unwrap();
        assert_eq!(query.pages().await.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_load_more_does_not_duplicate_pages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let query = InfiniteQuery::new(
            Arc::new(QueryClient::default()),
            QueryKey::new("Pulls").with("gh"),
            numbered_pages(Arc::clone(&calls)),
        );
        query.fetch_first_page().await.unwrap();

        let (a, b) = tokio::join!(query.fetch_next_page(), query.fetch_next_page());
        assert!(a.unwrap());
        assert!(b.unwrap());
        let pages = query.page_data().await;
        assert_eq!(pages, vec![vec![0, 1], vec![10, 11], vec![20, 21]]);
    }

    #[tokio::test]
    async fn previous_page_is_prepended() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = numbered_pages(Arc::clone(&calls));
        let query = InfiniteQuery::new(
            Arc::new(QueryClient::default()),
            QueryKey::new("Commits").with("gh"),
            move |cursor: Option<PageCursor>| {
                fetch(cursor.or_else(|| Some(PageCursor::After("1".to_string()))))
            },
        );

        query.fetch_first_page().await.unwrap();
        assert!(query.has_previous_page().await);
        assert!(query.fetch_previous_page().await.unwrap());
        let data = query.page_data().await;
        assert_eq!(data, vec![vec![10, 11], vec![20, 21]]);
    }

    #[tokio::test]
    async fn both_directions_from_the_same_cursor_are_distinct_pages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch = numbered_pages(Arc::clone(&calls));
        let query = InfiniteQuery::new(
            Arc::new(QueryClient::default()),
            QueryKey::new("Commits").with("gh"),
            move |cursor: Option<PageCursor>| {
                fetch(cursor.or_else(|| Some(PageCursor::After("0".to_string()))))
            },
        );

        // Page 1 reports "1" as both its start and end cursor.
        query.fetch_first_page().await.unwrap();
        assert!(query.fetch_previous_page().await.unwrap());
        assert!(query.fetch_next_page().await.unwrap());
        assert!(!query.has_previous_page().await);

        let data = query.page_data().await;
        assert_eq!(data, vec![vec![0, 1], vec![10, 11], vec![20, 21]]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_leave_loaded_pages_untouched() {
        let query = InfiniteQuery::new(
            Arc::new(QueryClient::default()),
            QueryKey::new("Commits").with("gh"),
            |cursor: Option<PageCursor>| async move {
                match cursor {
                    None => Ok(PageResult {
                        data: 1u32,
                        page_info: PageInfo {
                            has_next_page: true,
                            end_cursor: Some("next".to_string()),
                            ..PageInfo::default()
                        },
                    }),
                    Some(_) => Err(QueryError::Transport {
                        message: "reset".to_string(),
                    }),
                }
            },
        );
        query.fetch_first_page().await.unwrap();
        assert!(query.fetch_next_page().await.is_err());
        assert_eq!(query.page_data().await, vec![1]);
        assert!(query.has_next_page().await);
    }
}
