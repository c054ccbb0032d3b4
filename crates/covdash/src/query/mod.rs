//! Query layer: request de-duplication, key-scoped observers and
//! cursor pagination on top of the API client.

mod client;
mod error;
mod infinite;
mod key;
mod observer;
mod state;

pub use client::{QueryClient, QueryOptions};
pub use error::QueryError;
pub use infinite::{InfiniteQuery, PageCursor, PageInfo, PageResult};
pub use key::QueryKey;
pub use observer::Query;
pub use state::{QueryState, QueryStatus};
