//! Covdash - the data layer of a code-coverage dashboard.
//!
//! The crate turns backend responses into display-ready rows:
//!
//! - [`api`] builds requests against the internal REST and GraphQL endpoints,
//!   attaches per-provider bearer tokens and normalizes key casing.
//! - [`query`] de-duplicates in-flight requests per identity tuple and makes
//!   "last request wins" an explicit, observable contract.
//! - [`services`] holds one fetch function per backend resource.
//! - [`navigation`] binds filter/sort/pagination state to a query string.
//! - [`format`] maps pages of entities into row descriptors.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use covdash::api::{ApiClient, ApiConfig, MemoryCredentialStore, Provider};
//! use covdash::format::commits::create_commits_table_data;
//! use covdash::query::QueryClient;
//! use covdash::format::PagedCollection;
//! use covdash::services::RepoRef;
//! use covdash::services::commits::{CommitsFilters, fetch_commits};
//!
//! let credentials = MemoryCredentialStore::new().with_token(Provider::GitHub, "token");
//! let api = ApiClient::new(&ApiConfig::default(), Arc::new(credentials))?;
//! let repo = RepoRef::new("gh", "codecov", "gazebo");
//! let page = fetch_commits(&api, &repo, &CommitsFilters::default(), None, None).await?;
//! let rows = create_commits_table_data(&PagedCollection::from_pages([page.data]));
//! ```

pub mod api;
pub mod format;
pub mod http;
pub mod navigation;
pub mod query;
pub mod services;
pub mod telemetry;

pub use api::{ApiClient, ApiConfig, ApiError, CredentialStore, MemoryCredentialStore, Provider};
pub use query::{InfiniteQuery, Query, QueryClient, QueryError, QueryKey, QueryState, QueryStatus};
