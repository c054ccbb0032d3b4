//! One fetch function per backend resource, plus the query key that
//! identifies it.
//!
//! GraphQL fetchers send a fixed document and unwrap the resource from a
//! query-specific path under `data`. Missing path segments resolve to `None`
//! or an empty list; only transport, status and GraphQL errors fail.

pub mod branch_contents;
pub mod commits;
pub mod flags;
pub mod plan;
pub mod providers;
pub mod pulls;
pub mod repo;
pub mod users;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::api::get_path;
use crate::format::paged::lenient_elements;
use crate::query::{PageCursor, PageInfo, QueryError, QueryKey};

/// Page size of cursor-paginated listings.
pub const PAGE_SIZE: u32 = 20;

/// Route parameters identifying one repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub provider: String,
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(provider: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// `[resource, provider, owner, repo]`
    pub(crate) fn key(&self, resource: &str) -> QueryKey {
        QueryKey::new(resource)
            .with(&self.provider)
            .with(&self.owner)
            .with(&self.repo)
    }
}

/// Commit or pull author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// Coverage totals of a report.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Totals {
    pub coverage: Option<f64>,
}

/// Decode the value at `path`, treating an absent or null value as `None`.
pub(crate) fn extract<T: DeserializeOwned>(
    envelope: &Value,
    path: &[&str],
) -> Result<Option<T>, QueryError> {
    get_path(envelope, path)
        .map(T::deserialize)
        .transpose()
        .map_err(QueryError::from)
}

/// Connection arguments for one page: `first`/`after` going forward,
/// `last`/`before` going backward.
pub(crate) fn page_arguments(cursor: Option<&PageCursor>, page_size: u32) -> Value {
    match cursor {
        None => json!({ "first": page_size }),
        Some(PageCursor::After(after)) => json!({ "first": page_size, "after": after }),
        Some(PageCursor::Before(before)) => json!({ "last": page_size, "before": before }),
    }
}

/// Merge `arguments` into the top level of `variables`.
pub(crate) fn with_arguments(mut variables: Value, arguments: Value) -> Value {
    if let (Some(variables), Value::Object(arguments)) = (variables.as_object_mut(), arguments) {
        variables.extend(arguments);
    }
    variables
}

/// Unwrap a relay-style connection (`edges[].node` plus `pageInfo`) at `path`.
///
/// Null or malformed nodes become `None` so a single bad record does not
/// drop the page.
pub(crate) fn extract_connection<T: DeserializeOwned>(
    envelope: &Value,
    path: &[&str],
) -> (Vec<Option<T>>, PageInfo) {
    let Some(connection) = get_path(envelope, path) else {
        return (Vec::new(), PageInfo::default());
    };

    let nodes: Vec<Value> = connection
        .get("edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .map(|edge| edge.get("node").cloned().unwrap_or(Value::Null))
                .collect()
        })
        .unwrap_or_default();

    let page_info = connection
        .get("pageInfo")
        .and_then(|info| PageInfo::deserialize(info).ok())
        .unwrap_or_default();

    (lenient_elements(&Value::Array(nodes)), page_info)
}
