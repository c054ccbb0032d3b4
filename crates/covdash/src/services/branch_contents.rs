//! Directory listing of a branch head (`BranchContents`).

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{RepoRef, extract};
use crate::api::{AbortSignal, ApiClient, GraphQlRequest};
use crate::format::paged::lenient_list;
use crate::query::{QueryError, QueryKey};

const QUERY: &str = r#"
query BranchContents($name: String!, $repo: String!, $branch: String!, $path: String!, $filters: PathContentsFilters!) {
  owner(username: $name) {
    username
    repository(name: $repo) {
      branch(name: $branch) {
        head {
          pathContents(path: $path, filters: $filters) {
            ... on PathContents {
              results {
                __typename
                hits
                misses
                partials
                lines
                name
                path
                percentCovered
                ... on PathContentFile {
                  isCriticalFile
                }
              }
            }
            __typename
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContentsParams {
    pub repo: RepoRef,
    pub branch: String,
    pub path: String,
    /// `PathContentsFilters` input object, sent as-is.
    pub filters: Value,
}

/// Result of a `pathContents` lookup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PathContents {
    /// `PathContents`, or an error variant such as `MissingCoverage`.
    #[serde(rename = "__typename")]
    pub typename: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub results: Vec<Option<PathEntry>>,
}

/// A file or directory under the requested path.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathEntry {
    /// `PathContentFile` or `PathContentDir`.
    #[serde(rename = "__typename")]
    pub typename: String,
    pub name: String,
    pub path: Option<String>,
    pub hits: Option<u64>,
    pub misses: Option<u64>,
    pub partials: Option<u64>,
    pub lines: Option<u64>,
    pub percent_covered: Option<f64>,
    /// Only set for files.
    pub is_critical_file: Option<bool>,
}

impl PathEntry {
    pub fn is_file(&self) -> bool {
        self.typename == "PathContentFile"
    }
}

pub fn branch_contents_key(params: &BranchContentsParams) -> QueryKey {
    params
        .repo
        .key("BranchContents")
        .with(&params.branch)
        .with(&params.path)
        .with_json(&params.filters)
}

pub async fn fetch_branch_contents(
    api: &ApiClient,
    params: &BranchContentsParams,
    signal: Option<AbortSignal>,
) -> Result<Option<PathContents>, QueryError> {
    let envelope = api
        .graphql(
            GraphQlRequest::new(&params.repo.provider, QUERY)
                .variables(json!({
                    "name": params.repo.owner,
                    "repo": params.repo.repo,
                    "branch": params.branch,
                    "path": params.path,
                    "filters": params.filters,
                }))
                .signal(signal),
        )
        .await?;

    extract(
        &envelope,
        &["data", "owner", "repository", "branch", "head", "pathContents"],
    )
}
