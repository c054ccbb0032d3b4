//! Repository pull requests, cursor-paginated.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Author, PAGE_SIZE, RepoRef, extract_connection, page_arguments, with_arguments};
use crate::api::{AbortSignal, ApiClient, GraphQlRequest};
use crate::format::comparison::{BundleAnalysisReport, ComparisonResult};
use crate::format::paged::lenient_list;
use crate::query::{PageCursor, PageResult, QueryError, QueryKey};

const QUERY: &str = r#"
query GetPulls($owner: String!, $repo: String!, $orderingDirection: OrderingDirection, $filters: PullsSetFilters, $first: Int, $after: String, $last: Int, $before: String) {
  owner(username: $owner) {
    repository(name: $repo) {
      ... on Repository {
        pulls(orderingDirection: $orderingDirection, filters: $filters, first: $first, after: $after, last: $last, before: $before) {
          edges {
            node {
              pullId
              title
              state
              updatestamp
              author {
                username
                avatarUrl
              }
              head {
                bundleAnalysisReport {
                  __typename
                }
              }
              compareWithBase {
                __typename
                ... on Comparison {
                  patchTotals {
                    percentCovered
                  }
                }
              }
            }
          }
          pageInfo {
            hasNextPage
            endCursor
            hasPreviousPage
            startCursor
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullState {
    Open,
    Closed,
    Merged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderingDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullsFilters {
    /// Only pulls in one of these states; all states when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub state: Vec<PullState>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullHead {
    pub bundle_analysis_report: Option<BundleAnalysisReport>,
}

/// A pull request as listed on the pulls table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pull {
    pub pull_id: i64,
    pub title: Option<String>,
    pub state: Option<PullState>,
    pub updatestamp: Option<String>,
    pub author: Option<Author>,
    pub head: Option<PullHead>,
    pub compare_with_base: Option<ComparisonResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PullsPage {
    #[serde(default, deserialize_with = "lenient_list")]
    pub pulls: Vec<Option<Pull>>,
}

pub fn pulls_key(repo: &RepoRef, ordering: OrderingDirection, filters: &PullsFilters) -> QueryKey {
    let filters = serde_json::to_value(filters).unwrap_or_default();
    let ordering = serde_json::to_value(ordering).unwrap_or_default();
    repo.key("pulls").with_json(&ordering).with_json(&filters)
}

/// Fetch the page of pulls next to `cursor` (the first page when `None`).
pub async fn fetch_pulls(
    api: &ApiClient,
    repo: &RepoRef,
    ordering: OrderingDirection,
    filters: &PullsFilters,
    cursor: Option<PageCursor>,
    signal: Option<AbortSignal>,
) -> Result<PageResult<PullsPage>, QueryError> {
    let envelope = api
        .graphql(
            GraphQlRequest::new(&repo.provider, QUERY)
                .variables(with_arguments(
                    json!({
                        "owner": repo.owner,
                        "repo": repo.repo,
                        "orderingDirection": ordering,
                        "filters": filters,
                    }),
                    page_arguments(cursor.as_ref(), PAGE_SIZE),
                ))
                .signal(signal),
        )
        .await?;

    let (pulls, page_info) = extract_connection(&envelope, &["data", "owner", "repository", "pulls"]);
    Ok(PageResult {
        data: PullsPage { pulls },
        page_info,
    })
}
