//! Repository commits, cursor-paginated.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Author, PAGE_SIZE, RepoRef, Totals, extract_connection, page_arguments, with_arguments};
use crate::api::{AbortSignal, ApiClient, GraphQlRequest};
use crate::format::comparison::{BundleAnalysisReport, ComparisonResult};
use crate::format::paged::lenient_list;
use crate::query::{PageCursor, PageResult, QueryError, QueryKey};

const QUERY: &str = r#"
query GetCommits($owner: String!, $repo: String!, $filters: CommitsSetFilters, $first: Int, $after: String, $last: Int, $before: String) {
  owner(username: $owner) {
    repository(name: $repo) {
      ... on Repository {
        commits(filters: $filters, first: $first, after: $after, last: $last, before: $before) {
          edges {
            node {
              ciPassed
              message
              commitid
              createdAt
              author {
                username
                avatarUrl
              }
              totals {
                coverage
              }
              parent {
                totals {
                  coverage
                }
              }
              compareWithParent {
                __typename
                ... on Comparison {
                  patchTotals {
                    percentCovered
                  }
                }
              }
              bundleAnalysisReport {
                __typename
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

/// Commit filters, sent as the `CommitsSetFilters` input object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitsFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_failed_ci: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommitParent {
    pub totals: Option<Totals>,
}

/// A commit as listed on the commits table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub commitid: String,
    pub message: Option<String>,
    pub author: Option<Author>,
    pub created_at: Option<String>,
    pub ci_passed: Option<bool>,
    pub totals: Option<Totals>,
    pub parent: Option<CommitParent>,
    pub compare_with_parent: Option<ComparisonResult>,
    pub bundle_analysis_report: Option<BundleAnalysisReport>,
}

/// One page of commits. Null or malformed entries are kept as `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommitsPage {
    #[serde(default, deserialize_with = "lenient_list")]
    pub commits: Vec<Option<Commit>>,
}

pub fn commits_key(repo: &RepoRef, filters: &CommitsFilters) -> QueryKey {
    let filters = serde_json::to_value(filters).unwrap_or_default();
    repo.key("commits").with_json(&filters)
}

/// Fetch the page of commits next to `cursor` (the first page when `None`).
pub async fn fetch_commits(
    api: &ApiClient,
    repo: &RepoRef,
    filters: &CommitsFilters,
    cursor: Option<PageCursor>,
    signal: Option<AbortSignal>,
) -> Result<PageResult<CommitsPage>, QueryError> {
    let envelope = api
        .graphql(
            GraphQlRequest::new(&repo.provider, QUERY)
                .variables(with_arguments(
                    json!({
                        "owner": repo.owner,
                        "repo": repo.repo,
                        "filters": filters,
                    }),
                    page_arguments(cursor.as_ref(), PAGE_SIZE),
                ))
                .signal(signal),
        )
        .await?;

    let (commits, page_info) =
        extract_connection(&envelope, &["data", "owner", "repository", "commits"]);
    Ok(PageResult {
        data: CommitsPage { commits },
        page_info,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::MemoryCredentialStore;
    use crate::http::{HttpMethod, MockTransport};

    #[tokio::test]
    async fn fetch_commits_sends_filters_and_cursor() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            "https://api.example.com/graphql/gh",
            200,
            &json!({ "data": { "owner": { "repository": { "commits": {
                "edges": [
                    { "node": { "commitid": "abc123", "message": "fix", "totals": { "coverage": 80.5 },
                                "compareWithParent": { "__typename": "MissingBaseCommit" },
                                "bundleAnalysisReport": { "__typename": "BundleAnalysisReport" } } },
                    { "node": null }
                ],
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            }}}}}),
        );
        let api = ApiClient::new_with_transport(
            "https://api.example.com",
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(transport.clone()),
        );

        let filters = CommitsFilters {
            pull_id: Some(5),
            ..CommitsFilters::default()
        };
        let page = fetch_commits(
            &api,
            &RepoRef::new("gh", "codecov", "gazebo"),
            &filters,
            Some(PageCursor::After("cursor-1".to_string())),
            None,
        )
        .await
        .unwrap();

        assert_eq!(page.data.commits.len(), 2);
        let commit = page.data.commits[0].as_ref().expect("first commit");
        assert_eq!(commit.commitid, "abc123");
        assert_eq!(
            commit.compare_with_parent,
            Some(ComparisonResult::MissingBaseCommit)
        );
        assert!(!page.page_info.has_next_page);

        let body: serde_json::Value =
            serde_json::from_slice(&transport.requests()[0].body).unwrap();
        assert_eq!(body["variables"]["filters"], json!({ "pullId": 5 }));
        assert_eq!(body["variables"]["after"], json!("cursor-1"));
        assert_eq!(body["variables"]["first"], json!(20));
        assert!(body["variables"].get("before").is_none());
    }

    #[test]
    fn test_key_depends_on_filters() {
        let repo = RepoRef::new("gh", "codecov", "gazebo");
        let all = commits_key(&repo, &CommitsFilters::default());
        let pull = commits_key(
            &repo,
            &CommitsFilters {
                pull_id: Some(5),
                ..CommitsFilters::default()
            },
        );
        assert_ne!(all, pull);
        assert_eq!(all.resource(), "commits");
    }
}
