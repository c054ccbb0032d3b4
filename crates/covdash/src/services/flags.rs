//! Per-flag coverage comparison of a pull request.

use serde::Deserialize;
use serde_json::{Value, json};

use super::RepoRef;
use crate::api::{AbortSignal, ApiClient, GraphQlRequest, get_path};
use crate::format::paged::lenient_elements;
use crate::query::{QueryError, QueryKey};

const QUERY: &str = r#"
query PullFlagsComparison($owner: String!, $repo: String!, $pullId: Int!) {
  owner(username: $owner) {
    repository(name: $repo) {
      ... on Repository {
        pull(id: $pullId) {
          compareWithBase {
            __typename
            ... on Comparison {
              flagComparisons {
                name
                patchTotals {
                  percentCovered
                }
                headTotals {
                  percentCovered
                }
                baseTotals {
                  percentCovered
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagTotals {
    pub percent_covered: Option<f64>,
}

/// Coverage of one flag at the pull's head and base.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagComparison {
    pub name: String,
    pub head_totals: Option<FlagTotals>,
    pub base_totals: Option<FlagTotals>,
    pub patch_totals: Option<FlagTotals>,
}

pub fn flags_key(repo: &RepoRef, pull_id: i64) -> QueryKey {
    repo.key("PullFlagsComparison").with(pull_id)
}

/// Fetch flag comparisons for a pull. A comparison that did not succeed
/// (missing base, missing head report, ...) yields no flags.
pub async fn fetch_flag_comparisons(
    api: &ApiClient,
    repo: &RepoRef,
    pull_id: i64,
    signal: Option<AbortSignal>,
) -> Result<Vec<Option<FlagComparison>>, QueryError> {
    let envelope = api
        .graphql(
            GraphQlRequest::new(&repo.provider, QUERY)
                .variables(json!({
                    "owner": repo.owner,
                    "repo": repo.repo,
                    "pullId": pull_id,
                }))
                .signal(signal),
        )
        .await?;

    let Some(comparison) = get_path(
        &envelope,
        &["data", "owner", "repository", "pull", "compareWithBase"],
    ) else {
        return Ok(Vec::new());
    };

    if comparison.get("__typename").and_then(Value::as_str) != Some("Comparison") {
        tracing::debug!(pull_id, "pull has no successful comparison");
        return Ok(Vec::new());
    }

    Ok(comparison
        .get("flagComparisons")
        .map(lenient_elements)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::MemoryCredentialStore;
    use crate::http::{HttpMethod, MockTransport};

    fn api(transport: &MockTransport) -> ApiClient {
        ApiClient::new_with_transport(
            "https://api.example.com",
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(transport.clone()),
        )
    }

    #[tokio::test]
    async fn fetch_flag_comparisons_for_successful_comparison() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            "https://api.example.com/graphql/gh",
            200,
            &json!({ "data": { "owner": { "repository": { "pull": { "compareWithBase": {
                "__typename": "Comparison",
                "flagComparisons": [{
                    "name": "secondTest",
                    "headTotals": { "percentCovered": 82.71 },
                    "baseTotals": { "percentCovered": 80 },
                    "patchTotals": { "percentCovered": 59 }
                }]
            }}}}}}),
        );

        let flags = fetch_flag_comparisons(
            &api(&transport),
            &RepoRef::new("gh", "laudna", "bells-hells"),
            5,
            None,
        )
        .await
        .unwrap();
        let flag = flags[0].as_ref().expect("flag");
        assert_eq!(flag.name, "secondTest");
        assert_eq!(flag.base_totals.as_ref().and_then(|t| t.percent_covered), Some(80.0));
    }

    #[tokio::test]
    async fn failed_comparison_yields_no_flags() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            "https://api.example.com/graphql/gh",
            200,
            &json!({ "data": { "owner": { "repository": { "pull": { "compareWithBase": {
                "__typename": "MissingBaseCommit",
                "message": "Missing base commit"
            }}}}}}),
        );

        let flags = fetch_flag_comparisons(
            &api(&transport),
            &RepoRef::new("gh", "laudna", "bells-hells"),
            5,
            None,
        )
        .await
        .unwrap();
        assert!(flags.is_empty());
    }
}
