//! Repository details (`GetRepo`).

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{RepoRef, extract};
use crate::api::{AbortSignal, ApiClient, GraphQlRequest};
use crate::query::{QueryError, QueryKey};

const QUERY: &str = r#"
query GetRepo($name: String!, $repo: String!) {
  owner(username: $name) {
    isCurrentUserPartOfOrg
    repository(name: $repo) {
      private
      uploadToken
      defaultBranch
      yaml
      activated
      oldestCommitAt
    }
  }
}
"#;

/// Repository settings as seen by the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub private: Option<bool>,
    pub upload_token: Option<String>,
    pub default_branch: Option<String>,
    pub yaml: Option<String>,
    pub activated: Option<bool>,
    pub oldest_commit_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDetails {
    /// `None` when the repository does not exist or is not visible.
    pub repository: Option<Repository>,
    pub is_current_user_part_of_org: Option<bool>,
}

pub fn repo_key(repo: &RepoRef) -> QueryKey {
    repo.key("GetRepo")
}

pub async fn fetch_repo(
    api: &ApiClient,
    repo: &RepoRef,
    signal: Option<AbortSignal>,
) -> Result<RepoDetails, QueryError> {
    let envelope = api
        .graphql(
            GraphQlRequest::new(&repo.provider, QUERY)
                .variables(json!({ "name": repo.owner, "repo": repo.repo }))
                .signal(signal),
        )
        .await?;

    Ok(RepoDetails {
        repository: extract(&envelope, &["data", "owner", "repository"])?,
        is_current_user_part_of_org: extract(
            &envelope,
            &["data", "owner", "isCurrentUserPartOfOrg"],
        )?,
    })
}
