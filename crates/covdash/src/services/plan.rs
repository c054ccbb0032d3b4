//! Plan page data: upload usage and account seat details.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::extract;
use crate::api::{AbortSignal, ApiClient, GraphQlRequest, RestRequest};
use crate::query::{QueryError, QueryKey};

const QUERY: &str = r#"
query PlanPageData($username: String!) {
  owner(username: $username) {
    username
    isCurrentUserPartOfOrg
    numberOfUploads
  }
}
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPageData {
    pub username: Option<String>,
    pub is_current_user_part_of_org: Option<bool>,
    /// Uploads in the trailing 30 days; the backend may send null.
    pub number_of_uploads: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub value: Option<String>,
    pub marketing_name: Option<String>,
    pub quantity: Option<u64>,
}

/// Plan values of the free basic tier, which is capped on uploads.
const BASIC_PLANS: &[&str] = &["users-basic", "users-free"];

impl Plan {
    pub fn is_basic(&self) -> bool {
        self.value
            .as_deref()
            .is_some_and(|value| BASIC_PLANS.contains(&value))
    }
}

/// Seat details of an account (REST, camelized).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetails {
    pub activated_user_count: Option<u64>,
    pub inactive_user_count: Option<u64>,
    #[serde(default)]
    pub plan: Plan,
}

pub fn plan_page_key(provider: &str, owner: &str) -> QueryKey {
    QueryKey::new("PlanPageData").with(provider).with(owner)
}

pub fn account_details_key(provider: &str, owner: &str) -> QueryKey {
    QueryKey::new("accountDetails").with(provider).with(owner)
}

pub async fn fetch_plan_page_data(
    api: &ApiClient,
    provider: &str,
    owner: &str,
    signal: Option<AbortSignal>,
) -> Result<Option<PlanPageData>, QueryError> {
    let envelope = api
        .graphql(
            GraphQlRequest::new(provider, QUERY)
                .variables(json!({ "username": owner }))
                .signal(signal),
        )
        .await?;
    extract(&envelope, &["data", "owner"])
}

/// GET `/{provider}/{owner}/account-details/`.
pub async fn fetch_account_details(
    api: &ApiClient,
    provider: &str,
    owner: &str,
    signal: Option<AbortSignal>,
) -> Result<AccountDetails, QueryError> {
    let body = api
        .get(RestRequest::new(provider, format!("/{owner}/account-details/")).signal(signal))
        .await?;
    Ok(AccountDetails::deserialize(&body)?)
}
