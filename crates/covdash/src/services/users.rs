//! Organization members (REST): listing with filters, and activation.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{AbortSignal, ApiClient, QueryParams, RestRequest};
use crate::format::paged::lenient_list;
use crate::navigation::{ApiFilter, LocationParams};
use crate::query::{QueryClient, QueryError, QueryKey};
use crate::telemetry::{TelemetryEvent, TelemetrySink, track};

/// A member of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub ownerid: Option<u64>,
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub student: bool,
    pub lastseen: Option<String>,
    pub latest_private_pr_date: Option<String>,
}

/// One page of the users listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersPage {
    #[serde(default)]
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub results: Vec<Option<User>>,
    pub total_pages: Option<u64>,
}

/// Filters, ordering and page selection for the users listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersQuery {
    pub activated: ApiFilter,
    pub is_admin: ApiFilter,
    /// `name`, `-name`, `username`, `-username`, `email` or `-email`.
    pub ordering: String,
    pub search: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl Default for UsersQuery {
    fn default() -> Self {
        Self {
            activated: ApiFilter::None,
            is_admin: ApiFilter::None,
            ordering: "name".to_string(),
            search: String::new(),
            page: None,
            page_size: None,
        }
    }
}

impl UsersQuery {
    /// Recognized location params and their defaults.
    pub fn location_params() -> LocationParams {
        LocationParams::new([
            ("activated", ""),
            ("isAdmin", ""),
            ("ordering", "name"),
            ("search", ""),
            ("page", ""),
            ("pageSize", ""),
        ])
    }

    /// Read the query from the current location params. Unparseable values
    /// fall back to their defaults.
    pub fn from_location(params: &LocationParams) -> Self {
        let defaults = Self::default();
        Self {
            activated: params.get_str("activated").parse().unwrap_or_default(),
            is_admin: params.get_str("isAdmin").parse().unwrap_or_default(),
            ordering: match params.get_str("ordering") {
                "" => defaults.ordering,
                ordering => ordering.to_string(),
            },
            search: params.get_str("search").to_string(),
            page: params.get_str("page").parse().ok(),
            page_size: params.get_str("pageSize").parse().ok(),
        }
    }

    /// camelCase query parameters in a fixed order. Unset filters are omitted.
    pub fn to_query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        let mut push = |key: &str, value: String| {
            if !value.is_empty() {
                params.push((key.to_string(), value));
            }
        };
        push("activated", self.activated.as_str().to_string());
        push("isAdmin", self.is_admin.as_str().to_string());
        push("ordering", self.ordering.clone());
        push("search", self.search.clone());
        push("page", self.page.map(|p| p.to_string()).unwrap_or_default());
        push(
            "pageSize",
            self.page_size.map(|p| p.to_string()).unwrap_or_default(),
        );
        params
    }
}

/// `["users", provider, owner]`: prefix of every users listing key.
pub fn users_key_prefix(provider: &str, owner: &str) -> QueryKey {
    QueryKey::new("users").with(provider).with(owner)
}

pub fn users_key(provider: &str, owner: &str, query: &UsersQuery) -> QueryKey {
    let mut key = users_key_prefix(provider, owner);
    for (name, value) in query.to_query_params() {
        key = key.with(format!("{name}={value}"));
    }
    key
}

/// GET `/{provider}/{owner}/users`.
pub async fn fetch_users(
    api: &ApiClient,
    provider: &str,
    owner: &str,
    query: &UsersQuery,
    signal: Option<AbortSignal>,
) -> Result<UsersPage, QueryError> {
    let body = api
        .get(
            RestRequest::new(provider, format!("/{owner}/users"))
                .query(query.to_query_params())
                .signal(signal),
        )
        .await?;
    Ok(UsersPage::deserialize(&body)?)
}

/// Activate or deactivate a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateUser {
    pub provider: String,
    pub owner: String,
    pub username: String,
    pub activated: bool,
}

/// PATCH `/{provider}/{owner}/users/{username}/` with `{activated}`.
///
/// On success every cached users listing of the owner is invalidated and a
/// telemetry event is emitted.
pub async fn update_user(
    api: &ApiClient,
    queries: &QueryClient,
    telemetry: &dyn TelemetrySink,
    update: &UpdateUser,
) -> Result<User, QueryError> {
    let body = api
        .patch(
            RestRequest::new(
                &update.provider,
                format!("/{}/users/{}/", update.owner, update.username),
            )
            .body(json!({ "activated": update.activated })),
        )
        .await?;
    let user = User::deserialize(&body)?;

    queries.invalidate(&users_key_prefix(&update.provider, &update.owner));
    track(
        telemetry,
        TelemetryEvent::new(
            "update-user",
            json!({
                "provider": update.provider,
                "owner": update.owner,
                "username": update.username,
                "activated": update.activated,
            }),
        ),
    );
    tracing::info!(
        owner = %update.owner,
        username = %update.username,
        activated = update.activated,
        "updated user"
    );

    Ok(user)
}
