//! Login providers enabled on the instance (`GetServiceProviders`).

use serde::Serialize;

use super::extract;
use crate::api::{AbortSignal, ApiClient, GraphQlRequest};
use crate::query::{QueryError, QueryKey};

const QUERY: &str = r#"
query GetServiceProviders {
  config {
    loginProviders
  }
}
"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceProviders {
    /// Raw provider names, e.g. `GITHUB`, `GITLAB_ENTERPRISE`.
    pub provider_list: Vec<String>,
    pub github: bool,
    pub gitlab: bool,
    pub bitbucket: bool,
}

impl ServiceProviders {
    pub fn from_login_providers(providers: Vec<String>) -> Self {
        let has = |names: &[&str]| providers.iter().any(|p| names.contains(&p.as_str()));
        Self {
            github: has(&["GITHUB", "GITHUB_ENTERPRISE"]),
            gitlab: has(&["GITLAB", "GITLAB_ENTERPRISE"]),
            bitbucket: has(&["BITBUCKET", "BITBUCKET_SERVER"]),
            provider_list: providers,
        }
    }
}

pub fn service_providers_key() -> QueryKey {
    QueryKey::new("GetServiceProviders")
}

/// The instance config is not provider scoped; the request goes through the
/// GitHub endpoint.
pub async fn fetch_service_providers(
    api: &ApiClient,
    signal: Option<AbortSignal>,
) -> Result<ServiceProviders, QueryError> {
    let envelope = api
        .graphql(GraphQlRequest::new("gh", QUERY).signal(signal))
        .await?;
    let providers: Option<Vec<String>> = extract(&envelope, &["data", "config", "loginProviders"])?;
    Ok(ServiceProviders::from_login_providers(
        providers.unwrap_or_default(),
    ))
}
