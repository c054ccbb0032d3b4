//! Request-building and key-normalization helpers.

use convert_case::{Case, Casing};
use serde_json::{Map, Value};

use super::credentials::CredentialStore;
use super::provider::Provider;
use crate::http::HttpHeaders;

/// Ordered query-string parameters. Insertion order is preserved on the wire.
pub type QueryParams = Vec<(String, String)>;

/// Build a full REST URL: `{api_url}/internal{path}` plus an optional
/// URL-encoded query string.
///
/// # Example
///
/// ```ignore
/// let query = vec![("rocket".to_string(), "league".to_string())];
/// assert_eq!(
///     generate_path("https://api.example.com", "/epic", &query),
///     "https://api.example.com/internal/epic?rocket=league",
/// );
/// ```
#[must_use]
pub fn generate_path(api_url: &str, path: &str, query: &QueryParams) -> String {
    let base = format!("{}/internal{}", api_url.trim_end_matches('/'), path);
    if query.is_empty() {
        return base;
    }

    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish();
    format!("{}?{}", base, encoded)
}

/// Headers for a request against `provider`.
///
/// Always includes `Accept: application/json`. Adds a bearer token when the
/// provider is known and a token is stored for it; unknown providers yield an
/// anonymous request.
#[must_use]
pub fn get_headers(provider: &str, credentials: &dyn CredentialStore) -> HttpHeaders {
    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];

    if let Some(provider) = Provider::from_alias(provider)
        && let Some(token) = credentials.get(provider)
    {
        headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
    }

    headers
}

/// Recursively convert camelCase object keys to snake_case.
///
/// Arrays are walked, primitives pass through unchanged, and the input is
/// never mutated. Keys starting with an underscore (`__typename`) are kept.
#[must_use]
pub fn snakeify_keys(value: &Value) -> Value {
    convert_keys(value, &snake_case_key)
}

/// Recursively convert snake_case object keys to camelCase.
///
/// Keys without an underscore are already in camelCase form and are kept
/// as-is, so camelizing a GraphQL body is a no-op.
#[must_use]
pub fn camelize_keys(value: &Value) -> Value {
    convert_keys(value, &camel_case_key)
}

/// Convert a single camelCase key to snake_case.
#[must_use]
pub fn snake_case_key(key: &str) -> String {
    if key.starts_with('_') {
        return key.to_string();
    }
    key.from_case(Case::Camel).to_case(Case::Snake)
}

/// Convert a single snake_case key to camelCase.
#[must_use]
pub fn camel_case_key(key: &str) -> String {
    if key.starts_with('_') || !key.contains('_') {
        return key.to_string();
    }
    key.from_case(Case::Snake).to_case(Case::Camel)
}

fn convert_keys(value: &Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let converted: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (convert(k), convert_keys(v, convert)))
                .collect();
            Value::Object(converted)
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| convert_keys(v, convert)).collect()),
        other => other.clone(),
    }
}

/// Walk `path` through nested objects, returning `None` as soon as a segment
/// is absent or a non-object is reached. `null` leaves resolve to `None`.
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = current.as_object()?.get(*segment)?;
    }
    if current.is_null() { None } else { Some(current) }
}
