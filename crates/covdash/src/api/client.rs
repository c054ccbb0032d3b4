//! HTTP client for the coverage backend's REST and GraphQL endpoints.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use super::abort::AbortSignal;
use super::credentials::CredentialStore;
use super::error::{ApiError, Result};
use super::helpers::{
    QueryParams, camelize_keys, generate_path, get_headers, snake_case_key, snakeify_keys,
};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// Default backend URL.
pub const DEFAULT_API_URL: &str = "https://api.codecov.io";

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, without the `/internal` or `/graphql` suffix.
    pub api_url: String,
    /// Per-request timeout for the default transport.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A GraphQL document plus variables, sent to `{api_url}/graphql/{provider}`.
#[derive(Debug, Clone)]
pub struct GraphQlRequest<'a> {
    pub provider: &'a str,
    pub query: &'a str,
    pub variables: Value,
    pub signal: Option<AbortSignal>,
}

impl<'a> GraphQlRequest<'a> {
    pub fn new(provider: &'a str, query: &'a str) -> Self {
        Self {
            provider,
            query,
            variables: Value::Object(Default::default()),
            signal: None,
        }
    }

    #[must_use]
    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    #[must_use]
    pub fn signal(mut self, signal: Option<AbortSignal>) -> Self {
        self.signal = signal;
        self
    }
}

/// A REST request against `{api_url}/internal/{provider}{path}`.
///
/// Query keys and body keys are given in camelCase and sent snake_cased.
#[derive(Debug, Clone)]
pub struct RestRequest {
    pub provider: String,
    pub path: String,
    pub query: QueryParams,
    pub body: Option<Value>,
    pub signal: Option<AbortSignal>,
}

impl RestRequest {
    pub fn new(provider: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            path: path.into(),
            query: QueryParams::new(),
            body: None,
            signal: None,
        }
    }

    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn signal(mut self, signal: Option<AbortSignal>) -> Self {
        self.signal = signal;
        self
    }
}

/// Coverage backend client.
///
/// Credentials are injected and only read while assembling headers.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialStore>,
    api_url: String,
}

impl ApiClient {
    /// Create a client backed by a reqwest transport.
    #[cfg(feature = "reqwest")]
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        use crate::http::reqwest_transport::ReqwestTransport;

        let transport = ReqwestTransport::with_timeout(config.timeout)
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            &config.api_url,
            credentials,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        api_url: &str,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            credentials,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// The injected credential store.
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// POST a GraphQL document and return the full (camelCase) envelope.
    ///
    /// Callers unwrap `data.<rootField>...` themselves; absent segments are
    /// not an error. An envelope with `errors` and no `data` is.
    pub async fn graphql(&self, request: GraphQlRequest<'_>) -> Result<Value> {
        let url = format!("{}/graphql/{}", self.api_url, request.provider);
        let body = json!({
            "query": request.query,
            "variables": request.variables,
        });

        let envelope = self
            .execute(
                HttpMethod::Post,
                url,
                request.provider,
                Some(&body),
                request.signal.as_ref(),
            )
            .await?;

        let has_data = envelope.get("data").is_some_and(|d| !d.is_null());
        if !has_data
            && let Some(message) = envelope
                .get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| errors.first())
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
        {
            return Err(ApiError::GraphQl {
                message: message.to_string(),
            });
        }

        Ok(envelope)
    }

    pub async fn get(&self, request: RestRequest) -> Result<Value> {
        self.rest(HttpMethod::Get, request).await
    }

    pub async fn post(&self, request: RestRequest) -> Result<Value> {
        self.rest(HttpMethod::Post, request).await
    }

    pub async fn patch(&self, request: RestRequest) -> Result<Value> {
        self.rest(HttpMethod::Patch, request).await
    }

    pub async fn delete(&self, request: RestRequest) -> Result<Value> {
        self.rest(HttpMethod::Delete, request).await
    }

    async fn rest(&self, method: HttpMethod, request: RestRequest) -> Result<Value> {
        let query: QueryParams = request
            .query
            .iter()
            .map(|(k, v)| (snake_case_key(k), v.clone()))
            .collect();
        let path = format!("/{}{}", request.provider, request.path);
        let url = generate_path(&self.api_url, &path, &query);
        let body = request.body.as_ref().map(snakeify_keys);

        self.execute(
            method,
            url,
            &request.provider,
            body.as_ref(),
            request.signal.as_ref(),
        )
        .await
    }

    async fn execute(
        &self,
        method: HttpMethod,
        url: String,
        provider: &str,
        body: Option<&Value>,
        signal: Option<&AbortSignal>,
    ) -> Result<Value> {
        if signal.is_some_and(AbortSignal::is_aborted) {
            return Err(ApiError::Aborted);
        }

        let mut headers = get_headers(provider, self.credentials.as_ref());
        let body = match body {
            Some(body) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                serde_json::to_vec(body)?
            }
            None => Vec::new(),
        };

        tracing::debug!(method = method.as_str(), %url, "sending request");
        let request = HttpRequest {
            method,
            url,
            headers,
            body,
        };

        let response = match signal {
            Some(signal) => {
                tokio::select! {
                    biased;
                    _ = signal.aborted() => return Err(ApiError::Aborted),
                    response = self.transport.send(request) => response?,
                }
            }
            None => self.transport.send(request).await?,
        };

        decode_response(response)
    }
}

/// Parse a response body, camelizing keys. Empty bodies decode to `null`.
fn decode_response(response: HttpResponse) -> Result<Value> {
    let parsed = if response.body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&response.body) {
            Ok(value) => camelize_keys(&value),
            Err(_) if !response.is_success() => {
                Value::String(String::from_utf8_lossy(&response.body).to_string())
            }
            Err(e) => return Err(ApiError::Json(e)),
        }
    };

    if !response.is_success() {
        tracing::warn!(status = response.status, "backend returned error status");
        return Err(ApiError::Status {
            status: response.status,
            body: parsed,
        });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::abort::AbortController;
    use crate::api::credentials::MemoryCredentialStore;
    use crate::api::provider::Provider;
    use crate::http::{MockTransport, header_get};

    const API_URL: &str = "https://api.example.com";

    fn client(transport: &MockTransport) -> ApiClient {
        let credentials =
            MemoryCredentialStore::new().with_token(Provider::GitHub, "github token");
        ApiClient::new_with_transport(API_URL, Arc::new(credentials), Arc::new(transport.clone()))
    }

    #[tokio::test]
    async fn graphql_posts_document_with_auth() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            "https://api.example.com/graphql/gh",
            200,
            &json!({ "data": { "owner": { "username": "codecov" } } }),
        );

        let envelope = client(&transport)
            .graphql(
                GraphQlRequest::new("gh", "query { owner { username } }")
                    .variables(json!({ "name": "codecov" })),
            )
            .await
            .expect("graphql should succeed");

        assert_eq!(envelope["data"]["owner"]["username"], "codecov");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0];
        assert_eq!(
            header_get(&sent.headers, "authorization"),
            Some("Bearer github token")
        );
        assert_eq!(
            header_get(&sent.headers, "content-type"),
            Some("application/json")
        );
        let body: Value = serde_json::from_slice(&sent.body).expect("json body");
        assert_eq!(body["variables"]["name"], "codecov");
        assert_eq!(body["query"], "query { owner { username } }");
    }

    #[tokio::test]
    async fn graphql_errors_without_data_are_rejected() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Post,
            "https://api.example.com/graphql/gh",
            200,
            &json!({ "data": null, "errors": [{ "message": "bad query" }] }),
        );

        let err = client(&transport)
            .graphql(GraphQlRequest::new("gh", "query { nope }"))
            .await
            .expect_err("errors without data should fail");
        assert!(matches!(err, ApiError::GraphQl { ref message } if message == "bad query"));
    }

    #[tokio::test]
    async fn rest_get_snakeifies_query_and_camelizes_response() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            "https://api.example.com/internal/gh/codecov/users?is_admin=true&page_size=10",
            200,
            &json!({ "total_pages": 3, "results": [] }),
        );

        let body = client(&transport)
            .get(RestRequest::new("gh", "/codecov/users").query(vec![
                ("isAdmin".to_string(), "true".to_string()),
                ("pageSize".to_string(), "10".to_string()),
            ]))
            .await
            .expect("get should succeed");

        assert_eq!(body, json!({ "totalPages": 3, "results": [] }));
    }

    #[tokio::test]
    async fn rest_patch_sends_snake_case_body() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Patch,
            "https://api.example.com/internal/gl/codecov/users/hello/",
            200,
            &json!({ "username": "hello", "activated": true }),
        );

        client(&transport)
            .patch(
                RestRequest::new("gl", "/codecov/users/hello/")
                    .body(json!({ "activated": true, "isAdmin": false })),
            )
            .await
            .expect("patch should succeed");

        let sent = &transport.requests()[0];
        let body: Value = serde_json::from_slice(&sent.body).expect("json body");
        assert_eq!(body, json!({ "activated": true, "is_admin": false }));
        // No GitLab token stored: anonymous request.
        assert_eq!(header_get(&sent.headers, "authorization"), None);
    }

    #[tokio::test]
    async fn non_success_status_carries_parsed_body() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Delete,
            "https://api.example.com/internal/gh/codecov/users/a/",
            403,
            &json!({ "detail": "Forbidden" }),
        );

        let err = client(&transport)
            .delete(RestRequest::new("gh", "/codecov/users/a/"))
            .await
            .expect_err("403 should fail");

        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, json!({ "detail": "Forbidden" }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_transport_error() {
        let transport = MockTransport::new();
        transport.push_failure(
            HttpMethod::Get,
            "https://api.example.com/internal/gh/codecov",
            "connection refused",
        );

        let err = client(&transport)
            .get(RestRequest::new("gh", "/codecov"))
            .await
            .expect_err("transport failure should fail");
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn empty_body_decodes_to_null() {
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Delete,
            "https://api.example.com/internal/gh/codecov/session/1",
            HttpResponse {
                status: 204,
                headers: Vec::new(),
                body: Vec::new(),
            },
        );

        let body = client(&transport)
            .delete(RestRequest::new("gh", "/codecov/session/1"))
            .await
            .expect("204 should succeed");
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn already_aborted_signal_skips_transport() {
        let transport = MockTransport::new();
        let controller = AbortController::new();
        controller.abort();

        let err = client(&transport)
            .get(RestRequest::new("gh", "/codecov").signal(Some(controller.signal())))
            .await
            .expect_err("aborted request should fail");

        assert!(matches!(err, ApiError::Aborted));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_during_flight_drops_the_response() {
        let transport = MockTransport::new();
        transport.push_delayed_json(
            HttpMethod::Get,
            "https://api.example.com/internal/gh/codecov",
            Duration::from_secs(10),
            &json!({}),
        );
        let controller = AbortController::new();
        let signal = controller.signal();
        let api = client(&transport);

        let pending = tokio::spawn(async move {
            api.get(RestRequest::new("gh", "/codecov").signal(Some(signal)))
                .await
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.abort();

        let result = pending.await.expect("task should not panic");
        assert!(matches!(result, Err(ApiError::Aborted)));
    }
}
