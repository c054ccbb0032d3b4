//! API client for the coverage backend.
//!
//! Requests go to `{api_url}/internal/{provider}/...` for REST resources and to
//! `{api_url}/graphql/{provider}` for GraphQL documents. Every request carries
//! an `Accept: application/json` header and, when a token is stored for the
//! provider, a bearer `Authorization` header.

mod abort;
mod client;
mod credentials;
mod error;
pub mod helpers;
mod provider;

pub use abort::{AbortController, AbortSignal};
pub use client::{ApiClient, ApiConfig, DEFAULT_API_URL, GraphQlRequest, RestRequest};
pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use error::{ApiError, Result, short_error_message};
pub use helpers::{
    QueryParams, camel_case_key, camelize_keys, generate_path, get_headers, get_path,
    snake_case_key, snakeify_keys,
};
pub use provider::Provider;
