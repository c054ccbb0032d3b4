//! Per-provider credential storage.
//!
//! The API client never reaches for ambient storage; a store is injected at
//! construction time and consulted only while building request headers.

use std::collections::HashMap;
use std::sync::RwLock;

use super::provider::Provider;

/// Get/set/clear access to stored provider tokens.
pub trait CredentialStore: Send + Sync {
    /// Token stored for `provider`, if any.
    fn get(&self, provider: Provider) -> Option<String>;

    /// Store a token for `provider`, replacing any previous value.
    fn set(&self, provider: Provider, token: String);

    /// Remove the token stored for `provider`.
    fn clear(&self, provider: Provider);
}

/// In-memory credential store keyed by credential slot name.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    tokens: RwLock<HashMap<&'static str, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper used when wiring tokens from configuration.
    #[must_use]
    pub fn with_token(self, provider: Provider, token: impl Into<String>) -> Self {
        self.set(provider, token.into());
        self
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, provider: Provider) -> Option<String> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        tokens
            .get(provider.credential_key())
            .filter(|t| !t.is_empty())
            .cloned()
    }

    fn set(&self, provider: Provider, token: String) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert(provider.credential_key(), token);
    }

    fn clear(&self, provider: Provider) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.remove(provider.credential_key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get(Provider::GitHub), None);

        store.set(Provider::GitHub, "abc".to_string());
        assert_eq!(store.get(Provider::GitHub), Some("abc".to_string()));
        assert_eq!(store.get(Provider::GitLab), None);

        store.clear(Provider::GitHub);
        assert_eq!(store.get(Provider::GitHub), None);
    }

    #[test]
    fn test_empty_token_is_treated_as_absent() {
        let store = MemoryCredentialStore::new().with_token(Provider::Bitbucket, "");
        assert_eq!(store.get(Provider::Bitbucket), None);
    }
}
