//! Git hosting providers known to the backend.

use serde::{Deserialize, Serialize};

/// A git hosting provider.
///
/// Route segments use either the short alias (`gh`, `gl`, `bb`) or the long
/// name; both resolve to the same provider and therefore the same stored
/// credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
    Bitbucket,
}

impl Provider {
    /// Parse a route segment, returning `None` for unknown providers.
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        alias.parse().ok()
    }

    /// Name of the credential slot holding this provider's token.
    #[must_use]
    pub fn credential_key(self) -> &'static str {
        match self {
            Provider::GitHub => "github-token",
            Provider::GitLab => "gitlab-token",
            Provider::Bitbucket => "bitbucket-token",
        }
    }

    /// Short route alias.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        match self {
            Provider::GitHub => "gh",
            Provider::GitLab => "gl",
            Provider::Bitbucket => "bb",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::GitHub => write!(f, "github"),
            Provider::GitLab => write!(f, "gitlab"),
            Provider::Bitbucket => write!(f, "bitbucket"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gh" | "github" => Ok(Provider::GitHub),
            "gl" | "gitlab" => Ok(Provider::GitLab),
            "bb" | "bitbucket" => Ok(Provider::Bitbucket),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}
