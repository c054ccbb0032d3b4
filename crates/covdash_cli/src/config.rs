//! Configuration file support for covdash.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags (`--api-url`, `--timeout`, `--stale`)
//! 2. Environment variables (prefixed with `COVDASH_`, e.g., `COVDASH_GITHUB_TOKEN`)
//! 3. Config file (./covdash.toml, then ~/.config/covdash/config.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [api]
//! url = "https://api.codecov.io"  # or a self-hosted instance
//! timeout = 30                     # seconds
//!
//! [github]
//! token = "..."  # or use COVDASH_GITHUB_TOKEN env var
//!
//! [gitlab]
//! token = "..."  # or use COVDASH_GITLAB_TOKEN env var
//!
//! [bitbucket]
//! token = "..."  # or use COVDASH_BITBUCKET_TOKEN env var
//!
//! [query]
//! stale = 0  # seconds a fetched result is reused within one run
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use covdash::api::DEFAULT_API_URL;
use covdash::query::QueryOptions;
use covdash::{ApiConfig, MemoryCredentialStore, Provider};
use directories::ProjectDirs;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings.
    pub api: ApiSettings,
    pub github: TokenConfig,
    pub gitlab: TokenConfig,
    pub bitbucket: TokenConfig,
    /// Query cache settings.
    pub query: QuerySettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Backend base URL (default: https://api.codecov.io).
    pub url: Option<String>,
    /// Request timeout in seconds (default: 30).
    pub timeout: Option<u64>,
}

/// Access token for one provider.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Seconds a successful result is served from cache (default: 0).
    pub stale: Option<u64>,
}

/// Settings given on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout: Option<u64>,
    pub stale: Option<u64>,
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Never fails: unreadable configuration is logged and replaced by the
    /// defaults.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "covdash") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("covdash.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./covdash.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // COVDASH_GITHUB_TOKEN -> github.token
        builder = builder.add_source(
            Environment::with_prefix("COVDASH")
                .separator("_")
                .try_parsing(true),
        );

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Self {
        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Apply command-line values over the loaded settings.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.api_url {
            self.api.url = Some(url);
        }
        if let Some(timeout) = overrides.timeout {
            self.api.timeout = Some(timeout);
        }
        if let Some(stale) = overrides.stale {
            self.query.stale = Some(stale);
        }
        self
    }

    pub fn api_config(&self) -> ApiConfig {
        let defaults = ApiConfig::default();
        ApiConfig {
            api_url: self
                .api
                .url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: self
                .api
                .timeout
                .map_or(defaults.timeout, Duration::from_secs),
        }
    }

    /// Credential store seeded with every configured token.
    pub fn credentials(&self) -> MemoryCredentialStore {
        let tokens = [
            (Provider::GitHub, &self.github.token),
            (Provider::GitLab, &self.gitlab.token),
            (Provider::Bitbucket, &self.bitbucket.token),
        ];

        tokens
            .into_iter()
            .fold(MemoryCredentialStore::new(), |store, (provider, token)| {
                match token.as_deref().filter(|t| !t.is_empty()) {
                    Some(token) => store.with_token(provider, token),
                    None => store,
                }
            })
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            stale_time: Duration::from_secs(self.query.stale.unwrap_or(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use covdash::CredentialStore;

    use super::*;

    fn from_toml(toml: &str) -> Config {
        Config::from_builder(
            ConfigBuilder::builder().add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("");
        let api = config.api_config();
        assert_eq!(api.api_url, DEFAULT_API_URL);
        assert_eq!(api.timeout, Duration::from_secs(30));
        assert_eq!(config.query_options().stale_time, Duration::ZERO);
        assert_eq!(config.credentials().get(Provider::GitHub), None);
    }

    #[test]
    fn test_file_values() {
        let config = from_toml(
            r#"
            [api]
            url = "https://codecov.example.com"
            timeout = 5

            [github]
            token = "gh-token"

            [bitbucket]
            token = ""

            [query]
            stale = 60
            "#,
        );

        let api = config.api_config();
        assert_eq!(api.api_url, "https://codecov.example.com");
        assert_eq!(api.timeout, Duration::from_secs(5));
        assert_eq!(config.query_options().stale_time, Duration::from_secs(60));

        let credentials = config.credentials();
        assert_eq!(credentials.get(Provider::GitHub).as_deref(), Some("gh-token"));
        assert_eq!(credentials.get(Provider::Bitbucket), None);
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let config = from_toml("[api]\ntimeout = \"soon\"");
        assert_eq!(config.api_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = from_toml("[api]\nurl = \"https://codecov.example.com\"\ntimeout = 5").with_overrides(
            Overrides {
                api_url: Some("http://localhost:8000".to_string()),
                stale: Some(10),
                ..Overrides::default()
            },
        );
        let api = config.api_config();
        assert_eq!(api.api_url, "http://localhost:8000");
        assert_eq!(api.timeout, Duration::from_secs(5));
        assert_eq!(config.query_options().stale_time, Duration::from_secs(10));
    }
}
