use std::fmt::Display;
use std::sync::Arc;

use clap::ValueEnum;
use console::style;
use covdash::query::InfiniteQuery;
use covdash::services::RepoRef;
use covdash::{ApiClient, QueryClient, QueryError};
use serde::Serialize;
use tabled::Tabled;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output of the formatted rows
    Json,
}

/// Handles shared by every command of one invocation.
pub(crate) struct Context {
    pub(crate) api: ApiClient,
    pub(crate) queries: Arc<QueryClient>,
}

/// Owner coordinates taken as positional arguments.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct OwnerArgs {
    /// Provider (gh, gl, bb, github, gitlab, bitbucket)
    pub(crate) provider: String,
    /// Owner (user or organization)
    pub(crate) owner: String,
}

/// Repository coordinates taken as positional arguments.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RepoArgs {
    /// Provider (gh, gl, bb, github, gitlab, bitbucket)
    pub(crate) provider: String,
    /// Owner (user or organization)
    pub(crate) owner: String,
    /// Repository name
    pub(crate) repo: String,
}

impl RepoArgs {
    pub(crate) fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.provider, &self.owner, &self.repo)
    }
}

/// Load the first page, then up to `pages - 1` more while the backend
/// reports a next page.
pub(crate) async fn load_pages<P: Send + Sync + 'static>(
    query: &InfiniteQuery<P>,
    pages: usize,
) -> Result<(), QueryError> {
    query.fetch_first_page().await?;
    for _ in 1..pages {
        if !query.fetch_next_page().await? {
            break;
        }
    }
    Ok(())
}

/// Print `rows` as a table, or `raw` as JSON.
pub(crate) fn print_rows<T: Tabled, R: Serialize + ?Sized>(
    rows: Vec<T>,
    raw: &R,
    format: OutputFormat,
    empty_message: &str,
) -> Result<(), serde_json::Error> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(raw)?),
        OutputFormat::Table if rows.is_empty() => println!("{}", style(empty_message).dim()),
        OutputFormat::Table => {
            let mut table = tabled::Table::new(rows);
            table.with(tabled::settings::Style::rounded());
            println!("{}", table);
        }
    }
    Ok(())
}

/// Two-column field/value table used for single records.
#[derive(Debug, Clone, Tabled)]
pub(crate) struct FieldDisplay {
    #[tabled(rename = "Field")]
    pub(crate) field: &'static str,
    #[tabled(rename = "Value")]
    pub(crate) value: String,
}

impl FieldDisplay {
    pub(crate) fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

pub(crate) fn or_dash<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Signed coverage change, e.g. `+2.71%`.
pub(crate) fn format_change(change: Option<f64>) -> String {
    change.map_or_else(|| "-".to_string(), |c| format!("{c:+.2}%"))
}

pub(crate) fn short_sha(commitid: &str) -> &str {
    commitid.get(..7).unwrap_or(commitid)
}
