use std::sync::Arc;

use covdash::format::PagedCollection;
use covdash::format::commits::{CommitRow, create_commits_table_data};
use covdash::query::InfiniteQuery;
use covdash::services::commits::{CommitsFilters, commits_key, fetch_commits};

use super::shared::{
    Context, OutputFormat, RepoArgs, format_change, load_pages, or_dash, print_rows, short_sha,
};

#[derive(Debug, clap::Args)]
pub(crate) struct CommitsArgs {
    #[command(flatten)]
    pub(crate) repo: RepoArgs,

    /// Only commits on this branch
    #[arg(long)]
    pub(crate) branch: Option<String>,

    /// Only commits of this pull request
    #[arg(long)]
    pub(crate) pull: Option<i64>,

    /// Filter commit messages
    #[arg(long)]
    pub(crate) search: Option<String>,

    /// Hide commits whose CI failed
    #[arg(long)]
    pub(crate) hide_failed_ci: bool,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub(crate) pages: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, Clone, tabled::Tabled)]
struct CommitDisplay {
    #[tabled(rename = "Commit")]
    commit: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "CI")]
    ci: &'static str,
    #[tabled(rename = "Coverage")]
    coverage: String,
    #[tabled(rename = "Patch")]
    patch: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Bundle")]
    bundle: String,
}

impl From<&CommitRow> for CommitDisplay {
    fn from(row: &CommitRow) -> Self {
        Self {
            commit: short_sha(&row.title.commitid).to_string(),
            message: or_dash(row.title.message.as_deref().and_then(|m| m.lines().next())),
            author: or_dash(
                row.title
                    .author
                    .as_ref()
                    .and_then(|a| a.username.as_deref()),
            ),
            ci: match row.ci_status.ci_passed {
                Some(true) => "passed",
                Some(false) => "failed",
                None => "pending",
            },
            coverage: row.coverage.to_string(),
            patch: row.patch.to_string(),
            change: format_change(row.change),
            bundle: row.bundle_analysis.glyph().to_string(),
        }
    }
}

pub(crate) async fn handle_commits(
    args: CommitsArgs,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = args.repo.repo_ref();
    let filters = CommitsFilters {
        pull_id: args.pull,
        branch_name: args.branch,
        hide_failed_ci: args.hide_failed_ci.then_some(true),
        search: args.search,
    };

    let key = commits_key(&repo, &filters);
    let api = ctx.api.clone();
    let query = InfiniteQuery::new(Arc::clone(&ctx.queries), key, move |cursor| {
        let api = api.clone();
        let repo = repo.clone();
        let filters = filters.clone();
        async move { fetch_commits(&api, &repo, &filters, cursor, None).await }
    });
    load_pages(&query, args.pages).await?;

    let rows = create_commits_table_data(&PagedCollection::from_pages(query.page_data().await));
    tracing::debug!(count = rows.len(), "formatted commits");

    let display = rows.iter().map(CommitDisplay::from).collect();
    print_rows(display, &rows, args.output, "No commits found.")?;
    Ok(())
}
