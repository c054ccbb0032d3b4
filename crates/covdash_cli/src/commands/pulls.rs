use std::sync::Arc;

use clap::ValueEnum;
use covdash::format::PagedCollection;
use covdash::format::flags::{FlagRow, create_flags_table_data};
use covdash::format::pulls::{PullRow, create_pulls_table_team_data};
use covdash::query::InfiniteQuery;
use covdash::services::flags::{fetch_flag_comparisons, flags_key};
use covdash::services::pulls::{
    OrderingDirection, PullState, PullsFilters, fetch_pulls, pulls_key,
};

use super::shared::{
    Context, OutputFormat, RepoArgs, format_change, load_pages, or_dash, print_rows,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum StateArg {
    Open,
    Closed,
    Merged,
}

impl From<StateArg> for PullState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Open => PullState::Open,
            StateArg::Closed => PullState::Closed,
            StateArg::Merged => PullState::Merged,
        }
    }
}

#[derive(Debug, clap::Args)]
pub(crate) struct PullsArgs {
    #[command(flatten)]
    pub(crate) repo: RepoArgs,

    /// Only pulls in these states (repeatable)
    #[arg(long, value_enum)]
    pub(crate) state: Vec<StateArg>,

    /// Oldest first
    #[arg(long)]
    pub(crate) asc: bool,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub(crate) pages: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, clap::Args)]
pub(crate) struct FlagsArgs {
    #[command(flatten)]
    pub(crate) repo: RepoArgs,

    /// Pull request number
    pub(crate) pull_id: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, Clone, tabled::Tabled)]
struct PullDisplay {
    #[tabled(rename = "#")]
    pull_id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Patch")]
    patch: String,
    #[tabled(rename = "Bundle")]
    bundle: String,
}

impl From<&PullRow> for PullDisplay {
    fn from(row: &PullRow) -> Self {
        // Pulls without a usable comparison show why instead of a bare dash.
        let patch = match row.title.compare_with_base_type {
            Some(kind) if kind != "Comparison" && row.patch.value().is_none() => kind.to_string(),
            _ => row.patch.to_string(),
        };

        Self {
            pull_id: row.title.pull_id,
            title: or_dash(row.title.title.as_deref()),
            author: or_dash(
                row.title
                    .author
                    .as_ref()
                    .and_then(|a| a.username.as_deref()),
            ),
            state: or_dash(row.state.map(|s| format!("{s:?}").to_lowercase())),
            updated: or_dash(row.title.updatestamp.as_deref()),
            patch,
            bundle: row.bundle_analysis.glyph().to_string(),
        }
    }
}

#[derive(Debug, Clone, tabled::Tabled)]
struct FlagDisplay {
    #[tabled(rename = "Flag")]
    name: String,
    #[tabled(rename = "HEAD")]
    head: String,
    #[tabled(rename = "Patch")]
    patch: String,
    #[tabled(rename = "Change")]
    change: String,
}

impl From<&FlagRow> for FlagDisplay {
    fn from(row: &FlagRow) -> Self {
        Self {
            name: row.name.clone(),
            head: row.head.to_string(),
            patch: row.patch.to_string(),
            change: format_change(row.change),
        }
    }
}

pub(crate) async fn handle_pulls(
    args: PullsArgs,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = args.repo.repo_ref();
    let ordering = if args.asc {
        OrderingDirection::Asc
    } else {
        OrderingDirection::Desc
    };
    let filters = PullsFilters {
        state: args.state.into_iter().map(PullState::from).collect(),
    };

    let key = pulls_key(&repo, ordering, &filters);
    let api = ctx.api.clone();
    let query = InfiniteQuery::new(Arc::clone(&ctx.queries), key, move |cursor| {
        let api = api.clone();
        let repo = repo.clone();
        let filters = filters.clone();
        async move { fetch_pulls(&api, &repo, ordering, &filters, cursor, None).await }
    });
    load_pages(&query, args.pages).await?;

    let rows = create_pulls_table_team_data(&PagedCollection::from_pages(query.page_data().await));
    tracing::debug!(count = rows.len(), "formatted pulls");

    let display = rows.iter().map(PullDisplay::from).collect();
    print_rows(display, &rows, args.output, "No pull requests found.")?;
    Ok(())
}

pub(crate) async fn handle_flags(
    args: FlagsArgs,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = args.repo.repo_ref();
    let flags = ctx
        .queries
        .fetch(&flags_key(&repo, args.pull_id), || {
            fetch_flag_comparisons(&ctx.api, &repo, args.pull_id, None)
        })
        .await?;

    let rows = create_flags_table_data(&flags);
    let display = rows.iter().map(FlagDisplay::from).collect();
    print_rows(
        display,
        &rows,
        args.output,
        "No flag comparison available for this pull request.",
    )?;
    Ok(())
}
