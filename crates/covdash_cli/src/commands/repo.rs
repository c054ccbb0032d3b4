use std::sync::Arc;

use covdash::QueryError;
use covdash::format::Cell;
use covdash::format::branch::{Branches, branch_selector, select_branch};
use covdash::navigation::RouteParams;
use covdash::services::branch_contents::{
    BranchContentsParams, PathEntry, branch_contents_key, fetch_branch_contents,
};
use covdash::services::repo::{RepoDetails, fetch_repo, repo_key};
use serde_json::json;

use super::shared::{Context, FieldDisplay, OutputFormat, RepoArgs, or_dash, print_rows};

#[derive(Debug, clap::Args)]
pub(crate) struct RepoShowArgs {
    #[command(flatten)]
    pub(crate) repo: RepoArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, clap::Args)]
pub(crate) struct FilesArgs {
    #[command(flatten)]
    pub(crate) repo: RepoArgs,

    /// Branch to browse (default: the repository's default branch)
    #[arg(long)]
    pub(crate) branch: Option<String>,

    /// Directory path inside the repository
    #[arg(long, default_value = "")]
    pub(crate) path: String,

    /// Only files matching this term
    #[arg(long)]
    pub(crate) search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, Clone, tabled::Tabled)]
struct EntryDisplay {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Lines")]
    lines: String,
    #[tabled(rename = "Hits")]
    hits: String,
    #[tabled(rename = "Misses")]
    misses: String,
    #[tabled(rename = "Partials")]
    partials: String,
    #[tabled(rename = "Coverage")]
    coverage: String,
}

impl From<&PathEntry> for EntryDisplay {
    fn from(entry: &PathEntry) -> Self {
        Self {
            name: entry.name.clone(),
            kind: if entry.is_file() { "file" } else { "dir" },
            lines: or_dash(entry.lines),
            hits: or_dash(entry.hits),
            misses: or_dash(entry.misses),
            partials: or_dash(entry.partials),
            coverage: Cell::from_option(entry.percent_covered).to_string(),
        }
    }
}

async fn load_repo(args: &RepoArgs, ctx: &Context) -> Result<Arc<RepoDetails>, QueryError> {
    let repo = args.repo_ref();
    ctx.queries
        .fetch(&repo_key(&repo), || fetch_repo(&ctx.api, &repo, None))
        .await
}

pub(crate) async fn handle_repo(
    args: RepoShowArgs,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let details = load_repo(&args.repo, ctx).await?;
    let Some(repository) = details.repository.as_ref() else {
        return Err(format!(
            "repository {}/{} not found on {}",
            args.repo.owner, args.repo.repo, args.repo.provider
        )
        .into());
    };

    let fields = vec![
        FieldDisplay::new("Default branch", or_dash(repository.default_branch.as_deref())),
        FieldDisplay::new("Private", or_dash(repository.private)),
        FieldDisplay::new("Activated", or_dash(repository.activated)),
        FieldDisplay::new("Oldest commit", or_dash(repository.oldest_commit_at.as_deref())),
        FieldDisplay::new("Member", or_dash(details.is_current_user_part_of_org)),
    ];
    print_rows(fields, details.as_ref(), args.output, "")?;
    Ok(())
}

pub(crate) async fn handle_files(
    args: FilesArgs,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let details = load_repo(&args.repo, ctx).await?;
    let default_branch = details
        .repository
        .as_ref()
        .and_then(|r| r.default_branch.as_deref());

    let mut route = RouteParams {
        provider: args.repo.provider.clone(),
        owner: args.repo.owner.clone(),
        repo: Some(args.repo.repo.clone()),
        ..RouteParams::default()
    };
    if let Some(name) = &args.branch {
        route = select_branch(&route, name);
    }
    let Some(branch) = branch_selector(&Branches::default(), default_branch, &route).selection
    else {
        return Err("repository has no default branch; pass --branch".into());
    };

    let mut filters = json!({ "ordering": { "direction": "ASC", "parameter": "NAME" } });
    if let Some(search) = args.search.filter(|s| !s.is_empty()) {
        filters["searchValue"] = json!(search);
    }
    let params = BranchContentsParams {
        repo: args.repo.repo_ref(),
        branch: branch.name,
        path: args.path,
        filters,
    };

    let contents = ctx
        .queries
        .fetch(&branch_contents_key(&params), || {
            fetch_branch_contents(&ctx.api, &params, None)
        })
        .await?;

    let contents = (*contents).as_ref();
    if let Some(kind) = contents.and_then(|c| c.typename.as_deref())
        && kind != "PathContents"
    {
        tracing::warn!(kind, branch = %params.branch, "no coverage for path");
    }
    let entries: Vec<&PathEntry> = contents
        .map(|c| c.results.iter().flatten().collect())
        .unwrap_or_default();

    let display = entries.iter().copied().map(EntryDisplay::from).collect();
    print_rows(display, &entries, args.output, "No files found.")?;
    Ok(())
}
