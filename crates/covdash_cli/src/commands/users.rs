use clap::Subcommand;
use console::style;
use covdash::format::users::{UserRow, create_users_table_data};
use covdash::navigation::{ApiFilter, LocationParams};
use covdash::services::users::{
    UpdateUser, UsersQuery, fetch_users, update_user, users_key,
};
use covdash::telemetry::TracingTelemetry;

use super::shared::{Context, OutputFormat, OwnerArgs, or_dash, print_rows};

#[derive(Debug, Subcommand)]
pub(crate) enum UsersAction {
    /// List members of an owner
    List(ListArgs),
    /// Activate a member
    Activate(UpdateArgs),
    /// Deactivate a member
    Deactivate(UpdateArgs),
}

#[derive(Debug, clap::Args)]
pub(crate) struct ListArgs {
    #[command(flatten)]
    pub(crate) owner: OwnerArgs,

    /// Start from a saved query string, e.g. "activated=true&ordering=-name"
    #[arg(long)]
    pub(crate) query: Option<String>,

    /// Filter by username, name or email
    #[arg(long)]
    pub(crate) search: Option<String>,

    /// Only activated (true) or deactivated (false) members
    #[arg(long)]
    pub(crate) activated: Option<ApiFilter>,

    /// Only admins (true) or non-admins (false)
    #[arg(long)]
    pub(crate) is_admin: Option<ApiFilter>,

    /// Sort field, prefixed with `-` for descending
    #[arg(long)]
    pub(crate) ordering: Option<String>,

    #[arg(long)]
    pub(crate) page: Option<u32>,

    #[arg(long)]
    pub(crate) page_size: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) output: OutputFormat,
}

#[derive(Debug, clap::Args)]
pub(crate) struct UpdateArgs {
    #[command(flatten)]
    pub(crate) owner: OwnerArgs,
    /// Member username
    pub(crate) username: String,
}

#[derive(Debug, Clone, tabled::Tabled)]
struct UserDisplay {
    #[tabled(rename = "User")]
    username: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Labels")]
    pills: String,
    #[tabled(rename = "Last seen")]
    last_seen: String,
    #[tabled(rename = "Last PR")]
    last_pr: String,
    #[tabled(rename = "Activated")]
    activated: String,
}

impl From<&UserRow> for UserDisplay {
    fn from(row: &UserRow) -> Self {
        let pills: Vec<String> = row
            .pills
            .iter()
            .map(|pill| {
                if pill.highlight {
                    style(&pill.label).bold().to_string()
                } else {
                    pill.label.clone()
                }
            })
            .collect();

        Self {
            username: row.username.clone(),
            name: or_dash(row.name.as_deref()),
            pills: pills.join(", "),
            last_seen: row.last_seen.clone(),
            last_pr: row.last_pr.clone(),
            activated: if row.activated { "yes" } else { "no" }.to_string(),
        }
    }
}

/// Merge command-line filters over the saved query string.
fn location(args: &ListArgs) -> LocationParams {
    let mut params =
        UsersQuery::location_params().with_query(args.query.as_deref().unwrap_or_default());

    let mut changes: Vec<(&str, String)> = Vec::new();
    if let Some(search) = &args.search {
        changes.push(("search", search.clone()));
    }
    if let Some(activated) = args.activated {
        changes.push(("activated", activated.to_string()));
    }
    if let Some(is_admin) = args.is_admin {
        changes.push(("isAdmin", is_admin.to_string()));
    }
    if let Some(ordering) = &args.ordering {
        changes.push(("ordering", ordering.clone()));
    }
    if let Some(page) = args.page {
        changes.push(("page", page.to_string()));
    }
    if let Some(page_size) = args.page_size {
        changes.push(("pageSize", page_size.to_string()));
    }
    params.update_params(changes);
    params
}

pub(crate) async fn handle_users(
    action: UsersAction,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UsersAction::List(args) => list_users(args, ctx).await,
        UsersAction::Activate(args) => set_activation(args, true, ctx).await,
        UsersAction::Deactivate(args) => set_activation(args, false, ctx).await,
    }
}

async fn list_users(args: ListArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let mut params = location(&args);
    let query = UsersQuery::from_location(&params);
    let OwnerArgs { provider, owner } = &args.owner;

    let page = ctx
        .queries
        .fetch(&users_key(provider, owner, &query), || {
            fetch_users(&ctx.api, provider, owner, &query, None)
        })
        .await?;

    let rows = create_users_table_data(provider, &page, chrono::Utc::now());
    let display = rows.iter().map(UserDisplay::from).collect();
    print_rows(display, &rows, args.output, "No users found.")?;

    if matches!(args.output, OutputFormat::Table) {
        println!(
            "{}",
            style(format!(
                "{} users, page {} of {}",
                page.count,
                query.page.unwrap_or(1),
                or_dash(page.total_pages)
            ))
            .dim()
        );
        if page.next.is_some() {
            let next = query.page.unwrap_or(1) + 1;
            params.update_params([("page", next.to_string())]);
            println!(
                "{}",
                style(format!("Next page: --query '{}'", params.to_query_string())).dim()
            );
        }
    }
    Ok(())
}

async fn set_activation(
    args: UpdateArgs,
    activated: bool,
    ctx: &Context,
) -> Result<(), Box<dyn std::error::Error>> {
    let update = UpdateUser {
        provider: args.owner.provider,
        owner: args.owner.owner,
        username: args.username,
        activated,
    };
    let user = update_user(&ctx.api, &ctx.queries, &TracingTelemetry, &update).await?;

    let verb = if user.activated { "activated" } else { "deactivated" };
    println!("{} {}", style(&user.username).bold(), verb);
    Ok(())
}
