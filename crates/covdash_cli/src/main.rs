use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::{Term, style};
use covdash::{ApiClient, QueryClient};
use tracing_subscriber::EnvFilter;

use crate::commands::account::PlanArgs;
use crate::commands::commits::CommitsArgs;
use crate::commands::pulls::{FlagsArgs, PullsArgs};
use crate::commands::repo::{FilesArgs, RepoShowArgs};
use crate::commands::shared::{Context, OutputFormat};
use crate::commands::users::UsersAction;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "covdash")]
#[command(version)]
#[command(about = "Coverage dashboard in the terminal")]
#[command(
    long_about = "Covdash reads commits, pull requests, flags, files and members from a \
coverage backend and renders them as the same tables the web dashboard shows."
)]
#[command(after_long_help = r#"EXAMPLES
    Latest commits of a repository:
        $ covdash commits gh codecov gazebo

    Commits of a pull request, three pages deep, as JSON:
        $ covdash commits gh codecov gazebo --pull 1234 --pages 3 -o json

    Open and merged pull requests:
        $ covdash pulls gh codecov gazebo --state open --state merged

    Flag coverage of a pull request:
        $ covdash flags gh codecov gazebo 1234

    Deactivated members, searched by name:
        $ covdash users list gh codecov --activated false --search laudna

CONFIGURATION
    Covdash reads configuration from:
      1. ~/.config/covdash/config.toml (or $XDG_CONFIG_HOME/covdash/config.toml)
      2. ./covdash.toml
      3. Environment variables (COVDASH_* prefix, e.g., COVDASH_GITHUB_TOKEN)
      4. .env file in current directory
    --api-url, --timeout and --stale override all of these.

ENVIRONMENT VARIABLES
    COVDASH_API_URL           Backend base URL (default: https://api.codecov.io)
    COVDASH_API_TIMEOUT       Request timeout in seconds (default: 30)
    COVDASH_GITHUB_TOKEN      Token sent for gh/github requests
    COVDASH_GITLAB_TOKEN      Token sent for gl/gitlab requests
    COVDASH_BITBUCKET_TOKEN   Token sent for bb/bitbucket requests
    RUST_LOG                  Log filter (default: covdash=info,covdash_cli=info)
"#)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend base URL, overriding the configured one
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Seconds a fetched result is reused within this run
    #[arg(long, global = true, value_name = "SECONDS")]
    stale: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show repository details
    Repo(RepoShowArgs),
    /// Browse file coverage on a branch
    Files(FilesArgs),
    /// List commits with coverage, patch and change
    Commits(CommitsArgs),
    /// List pull requests with patch coverage
    Pulls(PullsArgs),
    /// Per-flag coverage of a pull request
    Flags(FlagsArgs),
    /// List and manage members
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    /// Plan usage of an owner
    Plan(PlanArgs),
    /// Login providers enabled on the instance
    Providers {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

fn init_tracing(verbose: bool) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("covdash=debug,covdash_cli=debug"),
        Err(_) => EnvFilter::new("covdash=info,covdash_cli=info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(Term::stderr().is_term())
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (config file -> env vars -> flags)
    let config = config::Config::load().with_overrides(config::Overrides {
        api_url: cli.api_url,
        timeout: cli.timeout,
        stale: cli.stale,
    });

    let api = ApiClient::new(&config.api_config(), Arc::new(config.credentials()))?;
    let ctx = Context {
        api,
        queries: Arc::new(QueryClient::new(config.query_options())),
    };

    match cli.command {
        Commands::Repo(args) => commands::repo::handle_repo(args, &ctx).await,
        Commands::Files(args) => commands::repo::handle_files(args, &ctx).await,
        Commands::Commits(args) => commands::commits::handle_commits(args, &ctx).await,
        Commands::Pulls(args) => commands::pulls::handle_pulls(args, &ctx).await,
        Commands::Flags(args) => commands::pulls::handle_flags(args, &ctx).await,
        Commands::Users { action } => commands::users::handle_users(action, &ctx).await,
        Commands::Plan(args) => commands::account::handle_plan(args, &ctx).await,
        Commands::Providers { output } => commands::account::handle_providers(output, &ctx).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}
