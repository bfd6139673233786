use std::{path::PathBuf, sync::Arc};

use clap::{Args, Parser, Subcommand};
use issue_search::{
    adapters::outbound::memory::{JsonAttributeSource, MemoryTracker},
    IssueSearchService, IssueSearchServiceImpl, SearchLimits, SearchRequest,
};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser)]
#[command(name = "issue-cli", about = "Search issues in a fixture-backed tracker")]
struct Opts {
    /// Key of the fixture user to search as; omit for an anonymous search
    #[arg(long = "as", value_name = "USER_KEY", global = true)]
    user: Option<String>,
    /// Fixture to load instead of the configured one
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
    #[arg(long, default_value = "config", global = true)]
    config_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a filter expression with optional refinements
    Search(SearchArgs),
    /// Requests the user reported in a project
    Requests {
        project: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Issues of a project, optionally narrowed by an extra filter
    Project {
        project: String,
        #[arg(long, default_value = "")]
        filter: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Whether the user can search a project directly
    CanSee { project: String },
}

#[derive(Args)]
struct PageArgs {
    #[arg(long, default_value_t = 0)]
    start: i64,
    #[arg(long)]
    size: Option<i64>,
}

#[derive(Args)]
struct SearchArgs {
    /// Base filter expression, e.g. `project = HELP ORDER BY created DESC`
    #[arg(default_value = "")]
    query: String,
    #[command(flatten)]
    page: PageArgs,
    /// Free-text search term
    #[arg(long)]
    term: Option<String>,
    /// Comma-separated status names
    #[arg(long)]
    status: Option<String>,
    /// Comma-separated priority names
    #[arg(long)]
    priority: Option<String>,
    #[arg(long)]
    sort: Option<String>,
    #[arg(long)]
    direction: Option<String>,
    /// Also compute status and priority facets
    #[arg(long)]
    facets: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();

    let opts = Opts::parse();
    let settings = config::read_config(&opts.config_dir)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.application.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let fixture_path = opts
        .fixture
        .clone()
        .unwrap_or_else(|| settings.application.fixture_path.clone());
    let tracker = Arc::new(MemoryTracker::from_path(&fixture_path)?);
    tracing::info!(
        fixture = %fixture_path.display(),
        issues = tracker.issue_count(),
        "Loaded fixture"
    );

    let caller = match &opts.user {
        Some(key) => Some(
            tracker
                .user(key)
                .ok_or_else(|| anyhow::anyhow!("Unknown user '{key}' in fixture"))?,
        ),
        None => None,
    };

    let limits = SearchLimits::from(&settings.search);
    let default_size = limits.default_page_size as i64;
    let service = IssueSearchServiceImpl::new(
        tracker.clone(),
        tracker.clone(),
        tracker.clone(),
        tracker,
        Arc::new(JsonAttributeSource),
    )
    .with_limits(limits);

    let result = match opts.command {
        Command::Search(args) => {
            let request = SearchRequest {
                query: args.query,
                start_index: args.page.start,
                page_size: args.page.size.unwrap_or(default_size),
                search_term: args.term,
                status_filter: args.status,
                priority_filter: args.priority,
                sort_field: args.sort,
                sort_direction: args.direction,
                include_facets: args.facets,
                caller,
            };
            service.search(request).await?
        }
        Command::Requests { project, page } => {
            service
                .search_project_requests(
                    caller,
                    &project,
                    page.start,
                    page.size.unwrap_or(default_size),
                )
                .await?
        }
        Command::Project {
            project,
            filter,
            page,
        } => {
            service
                .search_project_issues_with_filter(
                    caller,
                    &project,
                    &filter,
                    page.start,
                    page.size.unwrap_or(default_size),
                )
                .await?
        }
        Command::CanSee { project } => {
            let visible = service
                .can_caller_see_project(caller.as_ref(), &project)
                .await;
            println!("{visible}");
            return Ok(());
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
