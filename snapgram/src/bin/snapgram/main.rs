mod output;
mod theme;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use output::{GlobalOptions, OutputFormat, OutputManager};
use snapgram::{Client, SnapgramConfig};
use theme::THEME;

#[derive(Parser)]
#[command(name = "snapgram")]
#[command(version)]
#[command(
    about = "Inspect a snapgram document store through the relationship resolver",
    long_about = r#"Read-only inspection of a snapgram document store.

Every listing goes through the relationship resolver, so creators, saved posts
and comment authors are shown the way the app would render them. References
that fail to resolve are reported as warnings.

Environment Variables:
  REDIS_URL   Backend URL when the config uses "${REDIS_URL}"
  RUST_LOG    Log filter (overrides --verbose)
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Config file (default: .snapgram/config.toml in this or a parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One page of the feed, most recently updated first
    Feed {
        /// Id of the last post of the previous page
        #[arg(long)]
        cursor: Option<String>,
    },

    /// The newest posts
    Recent,

    /// A single post with its creator
    Post { post_id: String },

    /// Full-text search on post captions
    Search { term: String },

    /// A user's saved posts, newest save first
    Saved { user_id: String },

    /// Comments on a post, newest first
    Comments { post_id: String },

    /// A user profile
    User { user_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = execute(cli).await {
        eprintln!("{} {err:#}", "Error:".color(THEME.error).bold());
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn load_config(path: Option<&Path>) -> Result<SnapgramConfig> {
    if let Some(path) = path {
        return SnapgramConfig::load(path).with_context(|| format!("Failed to load {}", path.display()));
    }
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    match SnapgramConfig::discover(&current_dir)? {
        Some((path, config)) => {
            log::debug!("using config at {}", path.display());
            Ok(config)
        }
        None => {
            log::debug!("no .snapgram/config.toml found, using defaults");
            Ok(SnapgramConfig::default())
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        no_color: cli.no_color,
    });
    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = load_config(cli.config.as_deref())?;
    let mut client = Client::connect(&config)
        .await
        .context("Failed to connect to the backend")?;
    let mut issues = client.diagnostics_channel();

    match cli.command {
        Commands::Feed { cursor } => {
            let page = client.get_infinite_posts(cursor.as_deref()).await?;
            output.display(&page)?;
            if let Some(next) = page.next_cursor(client.feed().page_size) {
                output.info(&format!("Next page: snapgram feed --cursor {next}"));
            }
        }
        Commands::Recent => {
            output.display(&client.get_recent_posts().await?)?;
        }
        Commands::Post { post_id } => {
            output.display(&client.get_post_by_id(&post_id).await?)?;
        }
        Commands::Search { term } => {
            let results = client.search_posts(&term).await?;
            output.display(&results)?;
            output.info(&format!("{} matching posts", results.total));
        }
        Commands::Saved { user_id } => {
            output.display(&client.get_saved_posts(&user_id).await?)?;
        }
        Commands::Comments { post_id } => {
            output.display(&client.get_post_comments(&post_id).await?)?;
        }
        Commands::User { user_id } => {
            output.display(&client.get_user_by_id(&user_id).await?)?;
        }
    }

    while let Ok(issue) = issues.try_recv() {
        output.issue(&issue);
    }
    Ok(())
}
