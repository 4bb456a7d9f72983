mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::io::{self, IsTerminal};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::comparison::ComparisonRequest;
use crate::error::{AppResult, ErrorKind};
use crate::infra::git::GitCli;
use crate::infra::llm::GeminiClient;
use crate::infra::terminal::TerminalMarkdown;

#[derive(Parser)]
#[command(
    name = "git-refs-summary",
    author,
    version,
    about = "Summarize git diff changes using Gemini AI",
    after_help = "Examples:
  git-refs-summary                        # Show unstaged changes
  git-refs-summary --from main            # Compare with main branch
  git-refs-summary --from HEAD~3          # Compare with 3 commits ago
  git-refs-summary --from v1.0 --to v2.0  # Compare two refs"
)]
struct Cli {
    /// Git reference to diff from (branch, commit SHA, etc). If not provided, shows unstaged changes.
    #[arg(long = "from", value_name = "REF")]
    from_ref: Option<String>,
    /// Git reference to diff to (branch, commit SHA, etc). If not provided, uses current working tree.
    #[arg(long = "to", value_name = "REF")]
    to_ref: Option<String>,
    /// Disable terminal formatting and markdown rendering.
    #[arg(long)]
    no_term: bool,
    /// Gemini model to use instead of GEMINI_MODEL or the default.
    #[arg(long)]
    model: Option<String>,
    /// Log debug details to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Handled failures end the run normally; only argument errors exit non-zero.
    if let Err(error) = run(cli).await {
        match error.kind() {
            ErrorKind::Precondition | ErrorKind::Remote => println!("Error: {error}"),
            ErrorKind::Unexpected => println!("Unexpected error: {error}"),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> AppResult<()> {
    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(&cwd).with_model_override(cli.model);

    let language_model = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    )?);

    if !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let git = Arc::new(GitCli::new(config.workspace_root.clone()));
    let context = AppContext::new(config, git, language_model, Arc::new(TerminalMarkdown::new()));
    let request = ComparisonRequest::new(cli.from_ref, cli.to_ref, !cli.no_term);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    cmd::summary::run(&context, &request, &mut out).await
}
