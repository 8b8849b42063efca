use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use composer_sync::config::load_settings;

mod commands;

use commands::{GenerateArgs, ListArgs, RunArgs};

#[derive(Parser)]
#[command(
    name = "composer-sync",
    about = "Keeps a WordPress site's composer.json in sync with its plugins directory",
    version,
    author,
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Settings file layered over the built-in defaults [default: composer-sync.yml if present]
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    /// Enable verbose output (use -vv for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the manifest and open a pull request (default command)
    Run(RunArgs),

    /// Build composer.json locally without touching git or GitHub
    Generate(GenerateArgs),

    /// Show how each installed plugin resolves
    List(ListArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Action failed because of: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.settings.as_deref())?;

    match cli.command {
        Some(Commands::Run(args)) => commands::run_command(args, &settings).await,
        Some(Commands::Generate(args)) => commands::generate_command(args, &settings).await,
        Some(Commands::List(args)) => commands::list_command(args, &settings).await,
        // Default to run, as the GitHub Action invokes the binary without arguments
        None => commands::run_command(cli.run, &settings).await,
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let default = match (quiet, verbose) {
        (true, _) => "composer_sync=warn",
        (false, 0) => "composer_sync=info",
        (false, 1) => "composer_sync=debug",
        _ => "composer_sync=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
