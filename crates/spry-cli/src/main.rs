/// Spry command-line tool — parse, enrich, resolve, and run Markdown
/// runbooks.
///
/// ```text
/// spry <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print a cell-by-cell summary of a runbook
///   validate   Parse + enrich + resolve, report issues and cycles
///   plan       Print the resolved topological task order
///   run        Execute the DAG, optionally from one or more --seed tasks
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Enable verbose (debug-level) logging
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                          |
/// |------|---------------------------------------------------|
/// | 0    | Success                                            |
/// | 1    | Validation failure, cycle, or one or more task failures |
///
/// All diagnostics are written to stderr so stdout stays pipeable.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod cmd_inspect;
mod cmd_plan;
mod cmd_run;
mod cmd_validate;
mod config;
mod pipeline;

#[derive(Parser)]
#[command(name = "spry", version, about = "Markdown-to-executable-runbook engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a cell-by-cell summary of a runbook.
    Inspect(InspectArgs),
    /// Parse, enrich, and resolve a runbook; report issues and cycles.
    Validate(ValidateArgs),
    /// Print the resolved topological task order.
    Plan(PlanArgs),
    /// Execute a runbook's DAG.
    Run(RunArgs),
}

#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the runbook Markdown file.
    pub file: PathBuf,

    /// Include each code cell's source body in the output.
    #[arg(long)]
    pub show_source: bool,
}

#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Path to the runbook Markdown file.
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct PlanArgs {
    /// Path to the runbook Markdown file.
    pub file: PathBuf,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to the runbook Markdown file.
    pub file: PathBuf,

    /// Restrict execution to the transitive closure of these task ids
    /// (repeatable). Omit to run every spawnable task.
    #[arg(long)]
    pub seed: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!("spry={level}")))
        .try_init();

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args).await,
        Commands::Plan(args) => cmd_plan::run(&args).await,
        Commands::Run(args) => cmd_run::run(&args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
