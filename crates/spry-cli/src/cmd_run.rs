/// Implementation of `spry run`.
///
/// Parses, enriches, and executes a runbook's DAG, optionally restricted
/// to the transitive closure of one or more `--seed` task ids. Prints a
/// per-task status line as the DAG's event bus fires, then a final
/// summary; exits 1 if any task failed.
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use spry_exec::{DagEvent, ExecutionPlan, InterpolatorConfig, RunContext, TaskStatus};

use crate::config::SpryConfig;
use crate::pipeline::load_enriched;
use crate::RunArgs;

pub async fn run(args: &RunArgs) -> Result<()> {
    let dir = args.file.parent().unwrap_or_else(|| std::path::Path::new(".")).to_path_buf();
    let config = SpryConfig::load(&dir)?;
    let outcome = load_enriched(&args.file, &config).await?;

    let interp_config = InterpolatorConfig {
        recursion_limit: config.recursion_limit.unwrap_or(9),
        ..InterpolatorConfig::default()
    };

    let mut plan = ExecutionPlan::build(&outcome.spawnables, false).map_err(|err| anyhow!("{err}"))?;
    if !args.seed.is_empty() {
        plan.order = plan.subplan(&args.seed);
    }

    let partials = Arc::new(outcome.partials);
    let ctx = Arc::new(RunContext::new(run_id(), dir.join(".gitignore")));

    let summary = spry_exec::run_notebook(
        &outcome.notebook,
        &outcome.spawnables,
        Arc::clone(&partials),
        Arc::clone(&ctx),
        interp_config,
        |event| log_event(event),
    )
    .await
    .map_err(|err| anyhow!("{err}"))?;

    let mut failed = false;
    println!("run summary:");
    for (id, status) in &summary.statuses {
        match status {
            TaskStatus::Ok => println!("  {id}: ok"),
            TaskStatus::Fail { error } => {
                failed = true;
                println!("  {id}: fail — {error}");
            }
            TaskStatus::Skip { cause } => println!("  {id}: skip — {cause}"),
        }
    }

    if failed {
        return Err(anyhow!("one or more tasks failed"));
    }
    Ok(())
}

fn log_event(event: DagEvent) {
    match event {
        DagEvent::DagStart => info!("dag:start"),
        DagEvent::TaskStart { id } => info!(task = %id, "task:start"),
        DagEvent::TaskOk { id } => info!(task = %id, "task:ok"),
        DagEvent::TaskFail { id, error } => warn!(task = %id, %error, "task:fail"),
        DagEvent::TaskSkip { id, cause } => warn!(task = %id, %cause, "task:skip"),
        DagEvent::DagEnd { summary } => info!(tasks = summary.statuses.len(), "dag:end"),
    }
}

fn run_id() -> String {
    std::env::var("SPRY_RUN_ID").unwrap_or_else(|_| "local".to_string())
}
