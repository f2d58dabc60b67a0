/// Implementation of `spry plan`.
///
/// Parses, enriches, and resolves a runbook, then prints the resulting
/// topologically ordered task list with each task's fully merged
/// dependencies.
use anyhow::{anyhow, Result};

use spry_exec::ExecutionPlan;

use crate::config::SpryConfig;
use crate::pipeline::load_enriched;
use crate::PlanArgs;

pub async fn run(args: &PlanArgs) -> Result<()> {
    let config = SpryConfig::load(args.file.parent().unwrap_or_else(|| std::path::Path::new(".")))?;
    let outcome = load_enriched(&args.file, &config).await?;

    let plan = ExecutionPlan::build(&outcome.spawnables, false)
        .map_err(|err| anyhow!("{err}"))?;

    for (i, task) in plan.order.iter().enumerate() {
        if task.deps.is_empty() {
            println!("{i:>3}. {}", task.id);
        } else {
            println!("{i:>3}. {}  (deps: {})", task.id, task.deps.join(", "));
        }
    }

    Ok(())
}
