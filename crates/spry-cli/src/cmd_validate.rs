/// Implementation of `spry validate`.
///
/// Runs parse → enrich → plan (which runs the resolver and surfaces any
/// cycles) and reports a checkmark report, or a diagnostic failure
/// line. Exit code 0 on a clean runbook, 1 on any fence issue or cycle.
use anyhow::{anyhow, Result};

use spry_exec::ExecutionPlan;

use crate::config::SpryConfig;
use crate::pipeline::load_enriched;
use crate::ValidateArgs;

pub async fn run(args: &ValidateArgs) -> Result<()> {
    let config = SpryConfig::load(
        args.file.parent().unwrap_or_else(|| std::path::Path::new(".")),
    )?;
    let outcome = load_enriched(&args.file, &config).await?;

    println!("\u{2713} Parse: {} cell(s)", outcome.notebook.cells.len());

    if outcome.notebook.has_fence_issues() {
        println!("\u{2717} Fence issues:");
        for issue in &outcome.notebook.issues {
            println!("    lines {}-{}: {}", issue.start_line, issue.end_line, issue.message);
        }
    } else {
        println!("\u{2713} Fences: no issues");
    }

    println!(
        "\u{2713} Enrichment: {} partial(s), {} spawnable(s)",
        outcome.partials.len(),
        outcome.spawnables.len()
    );

    match ExecutionPlan::build(&outcome.spawnables, false) {
        Ok(plan) => {
            println!("\u{2713} Dependency graph: {} task(s), no cycles", plan.order.len());
        }
        Err(err) => {
            println!("\u{2717} Dependency graph: {err}");
            return Err(anyhow!("validation failed"));
        }
    }

    if outcome.notebook.has_fence_issues() {
        return Err(anyhow!("validation failed"));
    }

    Ok(())
}
