//! Execution stack: trusted template interpolation (C8), DAG planning
//! and scheduling (C7), shell spawning (C9), and the capture subsystem
//! (C10). This crate turns an enriched [`spry_enrich::EnrichmentOutcome`]
//! into a run.

mod capture;
mod dag;
mod error;
mod interpolate;
mod plan;
mod shell;

pub use capture::{
    append_gitignore, apply_captures, capture_instructions, write_capture_file, CaptureInstruction,
    GitignoreOutcome, TaskExecCapture,
};
pub use dag::{execute_dag, DagEvent, RunSummary, RunTaskFuture, TaskStatus};
pub use error::{InterpolateError, PlanError};
pub use interpolate::{InterpolateFailure, InterpolateOutcome, InterpolateStatus, Interpolator, InterpolatorConfig};
pub use plan::{ExecutionPlan, PlannedTask};
pub use shell::{run_shell, ShellEvent};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use spry_enrich::{PartialsRegistry, SpawnablesCatalog};
use spry_types::{CodeCell, Notebook};

/// Per-run state threaded through task execution: a `runId` and the
/// captures produced so far, bound to the interpolator as `ctx` (§4.7:
/// "ctx carries runId and accumulates task-scoped state").
pub struct RunContext {
    pub run_id: String,
    captured: Mutex<HashMap<String, TaskExecCapture>>,
    default_gitignore: PathBuf,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, default_gitignore: impl Into<PathBuf>) -> Self {
        RunContext { run_id: run_id.into(), captured: Mutex::new(HashMap::new()), default_gitignore: default_gitignore.into() }
    }

    /// The binding handed to the interpolator under `ctxName`: `runId`
    /// plus every capture stashed so far, exposed as plain stdout text
    /// (see [`TaskExecCapture`]'s doc comment for why it's flattened
    /// here — this is what makes literal scenario S6's
    /// `captured.payload.json().k` work against the restricted grammar).
    pub fn to_value(&self) -> Value {
        let captured = self.captured.lock().unwrap();
        let captured_obj: serde_json::Map<String, Value> =
            captured.iter().map(|(k, v)| (k.clone(), Value::String(v.stdout.clone()))).collect();
        serde_json::json!({ "runId": self.run_id, "captured": Value::Object(captured_obj) })
    }

    pub fn record_capture(&self, key: String, capture: TaskExecCapture) {
        self.captured.lock().unwrap().insert(key, capture);
    }

    pub fn gitignore_path(&self) -> &Path {
        &self.default_gitignore
    }
}

/// Build an [`ExecutionPlan`] from `catalog` and drive it to completion,
/// running C8 → C9 → C10 for each non-skipped task (§5: interpolation
/// strictly before shell, shell strictly before capture). A task whose
/// shell exit code is nonzero is reported `Fail`; this is the default
/// policy, not a spec mandate (§4.9 leaves the decision to `runTask`) —
/// callers wanting a different policy should compose
/// [`ExecutionPlan::build`]/[`execute_dag`] directly instead of calling
/// this function.
pub async fn run_notebook(
    notebook: &Notebook,
    catalog: &SpawnablesCatalog,
    partials: Arc<PartialsRegistry>,
    ctx: Arc<RunContext>,
    interp_config: InterpolatorConfig,
    mut on_event: impl FnMut(DagEvent) + Send + 'static,
) -> Result<RunSummary, PlanError> {
    let plan = ExecutionPlan::build(catalog, interp_config.use_cache)?;

    let cells: HashMap<String, CodeCell> = notebook
        .code_cells()
        .filter(|c| c.is_spawnable())
        .map(|c| (c.spawnable.as_ref().unwrap().identity.clone(), c.clone()))
        .collect();

    let summary = execute_dag(
        &plan,
        move |task| {
            let cell = cells.get(&task.id).cloned();
            let partials = partials.clone();
            let ctx = ctx.clone();
            let config = interp_config.clone();
            Box::pin(async move { run_one_task(&task.id, cell, &partials, &ctx, &config).await })
        },
        move |event| on_event(event),
    )
    .await;

    Ok(summary)
}

async fn run_one_task(
    id: &str,
    cell: Option<CodeCell>,
    partials: &PartialsRegistry,
    ctx: &RunContext,
    config: &InterpolatorConfig,
) -> TaskStatus {
    let Some(cell) = cell else {
        return TaskStatus::Fail { error: format!("no code cell backs task `{id}`") };
    };
    let Some(pi) = cell.pi.as_ref() else {
        return TaskStatus::Fail { error: format!("task `{id}` has no processing instruction") };
    };

    let source = if pi.has_flag("interpolate", &["I"]) {
        let interpolator = Interpolator::new(ctx.to_value(), config.clone(), partials);
        match interpolator.interpolate(&cell.source, &Value::Object(serde_json::Map::new()), &[]) {
            Ok(outcome) => outcome.text,
            Err(failure) => return TaskStatus::Fail { error: failure.error.to_string() },
        }
    } else {
        cell.source.clone()
    };

    let mut events = Vec::new();
    let capture = match run_shell(id, &cell.language, &source, &mut |e| events.push(e)).await {
        Ok(capture) => capture,
        Err(err) => return TaskStatus::Fail { error: err.to_string() },
    };

    let mut captured: HashMap<String, TaskExecCapture> = HashMap::new();
    if let Err(err) = apply_captures(pi, id, &capture, &mut captured, ctx.gitignore_path()) {
        return TaskStatus::Fail { error: err.to_string() };
    }
    for (key, value) in captured {
        ctx.record_capture(key, value);
    }

    match capture.exit_code {
        Some(0) => TaskStatus::Ok,
        Some(code) => TaskStatus::Fail { error: format!("exited with status {code}") },
        None => TaskStatus::Fail { error: "terminated by signal".to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spry_pi::Pi;
    use spry_types::{CodeCell, DuplicatePolicy, Spawnable};

    fn spawnable_cell(pi_str: &str, source: &str) -> CodeCell {
        let pi = Pi::parse(pi_str, None);
        CodeCell {
            language: "shell".into(),
            info: pi_str.into(),
            attrs: serde_json::Map::new(),
            source: source.into(),
            start_line: 1,
            end_line: 2,
            spawnable: Spawnable::from_pi(pi.clone()),
            pi: Some(pi),
        }
    }

    #[tokio::test]
    async fn s6_capture_chain_feeds_a_downstream_interpolation() {
        let mut notebook = Notebook::new();
        notebook.cells.push(spry_types::Cell::Code(spawnable_cell("gen --capture=payload", "echo '{\"k\":1}'")));
        notebook.cells.push(spry_types::Cell::Code(spawnable_cell(
            "use --dep gen --interpolate",
            "echo ${captured.payload.json().k}",
        )));

        let mut catalog = SpawnablesCatalog::new();
        for cell in notebook.code_cells() {
            catalog.register(cell.spawnable.clone().unwrap(), DuplicatePolicy::Overwrite).unwrap();
        }

        let partials = Arc::new(PartialsRegistry::new());
        let dir = tempfile::tempdir().unwrap();
        let ctx = Arc::new(RunContext::new("run-1", dir.path().join(".gitignore")));

        let summary = run_notebook(
            &notebook,
            &catalog,
            partials,
            ctx,
            InterpolatorConfig::default(),
            |_event| {},
        )
        .await
        .unwrap();

        assert_eq!(summary.statuses.get("gen"), Some(&TaskStatus::Ok));
        assert_eq!(summary.statuses.get("use"), Some(&TaskStatus::Ok));
    }
}
