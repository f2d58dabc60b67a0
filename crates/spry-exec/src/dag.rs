//! C7 part 2: single-threaded cooperative execution over an
//! [`ExecutionPlan`], with skip propagation and a typed event stream
//! (§4.7, §5).

use std::collections::HashMap;

use futures::future::BoxFuture;

use crate::plan::{ExecutionPlan, PlannedTask};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    Ok,
    Fail { error: String },
    Skip { cause: String },
}

#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub statuses: HashMap<String, TaskStatus>,
}

#[derive(Clone, Debug)]
pub enum DagEvent {
    DagStart,
    TaskStart { id: String },
    TaskOk { id: String },
    TaskFail { id: String, error: String },
    TaskSkip { id: String, cause: String },
    DagEnd { summary: RunSummary },
}

pub type RunTaskFuture = BoxFuture<'static, TaskStatus>;

/// Awaits each task of `plan.order` in turn; no two tasks run
/// concurrently. A task with any dependency that did not finish `Ok` is
/// marked `Skip` without being handed to `run_task` at all — never
/// retried, never silently promoted to `Ok` (testable property 5).
pub async fn execute_dag(
    plan: &ExecutionPlan,
    mut run_task: impl FnMut(PlannedTask) -> RunTaskFuture,
    mut on_event: impl FnMut(DagEvent),
) -> RunSummary {
    on_event(DagEvent::DagStart);
    let mut statuses: HashMap<String, TaskStatus> = HashMap::new();

    for task in &plan.order {
        let blockers: Vec<&str> = task
            .deps
            .iter()
            .filter(|d| !matches!(statuses.get(d.as_str()), Some(TaskStatus::Ok)))
            .map(String::as_str)
            .collect();

        if !blockers.is_empty() {
            let cause = format!("blocked by: {}", blockers.join(", "));
            on_event(DagEvent::TaskSkip { id: task.id.clone(), cause: cause.clone() });
            statuses.insert(task.id.clone(), TaskStatus::Skip { cause });
            continue;
        }

        on_event(DagEvent::TaskStart { id: task.id.clone() });
        let status = run_task(task.clone()).await;
        match &status {
            TaskStatus::Ok => on_event(DagEvent::TaskOk { id: task.id.clone() }),
            TaskStatus::Fail { error } => {
                on_event(DagEvent::TaskFail { id: task.id.clone(), error: error.clone() })
            }
            TaskStatus::Skip { cause } => {
                on_event(DagEvent::TaskSkip { id: task.id.clone(), cause: cause.clone() })
            }
        }
        statuses.insert(task.id.clone(), status);
    }

    let summary = RunSummary { statuses };
    on_event(DagEvent::DagEnd { summary: summary.clone() });
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use spry_enrich::SpawnablesCatalog;
    use spry_pi::Pi;
    use spry_types::{DuplicatePolicy, Spawnable};

    fn catalog_from(specs: &[(&str, &str)]) -> SpawnablesCatalog {
        let mut catalog = SpawnablesCatalog::new();
        for (id, pi_str) in specs {
            let pi = Pi::parse(format!("{id} {pi_str}").as_str(), None);
            catalog.register(Spawnable::from_pi(pi).unwrap(), DuplicatePolicy::Overwrite).unwrap();
        }
        catalog
    }

    #[tokio::test]
    async fn failed_dependency_skips_the_dependent_and_never_runs_it() {
        let catalog = catalog_from(&[("fetch", ""), ("build", "--dep fetch")]);
        let plan = ExecutionPlan::build(&catalog, false).unwrap();

        let ran: std::sync::Arc<std::sync::Mutex<Vec<String>>> = Default::default();
        let ran_clone = ran.clone();
        let mut events = Vec::new();

        let summary = execute_dag(
            &plan,
            move |task| {
                let ran = ran_clone.clone();
                Box::pin(async move {
                    ran.lock().unwrap().push(task.id.clone());
                    if task.id == "fetch" {
                        TaskStatus::Fail { error: "boom".to_string() }
                    } else {
                        TaskStatus::Ok
                    }
                })
            },
            |event| events.push(event),
        )
        .await;

        assert_eq!(ran.lock().unwrap().as_slice(), &["fetch".to_string()]);
        assert!(matches!(summary.statuses.get("build"), Some(TaskStatus::Skip { .. })));
        assert!(matches!(summary.statuses.get("fetch"), Some(TaskStatus::Fail { .. })));
    }

    #[tokio::test]
    async fn independent_tasks_both_run_to_completion() {
        let catalog = catalog_from(&[("a", ""), ("b", "")]);
        let plan = ExecutionPlan::build(&catalog, false).unwrap();
        let summary = execute_dag(
            &plan,
            |_task| Box::pin(async { TaskStatus::Ok }),
            |_event| {},
        )
        .await;
        assert_eq!(summary.statuses.get("a"), Some(&TaskStatus::Ok));
        assert_eq!(summary.statuses.get("b"), Some(&TaskStatus::Ok));
    }
}
