//! C7 part 1: turning a spawnables catalog into a topologically ordered
//! execution plan. Cycle detection happens once, here, at construction
//! time — the executor never has to think about cycles again.

use std::collections::{HashMap, HashSet};

use spry_enrich::SpawnablesCatalog;
use spry_resolve::Resolver;

use crate::error::PlanError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedTask {
    pub id: String,
    pub deps: Vec<String>,
}

/// A topologically ordered view over one run's spawnables, with deps
/// fully merged (implicit ∪ explicit, per [`spry_resolve::Resolver`]).
pub struct ExecutionPlan {
    pub order: Vec<PlannedTask>,
}

impl ExecutionPlan {
    /// Build the plan. `use_cache` is forwarded to the resolver's
    /// per-task deps memoization (§5: "established once per node per
    /// run").
    pub fn build(catalog: &SpawnablesCatalog, use_cache: bool) -> Result<Self, PlanError> {
        let ids: Vec<String> = catalog.iter().map(|s| s.identity.clone()).collect();

        let implicit_sources: Vec<(String, Vec<String>)> = catalog
            .iter()
            .map(|s| (s.identity.clone(), s.pi.get_text_flag_values("injected-dep", &[])))
            .collect();
        let node_refs: Vec<(&str, &[String])> =
            implicit_sources.iter().map(|(id, v)| (id.as_str(), v.as_slice())).collect();
        let (resolver, _resolver_errors) = Resolver::new(node_refs);

        let explicit_of: HashMap<String, Vec<String>> = catalog
            .iter()
            .map(|s| (s.identity.clone(), s.pi.get_text_flag_values("dep", &[])))
            .collect();

        let get_explicit = |id: &str| explicit_of.get(id).cloned().unwrap_or_default();
        let cycles = resolver.detect_cycles(&ids, get_explicit, use_cache);
        if !cycles.is_empty() {
            return Err(PlanError { cycles });
        }

        let deps_of: HashMap<String, Vec<String>> = ids
            .iter()
            .map(|id| {
                let explicit = explicit_of.get(id).cloned().unwrap_or_default();
                (id.clone(), resolver.deps(id, &explicit, use_cache))
            })
            .collect();

        let order = topo_sort(&ids, &deps_of);
        Ok(ExecutionPlan { order })
    }

    /// `executionSubplan`: restrict this plan to the transitive closure
    /// of `seed_ids`, preserving the original topological order.
    pub fn subplan(&self, seed_ids: &[String]) -> Vec<PlannedTask> {
        let by_id: HashMap<&str, &PlannedTask> = self.order.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut keep: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = seed_ids.to_vec();
        while let Some(id) = stack.pop() {
            if keep.insert(id.clone()) {
                if let Some(task) = by_id.get(id.as_str()) {
                    stack.extend(task.deps.iter().cloned());
                }
            }
        }
        self.order.iter().filter(|t| keep.contains(&t.id)).cloned().collect()
    }
}

/// Dependencies-before-dependents DFS over the merged graph, visiting
/// catalog ids in their original order. `ExecutionPlan::build` has
/// already ruled out cycles by the time this runs.
fn topo_sort(ids: &[String], deps_of: &HashMap<String, Vec<String>>) -> Vec<PlannedTask> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut order: Vec<PlannedTask> = Vec::new();

    fn visit(
        id: &str,
        ids: &[String],
        deps_of: &HashMap<String, Vec<String>>,
        visited: &mut HashSet<String>,
        order: &mut Vec<PlannedTask>,
    ) {
        if !visited.insert(id.to_string()) {
            return;
        }
        let deps = deps_of.get(id).cloned().unwrap_or_default();
        for dep in &deps {
            if ids.iter().any(|candidate| candidate == dep) {
                visit(dep, ids, deps_of, visited, order);
            }
        }
        order.push(PlannedTask { id: id.to_string(), deps });
    }

    for id in ids {
        visit(id, ids, deps_of, &mut visited, &mut order);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use spry_pi::Pi;
    use spry_types::Spawnable;

    fn catalog_from(specs: &[(&str, &str)]) -> SpawnablesCatalog {
        let mut catalog = SpawnablesCatalog::new();
        for (id, pi_str) in specs {
            let pi = Pi::parse(format!("{id} {pi_str}").as_str(), None);
            let spawnable = Spawnable::from_pi(pi).unwrap();
            catalog.register(spawnable, spry_types::DuplicatePolicy::Overwrite).unwrap();
        }
        catalog
    }

    #[test]
    fn dependencies_precede_dependents() {
        let catalog = catalog_from(&[("fetch", ""), ("build", "--dep fetch"), ("test", "--dep build")]);
        let plan = ExecutionPlan::build(&catalog, false).unwrap();
        let positions: HashMap<&str, usize> =
            plan.order.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
        assert!(positions["fetch"] < positions["build"]);
        assert!(positions["build"] < positions["test"]);
    }

    #[test]
    fn s5_cycle_is_reported_at_build_time() {
        let catalog = catalog_from(&[("A", "--dep B"), ("B", "--dep A")]);
        let err = ExecutionPlan::build(&catalog, false).unwrap_err();
        assert_eq!(err.cycles.len(), 1);
    }

    #[test]
    fn subplan_keeps_only_the_transitive_closure_of_the_seed() {
        let catalog = catalog_from(&[("fetch", ""), ("build", "--dep fetch"), ("unrelated", "")]);
        let plan = ExecutionPlan::build(&catalog, false).unwrap();
        let sub = plan.subplan(&["build".to_string()]);
        let ids: HashSet<&str> = sub.iter().map(|t| t.id.as_str()).collect();
        assert!(ids.contains("fetch"));
        assert!(ids.contains("build"));
        assert!(!ids.contains("unrelated"));
    }
}
