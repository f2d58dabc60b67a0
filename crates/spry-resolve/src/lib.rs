//! C6 dependency resolver: merges explicit per-task dependencies with
//! implicit ones inferred from regex patterns declared by other tasks,
//! and detects cycles over the merged graph.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexSet;
use regex::Regex;

/// A regex source on a node's `--injected-dep` that failed to compile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverError {
    pub task_id: String,
    pub regex: String,
}

struct CompiledNode {
    id: String,
    regexes: Vec<Regex>,
}

/// Rewrite the special `"*"` source to `.*` per §4.6.
fn normalize_pattern(pattern: &str) -> String {
    if pattern == "*" { ".*".to_string() } else { pattern.to_string() }
}

/// Holds the catalog of nodes (with their compiled implicit-dep
/// regexes) for one run. Regex compilation happens once, at
/// construction — "established once per node per run and never
/// recomputed" (§5).
pub struct Resolver {
    nodes: Vec<CompiledNode>,
    deps_cache: RefCell<HashMap<String, Vec<String>>>,
}

impl Resolver {
    /// Build a resolver from `(id, implicit-dep regex sources)` pairs,
    /// in catalog iteration order. Unparseable regex sources are
    /// dropped from that node's compiled set and reported in the
    /// returned error list (§4.6, §7 ResolverError).
    pub fn new<'a>(nodes: impl IntoIterator<Item = (&'a str, &'a [String])>) -> (Self, Vec<ResolverError>) {
        let mut compiled = Vec::new();
        let mut errors = Vec::new();

        for (id, patterns) in nodes {
            let mut regexes = Vec::new();
            for pattern in patterns {
                let normalized = normalize_pattern(pattern);
                match Regex::new(&normalized) {
                    Ok(re) => regexes.push(re),
                    Err(_) => errors.push(ResolverError { task_id: id.to_string(), regex: pattern.clone() }),
                }
            }
            compiled.push(CompiledNode { id: id.to_string(), regexes });
        }

        (Resolver { nodes: compiled, deps_cache: RefCell::new(HashMap::new()) }, errors)
    }

    /// Nodes (other than `task_id` itself) whose implicit-dep regex
    /// matches `task_id`, excluding anything already in `explicit_deps`,
    /// in catalog iteration order.
    pub fn implicit_deps(&self, task_id: &str, explicit_deps: &[String]) -> Vec<String> {
        let explicit: IndexSet<&str> = explicit_deps.iter().map(String::as_str).collect();
        let mut implicit = Vec::new();
        let mut seen: IndexSet<&str> = IndexSet::new();

        for node in &self.nodes {
            if node.id == task_id {
                continue;
            }
            let matches = node.regexes.iter().any(|re| re.is_match(task_id));
            if matches && !explicit.contains(node.id.as_str()) && !seen.contains(node.id.as_str()) {
                seen.insert(node.id.as_str());
                implicit.push(node.id.clone());
            }
        }

        implicit
    }

    /// `Array.from(new Set([...implicit, ...explicit]))`: implicit
    /// deps first, explicit deps after, duplicates removed keeping
    /// first occurrence (§4.6, testable property 3).
    pub fn deps(&self, task_id: &str, explicit_deps: &[String], use_cache: bool) -> Vec<String> {
        if use_cache {
            if let Some(cached) = self.deps_cache.borrow().get(task_id) {
                return cached.clone();
            }
        }

        let implicit = self.implicit_deps(task_id, explicit_deps);
        let mut merged: IndexSet<String> = implicit.into_iter().collect();
        merged.extend(explicit_deps.iter().cloned());
        let result: Vec<String> = merged.into_iter().collect();

        if use_cache {
            self.deps_cache.borrow_mut().insert(task_id.to_string(), result.clone());
        }
        result
    }

    /// Three-color DFS cycle detection over the merged dependency
    /// graph. `get_explicit` supplies one node's explicit deps;
    /// implicit edges are filled in from this resolver's own catalog.
    pub fn detect_cycles(&self, all_ids: &[String], get_explicit: impl Fn(&str) -> Vec<String>, use_cache: bool) -> Vec<Vec<String>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color: HashMap<&str, Color> = all_ids.iter().map(|id| (id.as_str(), Color::White)).collect();
        let mut stack: Vec<String> = Vec::new();
        let mut cycles: Vec<Vec<String>> = Vec::new();

        fn visit<'a>(
            resolver: &Resolver,
            id: &'a str,
            get_explicit: &impl Fn(&str) -> Vec<String>,
            use_cache: bool,
            color: &mut HashMap<&'a str, Color>,
            stack: &mut Vec<String>,
            cycles: &mut Vec<Vec<String>>,
            all_ids: &'a [String],
        ) {
            color.insert(id, Color::Gray);
            stack.push(id.to_string());

            let explicit = get_explicit(id);
            let edges = resolver.deps(id, &explicit, use_cache);
            for dep in &edges {
                match color.get(dep.as_str()).copied() {
                    Some(Color::Gray) => {
                        if let Some(pos) = stack.iter().position(|s| s == dep) {
                            cycles.push(stack[pos..].to_vec());
                        }
                    }
                    Some(Color::White) => {
                        if let Some(dep_id) = all_ids.iter().find(|candidate| candidate.as_str() == dep.as_str()) {
                            visit(resolver, dep_id.as_str(), get_explicit, use_cache, color, stack, cycles, all_ids);
                        }
                    }
                    _ => {}
                }
            }

            stack.pop();
            color.insert(id, Color::Black);
        }

        for id in all_ids {
            if color.get(id.as_str()).copied() == Some(Color::White) {
                visit(self, id.as_str(), &get_explicit, use_cache, &mut color, &mut stack, &mut cycles, all_ids);
            }
        }

        cycles
    }
}
