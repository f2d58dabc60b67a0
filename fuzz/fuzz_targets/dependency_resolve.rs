#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use spry_resolve::Resolver;

// Fuzz target: Resolver::new + detect_cycles over an arbitrary set of
// node ids and injected-dep regex sources.
//
// Catches bugs in:
// - Regex compile failures that should degrade to a ResolverError, not a panic
// - Cycle detection on self-referential or mutually-referential graphs
// - The `"*"` -> `.*` rewrite on adversarial pattern strings
#[derive(Debug, Arbitrary)]
struct FuzzNode {
    id: String,
    patterns: Vec<String>,
    explicit: Vec<String>,
}

#[derive(Debug, Arbitrary)]
struct FuzzGraph {
    nodes: Vec<FuzzNode>,
}

fuzz_target!(|graph: FuzzGraph| {
    let nodes: Vec<FuzzNode> = graph.nodes.into_iter().take(32).collect();
    if nodes.is_empty() {
        return;
    }

    let owned: Vec<(String, Vec<String>)> = nodes.iter().map(|n| (n.id.clone(), n.patterns.clone())).collect();
    let refs: Vec<(&str, &[String])> = owned.iter().map(|(id, patterns)| (id.as_str(), patterns.as_slice())).collect();
    let (resolver, _errors) = Resolver::new(refs);

    let ids: Vec<String> = owned.iter().map(|(id, _)| id.clone()).collect();
    let explicit_by_id: std::collections::HashMap<&str, &[String]> =
        nodes.iter().map(|n| (n.id.as_str(), n.explicit.as_slice())).collect();

    let _ = resolver.detect_cycles(&ids, |id| explicit_by_id.get(id).map(|d| d.to_vec()).unwrap_or_default(), false);
    for id in &ids {
        let explicit = explicit_by_id.get(id.as_str()).map(|d| d.to_vec()).unwrap_or_default();
        let _ = resolver.deps(id, &explicit, false);
    }
});
