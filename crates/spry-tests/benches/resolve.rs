use criterion::{criterion_group, criterion_main, Criterion};

use spry_resolve::Resolver;

fn chain_of(n: usize) -> Vec<(String, Vec<String>)> {
    (0..n)
        .map(|i| {
            let implicit = if i == 0 { Vec::new() } else { vec![format!("^task{}$", i - 1)] };
            (format!("task{i}"), implicit)
        })
        .collect()
}

fn bench_deps_small_chain(c: &mut Criterion) {
    let nodes = chain_of(20);
    let owned: Vec<(String, Vec<String>)> = nodes;

    c.bench_function("resolve_deps_chain_20", |b| {
        b.iter(|| {
            let refs: Vec<(&str, &[String])> = owned.iter().map(|(id, deps)| (id.as_str(), deps.as_slice())).collect();
            let (resolver, _errors) = Resolver::new(refs);
            for (id, _) in &owned {
                resolver.deps(id, &[], false);
            }
        });
    });
}

fn bench_cycle_detection(c: &mut Criterion) {
    let nodes = chain_of(50);
    let ids: Vec<String> = nodes.iter().map(|(id, _)| id.clone()).collect();

    c.bench_function("resolve_detect_cycles_chain_50", |b| {
        b.iter(|| {
            let refs: Vec<(&str, &[String])> = nodes.iter().map(|(id, deps)| (id.as_str(), deps.as_slice())).collect();
            let (resolver, _errors) = Resolver::new(refs);
            resolver.detect_cycles(&ids, |_| Vec::new(), false)
        });
    });
}

criterion_group!(benches, bench_deps_small_chain, bench_cycle_detection);
criterion_main!(benches);
