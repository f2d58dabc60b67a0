//! Conformance tests for the end-to-end literal scenarios and the
//! cross-cutting invariants.
//!
//! Each `sN_*` test below corresponds one-for-one to a literal scenario;
//! each `property_*` test exercises one of the numbered invariants.
//! These run against the public crate APIs directly rather than through
//! the `spry` binary, since the binary is a thin wrapper around them.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;

use spry_exec::{DagEvent, ExecutionPlan, InterpolateStatus, InterpolatorConfig, Interpolator, RunContext, TaskStatus};
use spry_parser::parse_notebook;
use spry_pi::Pi;
use spry_resolve::Resolver;
use spry_types::{DuplicatePolicy, Partial, Source};

fn enrich_source(markdown: &str) -> spry_enrich::EnrichmentOutcome {
    let source = Source::prime(markdown);
    let notebook = parse_notebook(&source);
    let spec_config = spry_enrich::SpecBlockConfig::default();
    let spawnable_config = spry_enrich::SpawnableConfig::with_seed_languages();
    let read_file = |p: &std::path::Path| std::fs::read_to_string(p);
    spry_enrich::enrich(notebook, &spec_config, &spawnable_config, DuplicatePolicy::Throw, &read_file)
        .expect("enrichment should succeed")
}

// ── S1 — Fence partitioning ───────────────────────────────────────────────────

#[test]
fn s1_fence_partitioning() {
    let markdown = "---\ntitle: X\n---\n\nSome narrative.\n\n```sql INFO {\"id\":1,\"dryRun\":true}\nSELECT 1;\n```\n";
    let source = Source::prime(markdown);
    let notebook = parse_notebook(&source);

    let kinds: Vec<&str> = notebook
        .cells
        .iter()
        .map(|c| if c.as_code().is_some() { "code" } else { "markdown" })
        .collect();
    assert_eq!(kinds, vec!["markdown", "code"]);

    let code = notebook.cells[1].as_code().unwrap();
    assert_eq!(code.language, "sql");
    assert_eq!(code.info, "INFO");
    assert_eq!(code.attrs.get("id"), Some(&json!(1)));
    assert_eq!(code.attrs.get("dryRun"), Some(&json!(true)));
    assert_eq!(code.source, "SELECT 1;\n");
}

// ── S2 — Malformed attrs ──────────────────────────────────────────────────────

#[test]
fn s2_malformed_attrs_degrades_to_empty_map_and_an_issue() {
    let markdown = "---\ntitle: X\n---\n\nSome narrative.\n\n```sql INFO {id 1}\nSELECT 1;\n```\n";
    let source = Source::prime(markdown);
    let notebook = parse_notebook(&source);

    let code = notebook.cells[1].as_code().unwrap();
    assert!(code.attrs.is_empty());
    assert!(notebook.has_fence_issues());
}

// ── S3 — POSIX tokenization ───────────────────────────────────────────────────

#[test]
fn s3_posix_tokenization() {
    let pi = Pi::parse(r#"build "src/main.ts" --out=dist --tag a --tag "b c" -v"#, None);
    assert_eq!(pi.bare, vec!["build".to_string(), "src/main.ts".to_string()]);
    assert_eq!(pi.get_text_flag("out", &[]), Some("dist".to_string()));
    assert_eq!(pi.get_text_flag_values("tag", &[]), vec!["a".to_string(), "b c".to_string()]);
    assert!(pi.get_bool_flag("v", &[]));
}

// ── S4 — Implicit deps ────────────────────────────────────────────────────────

#[test]
fn s4_implicit_deps() {
    let injected = vec!["^build.*".to_string()];
    let empty: Vec<String> = Vec::new();
    let nodes = vec![("A", injected.as_slice()), ("buildX", empty.as_slice()), ("test", empty.as_slice())];
    let (resolver, errors) = Resolver::new(nodes);
    assert!(errors.is_empty());

    let build_x_deps = resolver.deps("buildX", &[], false);
    assert!(build_x_deps.contains(&"A".to_string()));

    let test_deps = resolver.deps("test", &[], false);
    assert!(!test_deps.contains(&"A".to_string()));
}

// ── S5 — Cycle ────────────────────────────────────────────────────────────────

#[test]
fn s5_cycle_detection() {
    let ids = vec!["A".to_string(), "B".to_string()];
    let explicit: HashMap<&str, Vec<String>> = HashMap::from([("A", vec!["B".to_string()]), ("B", vec!["A".to_string()])]);

    let empty: Vec<String> = Vec::new();
    let nodes = vec![("A", empty.as_slice()), ("B", empty.as_slice())];
    let (resolver, _) = Resolver::new(nodes);

    let cycles = resolver.detect_cycles(&ids, |id| explicit.get(id).cloned().unwrap_or_default(), false);
    assert_eq!(cycles.len(), 1);
    let cycle = &cycles[0];
    assert!(cycle.contains(&"A".to_string()));
    assert!(cycle.contains(&"B".to_string()));
}

// ── S6 — Capture chain ────────────────────────────────────────────────────────

#[tokio::test]
async fn s6_capture_chain() {
    let markdown = "```shell\ngen --capture=payload\necho '{\"k\":1}'\n```\n\n```shell\nuse --dep gen --interpolate\necho ${captured.payload.json().k}\n```\n";

    let outcome = enrich_source(markdown);
    let partials = Arc::new(outcome.partials);
    let ctx = Arc::new(RunContext::new("s6", std::env::temp_dir().join("spry-s6-gitignore")));

    let summary = spry_exec::run_notebook(
        &outcome.notebook,
        &outcome.spawnables,
        Arc::clone(&partials),
        Arc::clone(&ctx),
        InterpolatorConfig::default(),
        |_event: DagEvent| {},
    )
    .await
    .expect("plan should build");

    assert_eq!(summary.statuses.get("gen"), Some(&TaskStatus::Ok));
    assert_eq!(summary.statuses.get("use"), Some(&TaskStatus::Ok));
}

// ── Property 2 — PI flag laws ─────────────────────────────────────────────────

#[test]
fn property_2_reparsing_a_reserialized_pi_is_a_fixed_point() {
    let pi = Pi::parse(r#"build --out=dist --tag a --tag "b c" -v"#, None);
    let reserialized = pi.reserialize();
    let reparsed = Pi::parse(reserialized.as_str(), None);
    assert_eq!(pi, reparsed);
}

#[test]
fn property_2_repeated_boolean_flag_yields_an_n_length_true_list() {
    let pi = Pi::parse("task -v -v -v", None);
    assert_eq!(pi.get_text_flag_values("v", &[]), vec!["true", "true", "true"]);
}

// ── Property 3 — Dependency closure ───────────────────────────────────────────

#[test]
fn property_3_deps_is_implicit_union_explicit_implicit_first_no_duplicates() {
    let injected = vec!["^t.*".to_string()];
    let empty: Vec<String> = Vec::new();
    let nodes = vec![("setup", injected.as_slice()), ("t1", empty.as_slice())];
    let (resolver, _) = Resolver::new(nodes);

    let explicit = vec!["setup".to_string()];
    let deps = resolver.deps("t1", &explicit, false);
    assert_eq!(deps, vec!["setup".to_string()]);
}

// ── Property 4 — Topological soundness ────────────────────────────────────────

#[test]
fn property_4_every_dependency_precedes_its_dependent_in_plan_order() {
    let markdown = "```shell\nfetch\ncurl https://example.com\n```\n\n```shell\nbuild --dep fetch\nmake\n```\n";
    let outcome = enrich_source(markdown);
    let plan = ExecutionPlan::build(&outcome.spawnables, false).unwrap();

    let position = |id: &str| plan.order.iter().position(|t| t.id == id).unwrap();
    assert!(position("fetch") < position("build"));
}

// ── Property 5 — Skip propagation ─────────────────────────────────────────────

#[tokio::test]
async fn property_5_failed_dependency_skips_its_dependent() {
    let markdown = "```shell\nfail_task\nexit 1\n```\n\n```shell\ndownstream --dep fail_task\necho should-not-run\n```\n";
    let outcome = enrich_source(markdown);
    let partials = Arc::new(outcome.partials);
    let ctx = Arc::new(RunContext::new("property5", std::env::temp_dir().join("spry-p5-gitignore")));

    let summary = spry_exec::run_notebook(
        &outcome.notebook,
        &outcome.spawnables,
        Arc::clone(&partials),
        Arc::clone(&ctx),
        InterpolatorConfig::default(),
        |_event: DagEvent| {},
    )
    .await
    .unwrap();

    assert!(matches!(summary.statuses.get("fail_task"), Some(TaskStatus::Fail { .. })));
    assert!(matches!(summary.statuses.get("downstream"), Some(TaskStatus::Skip { .. })));
}

// ── Property 6 — Capture visibility ───────────────────────────────────────────

#[test]
fn property_6_captured_key_is_readable_by_interpolation() {
    let ctx = RunContext::new("property6", std::env::temp_dir().join("spry-p6-gitignore"));
    ctx.record_capture(
        "payload".to_string(),
        spry_exec::TaskExecCapture { stdout: "{\"k\":1}".to_string(), stderr: String::new(), exit_code: Some(0) },
    );

    let partials = spry_enrich::PartialsRegistry::new();
    let interp = Interpolator::new(ctx.to_value(), InterpolatorConfig::default(), &partials);
    let outcome = interp.interpolate("${captured.payload.json().k}", &json!({}), &[]).unwrap();
    assert_eq!(outcome.text, "1");
}

// ── Property 7 — Cycle detection pairs ────────────────────────────────────────

#[test]
fn property_7_mutual_dep_yields_exactly_one_cycle_with_both_ids() {
    let markdown = "```shell\nA --dep B\necho a\n```\n\n```shell\nB --dep A\necho b\n```\n";
    let outcome = enrich_source(markdown);
    let err = ExecutionPlan::build(&outcome.spawnables, false).unwrap_err();
    assert_eq!(err.cycles.len(), 1);
    assert!(err.cycles[0].contains(&"A".to_string()));
    assert!(err.cycles[0].contains(&"B".to_string()));
}

// ── Property 8 — Interpolator recursion cap ───────────────────────────────────

#[test]
fn property_8_self_referential_partial_terminates_within_the_recursion_cap() {
    let mut partials = spry_enrich::PartialsRegistry::new();
    let partial = Partial::new("loop", "${partial(\"loop\")}");
    partials.register(partial, DuplicatePolicy::Throw).unwrap();

    let config = InterpolatorConfig { recursion_limit: 4, ..InterpolatorConfig::default() };
    let interp = Interpolator::new(json!({}), config, &partials);
    let outcome = interp.interpolate("${partial(\"loop\")}", &json!({}), &[]).unwrap();

    assert_eq!(outcome.status, InterpolateStatus::Mutated);
    assert!(outcome.text.contains("recursion limit"));
}

// ── Property 10 — Idempotent gitignore ────────────────────────────────────────

#[test]
fn property_10_appending_an_existing_entry_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".gitignore");

    let first = spry_exec::append_gitignore(&path, "captures/").unwrap();
    assert_eq!(first.added, vec!["captures/".to_string()]);
    assert!(first.preserved.is_empty());

    let second = spry_exec::append_gitignore(&path, "captures/").unwrap();
    assert!(second.added.is_empty());
    assert_eq!(second.preserved, vec!["captures/".to_string()]);
}

// ── Property 1 — Partitioning round-trips modulo frontmatter/whitespace ──────

#[test]
fn property_1_cell_text_concatenation_reproduces_the_body_modulo_frontmatter() {
    let body = "Intro paragraph.\n\n```shell\necho hi\n```\n";
    let markdown = format!("---\ntitle: X\n---\n\n{body}");
    let source = Source::prime(markdown.as_str());
    let notebook = parse_notebook(&source);

    let mut reconstructed = String::new();
    for cell in &notebook.cells {
        match cell {
            spry_types::Cell::Markdown(m) => reconstructed.push_str(&m.text),
            spry_types::Cell::Code(c) => {
                reconstructed.push_str("```");
                reconstructed.push_str(&c.language);
                if !c.info.is_empty() {
                    reconstructed.push(' ');
                    reconstructed.push_str(&c.info);
                }
                reconstructed.push('\n');
                reconstructed.push_str(&c.source);
                reconstructed.push_str("```\n");
            }
        }
    }

    assert_eq!(reconstructed.trim_end(), body.trim_end());
}
