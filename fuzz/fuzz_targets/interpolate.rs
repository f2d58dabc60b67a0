#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

use spry_enrich::PartialsRegistry;
use spry_exec::{Interpolator, InterpolatorConfig};

// Fuzz target: Interpolator::interpolate on an arbitrary template
// string against a fixed, small ctx/partials environment.
//
// Catches bugs in:
// - The tokenizer/parser on malformed `${...}` expressions
// - Unbalanced braces in find_matching_brace
// - Stack overflow or non-termination on crafted partial() chains
// - Panics where the contract requires an `Err`/degraded-text result
#[derive(Debug, Arbitrary)]
struct FuzzTemplate {
    template: String,
}

fuzz_target!(|input: FuzzTemplate| {
    let partials = PartialsRegistry::new();
    let ctx = json!({ "runId": "fuzz", "captured": { "payload": "{\"k\":1}" } });
    let config = InterpolatorConfig { recursion_limit: 9, ..InterpolatorConfig::default() };
    let interpolator = Interpolator::new(ctx, config, &partials);
    let _ = interpolator.interpolate(&input.template, &json!({ "name": "fuzz" }), &[]);
});
