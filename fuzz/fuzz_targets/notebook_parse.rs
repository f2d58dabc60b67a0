#![no_main]

use libfuzzer_sys::fuzz_target;

use spry_types::Source;

// Fuzz target: parse_notebook on arbitrary Markdown.
//
// Catches bugs in:
// - Frontmatter stripping on malformed YAML
// - Fence partitioning with unbalanced backticks
// - Fence info-string / JSON5 attribute trailer parsing
// - Panics that should instead surface as a fence `Issue`
fuzz_target!(|data: &str| {
    let source = Source::prime(data);
    let _ = spry_parser::parse_notebook(&source);
});
