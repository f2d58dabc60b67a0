#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: Pi::parse on an arbitrary UTF-8 PI string.
//
// Catches bugs in:
// - Unbalanced or unterminated quotes
// - Trailing/leading whitespace handling
// - Flag value parsing (bare `--flag`, `--flag=value`, `--flag value`)
// - Panics on malformed POSIX-style input that should degrade gracefully
fuzz_target!(|data: &str| {
    let _ = spry_pi::Pi::parse(data, None);
});
