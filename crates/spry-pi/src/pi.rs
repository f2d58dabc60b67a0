//! Processing-instruction parsing: tokens + `--flag`/`-f` pairs.
//!
//! ```text
//! ┌──────────────────────────┬───────────────────────────────────────┐
//! │ Shape                    │ Effect                                │
//! ├──────────────────────────┼───────────────────────────────────────┤
//! │ bare-token                │ appended to `bare` in order           │
//! │ --key=value / -k=value   │ flags[key] = value                    │
//! │ --key value / -k value   │ flags[key] = value (next token eaten) │
//! │ --key / -k (no value)    │ flags[key] = true                     │
//! │ repeated --key           │ flags[key] promoted to an occurrence  │
//! │                          │ list, in order                        │
//! │ -- / -                   │ end-of-options marker, dropped        │
//! └──────────────────────────┴───────────────────────────────────────┘
//! ```
//!
//! This never fails: malformed or ambiguous input degrades to empty
//! `bare`/`flags` rather than producing an error. Callers that embed a
//! PI inside a fence header (see `spry-parser`) are responsible for
//! turning "the trailer didn't look like a PI at all" into a
//! `fence-issue`; the lexer itself has no notion of issues.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::flags::{FlagScalar, FlagValue};
use crate::tokenize::tokenize;

/// One of the two ways callers may hand a PI header to [`Pi::parse`].
pub enum PiInput<'a> {
    Raw(&'a str),
    Tokens(&'a [String]),
}

impl<'a> From<&'a str> for PiInput<'a> {
    fn from(s: &'a str) -> Self {
        PiInput::Raw(s)
    }
}

impl<'a> From<&'a [String]> for PiInput<'a> {
    fn from(tokens: &'a [String]) -> Self {
        PiInput::Tokens(tokens)
    }
}

/// A parsed processing instruction: ordered positional (bare) tokens
/// plus a normalized flag map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pi {
    pub bare: Vec<String>,
    pub flags: IndexMap<String, FlagValue>,
}

impl Pi {
    /// Parse a PI header. `base` supplies default flag values; a flag
    /// seen exactly once in `input` overwrites its base default, a flag
    /// seen more than once promotes to an occurrence list (ignoring
    /// whatever `base` held for that key).
    pub fn parse<'a>(input: impl Into<PiInput<'a>>, base: Option<&IndexMap<String, FlagValue>>) -> Pi {
        let owned_tokens;
        let tokens: &[String] = match input.into() {
            PiInput::Raw(s) => {
                owned_tokens = tokenize(s);
                &owned_tokens
            }
            PiInput::Tokens(t) => t,
        };

        let mut bare = Vec::new();
        let mut flags = base.cloned().unwrap_or_default();
        let mut touched: HashSet<String> = HashSet::new();

        let mut i = 0;
        while i < tokens.len() {
            let tok = tokens[i].as_str();

            if tok == "--" || tok == "-" {
                i += 1;
                continue;
            }

            if let Some(rest) = tok.strip_prefix("--") {
                i += consume_flag(rest, tokens, i, &mut flags, &mut touched);
                continue;
            }

            if let Some(rest) = tok.strip_prefix('-') {
                if !rest.is_empty() {
                    i += consume_flag(rest, tokens, i, &mut flags, &mut touched);
                    continue;
                }
            }

            bare.push(tok.to_string());
            i += 1;
        }

        Pi { bare, flags }
    }

    pub fn pos_count(&self) -> usize {
        self.bare.len()
    }

    pub fn first_bare_word(&self) -> Option<&str> {
        self.bare.first().map(String::as_str)
    }

    fn lookup(&self, name: &str, aliases: &[&str]) -> Option<&FlagValue> {
        self.flags
            .get(name)
            .or_else(|| aliases.iter().find_map(|a| self.flags.get(*a)))
    }

    pub fn has_flag(&self, name: &str, aliases: &[&str]) -> bool {
        self.lookup(name, aliases).is_some()
    }

    pub fn get_text_flag(&self, name: &str, aliases: &[&str]) -> Option<String> {
        self.lookup(name, aliases).map(FlagValue::as_text)
    }

    pub fn get_text_flag_values(&self, name: &str, aliases: &[&str]) -> Vec<String> {
        self.lookup(name, aliases)
            .map(FlagValue::as_text_values)
            .unwrap_or_default()
    }

    pub fn get_bool_flag(&self, name: &str, aliases: &[&str]) -> bool {
        self.lookup(name, aliases).map(FlagValue::as_bool).unwrap_or(false)
    }

    /// Reconstruct a PI string from this value. For PIs with no
    /// repeated flags, `Pi::parse(pi.reserialize(), None) == pi`.
    pub fn reserialize(&self) -> String {
        let mut parts: Vec<String> = self.bare.iter().map(|b| quote_if_needed(b)).collect();
        for (key, value) in &self.flags {
            match value {
                FlagValue::Scalar(FlagScalar::Bool(true)) => parts.push(format!("--{key}")),
                FlagValue::Scalar(FlagScalar::Bool(false)) => {
                    parts.push(format!("--{key}=false"));
                }
                FlagValue::Scalar(FlagScalar::Text(v)) => {
                    parts.push(format!("--{key}={}", quote_if_needed(v)));
                }
                FlagValue::List(items) => {
                    for item in items {
                        match item {
                            FlagScalar::Bool(true) => parts.push(format!("--{key}")),
                            FlagScalar::Bool(false) => parts.push(format!("--{key}=false")),
                            FlagScalar::Text(v) => {
                                parts.push(format!("--{key}={}", quote_if_needed(v)));
                            }
                        }
                    }
                }
            }
        }
        parts.join(" ")
    }
}

/// Decide whether `tok` looks like it introduces a flag (so it should
/// not be eaten as a preceding flag's value).
fn looks_like_flag(tok: &str) -> bool {
    tok.starts_with('-') && tok.len() > 1
}

/// Handle one `--key[=value]` / `-k[=value]` occurrence starting at
/// `tokens[i]` (with `rest` already stripped of its leading dashes).
/// Returns the number of tokens consumed (1, or 2 if the next token
/// was eaten as this flag's value).
fn consume_flag(
    rest: &str,
    tokens: &[String],
    i: usize,
    flags: &mut IndexMap<String, FlagValue>,
    touched: &mut HashSet<String>,
) -> usize {
    if let Some((key, value)) = rest.split_once('=') {
        set_flag(flags, touched, key.to_string(), FlagScalar::Text(value.to_string()));
        return 1;
    }

    let key = rest.to_string();
    if let Some(next) = tokens.get(i + 1) {
        if !looks_like_flag(next) && next != "--" {
            set_flag(flags, touched, key, FlagScalar::Text(next.clone()));
            return 2;
        }
    }
    set_flag(flags, touched, key, FlagScalar::Bool(true));
    1
}

fn set_flag(
    flags: &mut IndexMap<String, FlagValue>,
    touched: &mut HashSet<String>,
    key: String,
    value: FlagScalar,
) {
    if touched.insert(key.clone()) {
        flags.insert(key, FlagValue::Scalar(value));
        return;
    }

    match flags.get_mut(&key) {
        Some(FlagValue::List(list)) => list.push(value),
        Some(FlagValue::Scalar(existing)) => {
            let existing = existing.clone();
            flags.insert(key, FlagValue::List(vec![existing, value]));
        }
        None => {
            flags.insert(key, FlagValue::Scalar(value));
        }
    }
}

fn quote_if_needed(s: &str) -> String {
    if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        let escaped = s.replace('\\', r"\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        s.to_string()
    }
}
