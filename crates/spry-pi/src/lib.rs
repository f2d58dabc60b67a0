//! Tokenization and flag parsing for Spry fence processing instructions.
//!
//! A PI is the part of a fenced code block's info string that precedes
//! the optional trailing JSON5 attribute object:
//!
//! ```text
//! ```shell build --dep fetch --interpolate
//! ```
//!
//! This crate has no notion of Markdown, cells, or JSON5 — it only
//! tokenizes and classifies tokens into positional words and flags.
//! Higher layers (`spry-types`, `spry-parser`) attach a `Pi` to a cell.

mod flags;
mod pi;
mod tokenize;

pub use flags::{FlagScalar, FlagValue};
pub use pi::{Pi, PiInput};
pub use tokenize::tokenize;
