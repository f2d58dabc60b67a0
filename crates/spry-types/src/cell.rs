use serde_json::Map;
use serde_json::Value;

use spry_pi::Pi;

/// A task: a [`CodeCell`] whose language is in the spawnable set, whose
/// PI has a bare identity token, and which is not a [`crate::Partial`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spawnable {
    pub identity: String,
    pub pi: Pi,
}

impl Spawnable {
    /// `pi` must already have at least one bare token; `identity` is
    /// its first.
    pub fn from_pi(pi: Pi) -> Option<Self> {
        let identity = pi.first_bare_word()?.to_string();
        Some(Spawnable { identity, pi })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkdownCell {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeCell {
    /// Lowercased language tag; `"text"` when the fence carries none.
    pub language: String,
    /// Free-form text of the info string following the language token,
    /// up to the first `{`.
    pub info: String,
    /// JSON5-parsed trailing attribute object; empty on parse failure.
    pub attrs: Map<String, Value>,
    pub source: String,
    pub start_line: usize,
    pub end_line: usize,
    pub pi: Option<Pi>,
    pub spawnable: Option<Spawnable>,
}

impl CodeCell {
    pub fn is_spawnable(&self) -> bool {
        self.spawnable.is_some()
    }
}

/// A contiguous region of a notebook: narrative or a single fenced
/// code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Markdown(MarkdownCell),
    Code(CodeCell),
}

impl Cell {
    pub fn start_line(&self) -> usize {
        match self {
            Cell::Markdown(m) => m.start_line,
            Cell::Code(c) => c.start_line,
        }
    }

    pub fn end_line(&self) -> usize {
        match self {
            Cell::Markdown(m) => m.end_line,
            Cell::Code(c) => c.end_line,
        }
    }

    pub fn as_code(&self) -> Option<&CodeCell> {
        match self {
            Cell::Code(c) => Some(c),
            Cell::Markdown(_) => None,
        }
    }

    pub fn as_code_mut(&mut self) -> Option<&mut CodeCell> {
        match self {
            Cell::Code(c) => Some(c),
            Cell::Markdown(_) => None,
        }
    }

    pub fn as_markdown(&self) -> Option<&MarkdownCell> {
        match self {
            Cell::Markdown(m) => Some(m),
            Cell::Code(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawnable_identity_is_first_bare_token() {
        let pi = Pi::parse("build --dep fetch", None);
        let spawnable = Spawnable::from_pi(pi).unwrap();
        assert_eq!(spawnable.identity, "build");
    }

    #[test]
    fn spawnable_requires_a_bare_token() {
        let pi = Pi::parse("--dep fetch", None);
        assert!(Spawnable::from_pi(pi).is_none());
    }

    #[test]
    fn cell_line_spans_delegate_to_the_active_variant() {
        let cell = Cell::Markdown(MarkdownCell { text: "hi".into(), start_line: 1, end_line: 2 });
        assert_eq!(cell.start_line(), 1);
        assert_eq!(cell.end_line(), 2);
        assert!(cell.as_code().is_none());
    }
}
