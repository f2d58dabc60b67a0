//! The C3 playbook overlay: attributes surrounding Markdown narrative to
//! each code cell as that cell's `instructions`.

use spry_types::{Cell, Notebook};

/// What counts as a narrative boundary that resets the rolling
/// instructions buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter {
    /// An ATX heading of exactly this depth (`#` count), e.g. `Heading(2)` matches `## `.
    Heading(usize),
    /// A thematic break (`---`, `***`, or `___` alone on a line).
    ThematicBreak,
}

impl Default for Delimiter {
    fn default() -> Self {
        Delimiter::Heading(2)
    }
}

impl Delimiter {
    fn matches(&self, line: &str) -> bool {
        let trimmed = line.trim_end();
        match self {
            Delimiter::Heading(depth) => {
                let prefix = "#".repeat(*depth);
                trimmed.strip_prefix(&prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
                    && !trimmed[*depth..].starts_with('#')
            }
            Delimiter::ThematicBreak => is_thematic_break(trimmed),
        }
    }
}

fn is_thematic_break(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 3 {
        return false;
    }
    let first = compact.chars().next().unwrap();
    matches!(first, '-' | '*' | '_') && compact.chars().all(|c| c == first)
}

/// A view over a [`Notebook`] that attributes surrounding narrative to
/// each code cell.
#[derive(Clone, Debug, Default)]
pub struct Playbook {
    pub instructions: Option<String>,
    /// Parallel to the notebook's CodeCells in source order.
    pub per_cell: Vec<Option<String>>,
    pub appendix: Option<String>,
}

pub fn build_playbook(notebook: &Notebook, delimiter: Delimiter) -> Playbook {
    let mut header = String::new();
    let mut header_done = false;
    let mut buffer = String::new();
    let mut per_cell = Vec::new();

    for cell in &notebook.cells {
        match cell {
            Cell::Markdown(md) => {
                if !header_done {
                    header.push_str(&md.text);
                }
                accumulate(&mut buffer, &md.text, &delimiter);
            }
            Cell::Code(_) => {
                header_done = true;
                per_cell.push(non_empty(&buffer));
                buffer.clear();
            }
        }
    }

    Playbook { instructions: non_empty(&header), per_cell, appendix: non_empty(&buffer) }
}

/// Append `text` to `buffer` line by line, clearing `buffer` whenever a
/// delimiter line is encountered so it always starts at-or-after the
/// nearest preceding delimiter.
fn accumulate(buffer: &mut String, text: &str, delimiter: &Delimiter) {
    for line in text.split_inclusive('\n') {
        if delimiter.matches(line) {
            buffer.clear();
        }
        buffer.push_str(line);
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() { None } else { Some(s.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_notebook;
    use spry_types::Source;

    #[test]
    fn header_is_everything_before_the_first_code_cell() {
        let content = "Intro paragraph.\n\n```shell build\necho hi\n```\n";
        let nb = parse_notebook(&Source::prime(content));
        let pb = build_playbook(&nb, Delimiter::default());
        assert_eq!(pb.instructions.as_deref(), Some("Intro paragraph.\n\n"));
    }

    #[test]
    fn delimiter_resets_the_rolling_buffer() {
        let content = "pre\n\n## Section\n\nnarrative\n\n```shell build\necho hi\n```\n";
        let nb = parse_notebook(&Source::prime(content));
        let pb = build_playbook(&nb, Delimiter::Heading(2));
        let buf = pb.per_cell[0].as_ref().unwrap();
        assert!(buf.starts_with("## Section"));
        assert!(!buf.contains("pre"));
    }

    #[test]
    fn empty_buffers_are_absent_not_empty_strings() {
        let content = "```a\nx\n```\n```b\ny\n```\n";
        let nb = parse_notebook(&Source::prime(content));
        let pb = build_playbook(&nb, Delimiter::default());
        assert_eq!(pb.instructions, None);
        assert!(pb.per_cell.iter().all(Option::is_none));
        assert_eq!(pb.appendix, None);
    }

    #[test]
    fn appendix_is_markdown_after_the_last_code_cell() {
        let content = "```shell build\necho hi\n```\n\ntrailing notes\n";
        let nb = parse_notebook(&Source::prime(content));
        let pb = build_playbook(&nb, Delimiter::default());
        assert_eq!(pb.appendix.as_deref(), Some("\ntrailing notes\n"));
    }
}
