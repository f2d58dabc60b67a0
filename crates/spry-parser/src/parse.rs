//! Markdown → `Notebook`: the core of the C2 notebook parser.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use spry_types::{Cell, CodeCell, MarkdownCell, Notebook, Source, Spawnable};

use crate::fence::{issue_for, parse_fence_info};
use crate::frontmatter::strip_frontmatter;

/// Parse one Markdown [`Source`] into a [`Notebook`].
///
/// Fenced code blocks become `CodeCell`s; every other run of content
/// between fences (and before the first / after the last) becomes a
/// `MarkdownCell`, with empty runs suppressed. Concatenating cell text
/// back in source order reproduces the document minus frontmatter.
pub fn parse_notebook(source: &Source) -> Notebook {
    let content = source.content.as_str();
    let frontmatter = strip_frontmatter(content);
    let body = &content[frontmatter.body_start..];
    let body_offset = frontmatter.body_start;

    let mut notebook = Notebook::new();
    notebook.fm = frontmatter.value;

    let options = Options::empty();
    let parser = Parser::new_ext(body, options);

    let mut cursor = 0usize;
    let mut in_code_block: Option<(String, usize)> = None; // (label, start_offset)
    let mut code_text = String::new();

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                flush_markdown(&mut notebook, content, cursor, range.start, body_offset);
                let label = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                in_code_block = Some((label, range.start));
                code_text.clear();
            }
            Event::Text(text) | Event::Code(text) if in_code_block.is_some() => {
                code_text.push_str(&text);
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((label, start)) = in_code_block.take() {
                    push_code_cell(&mut notebook, content, &label, &code_text, start, range.end, body_offset);
                    cursor = range.end;
                }
            }
            _ => {}
        }
    }

    flush_markdown(&mut notebook, content, cursor, body.len(), body_offset);
    notebook
}

/// `start`/`end` are byte offsets relative to `body` (the
/// frontmatter-stripped document); `body_offset` shifts them back to
/// `content`, the original document, for line-number reporting.
fn flush_markdown(notebook: &mut Notebook, content: &str, start: usize, end: usize, body_offset: usize) {
    if start >= end {
        return;
    }
    let body = &content[body_offset..];
    let text = &body[start..end];
    if text.trim().is_empty() {
        return;
    }
    let start_line = line_of(content, body_offset + start);
    let end_line = line_of(content, body_offset + end.saturating_sub(1).max(start));
    notebook.cells.push(Cell::Markdown(MarkdownCell {
        text: text.to_string(),
        start_line,
        end_line,
    }));
}

fn push_code_cell(notebook: &mut Notebook, content: &str, label: &str, source_text: &str, start: usize, end: usize, body_offset: usize) {
    let parsed = parse_fence_info(label);
    let start_line = line_of(content, body_offset + start);
    let end_line = line_of(content, body_offset + end.saturating_sub(1).max(start));

    if let Some(message) = parsed.issue {
        notebook.push_issue(issue_for(start_line, end_line, message));
    }

    let pi = if parsed.info.trim().is_empty() {
        None
    } else {
        Some(spry_pi::Pi::parse(parsed.info.as_str(), None))
    };

    let spawnable = None::<Spawnable>; // spawnable detection is an enrichment pass (spry-enrich), not parsing

    notebook.cells.push(Cell::Code(CodeCell {
        language: parsed.language,
        info: parsed.info,
        attrs: parsed.attrs,
        source: source_text.to_string(),
        start_line,
        end_line,
        pi,
        spawnable,
    }));
}

/// 1-based line number of byte offset `offset` within `text`.
fn line_of(text: &str, offset: usize) -> usize {
    1 + text.as_bytes()[..offset.min(text.len())].iter().filter(|&&b| b == b'\n').count()
}
