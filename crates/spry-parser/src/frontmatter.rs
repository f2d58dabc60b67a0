//! Leading YAML frontmatter: `---\n...\n---\n` at the head of a document.

use serde_json::Value;

/// The frontmatter block, if present, and the byte offset in the
/// original source where the remaining document begins.
pub struct Frontmatter {
    pub value: Value,
    pub body_start: usize,
}

/// Strip a leading frontmatter block from `content`, if one exists.
/// Bodies that aren't valid YAML still strip cleanly — `value` falls
/// back to `Value::Null` rather than failing the whole parse.
pub fn strip_frontmatter(content: &str) -> Frontmatter {
    let Some(rest) = content.strip_prefix("---") else {
        return Frontmatter { value: Value::Null, body_start: 0 };
    };
    // The opening delimiter must be alone on its line.
    let (after_open, newline_len) = match rest.strip_prefix("\r\n") {
        Some(r) => (r, 2),
        None => match rest.strip_prefix('\n') {
            Some(r) => (r, 1),
            None => return Frontmatter { value: Value::Null, body_start: 0 },
        },
    };

    let Some(close_idx) = find_closing_delimiter(after_open) else {
        return Frontmatter { value: Value::Null, body_start: 0 };
    };

    let yaml_block = &after_open[..close_idx.yaml_end];
    let value: Value = serde_yaml::from_str::<serde_yaml::Value>(yaml_block)
        .ok()
        .and_then(|v| serde_json::to_value(v).ok())
        .unwrap_or(Value::Null);

    Frontmatter { value, body_start: "---".len() + newline_len + close_idx.body_start }
}

struct ClosingDelimiter {
    /// Offset (into `after_open`) where the YAML body ends.
    yaml_end: usize,
    /// Offset (into `after_open`) where the document body resumes.
    body_start: usize,
}

fn find_closing_delimiter(after_open: &str) -> Option<ClosingDelimiter> {
    let mut offset = 0usize;
    for line in after_open.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == "---" || trimmed == "..." {
            return Some(ClosingDelimiter { yaml_end: offset, body_start: offset + line.len() });
        }
        offset += line.len();
    }
    None
}
