//! Splits a fenced code block's info string into `language`, `info`,
//! and a JSON5-parsed `attrs` trailer.

use serde_json::{Map, Value};
use spry_types::Issue;

pub struct ParsedFence {
    pub language: String,
    pub info: String,
    pub attrs: Map<String, Value>,
    pub issue: Option<String>,
}

/// Parse one fence's info string (everything after the opening
/// backticks, before the newline). `start_line`/`end_line` are only
/// used to build the returned issue message's context, never stored
/// on it — the caller attaches line numbers to the `Issue` itself.
pub fn parse_fence_info(label: &str) -> ParsedFence {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return ParsedFence { language: "text".to_string(), info: String::new(), attrs: Map::new(), issue: None };
    }

    let (first, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (trimmed, ""),
    };
    let language = first.to_lowercase();

    let (info, trailer) = match rest.find('{') {
        Some(idx) => (rest[..idx].trim_end().to_string(), Some(rest[idx..].to_string())),
        None => (rest.to_string(), None),
    };

    let (attrs, issue) = match trailer {
        None => (Map::new(), None),
        Some(trailer) => match json5::from_str::<Value>(&trailer) {
            Ok(Value::Object(map)) => (map, None),
            Ok(_) => (Map::new(), Some("fence attribute trailer did not parse as a JSON object".to_string())),
            Err(err) => (Map::new(), Some(format!("fence attribute trailer failed to parse: {err}"))),
        },
    };

    ParsedFence { language, info, attrs, issue }
}

pub fn issue_for(start_line: usize, end_line: usize, message: String) -> Issue {
    Issue::fence(start_line, end_line, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_only_has_empty_info_and_attrs() {
        let parsed = parse_fence_info("shell");
        assert_eq!(parsed.language, "shell");
        assert_eq!(parsed.info, "");
        assert!(parsed.attrs.is_empty());
    }

    #[test]
    fn info_stops_at_the_first_brace() {
        let parsed = parse_fence_info(r#"sql INFO {"id":1,"dryRun":true}"#);
        assert_eq!(parsed.language, "sql");
        assert_eq!(parsed.info, "INFO");
        assert_eq!(parsed.attrs.get("id"), Some(&Value::from(1)));
        assert_eq!(parsed.attrs.get("dryRun"), Some(&Value::from(true)));
        assert!(parsed.issue.is_none());
    }

    #[test]
    fn malformed_trailer_yields_empty_attrs_and_an_issue() {
        let parsed = parse_fence_info("sql INFO {id 1}");
        assert!(parsed.attrs.is_empty());
        assert!(parsed.issue.is_some());
    }

    #[test]
    fn fence_with_no_language_defaults_to_text() {
        let parsed = parse_fence_info("");
        assert_eq!(parsed.language, "text");
    }

    #[test]
    fn pi_bearing_info_string_is_preserved_verbatim() {
        let parsed = parse_fence_info("shell build --dep fetch --interpolate");
        assert_eq!(parsed.language, "shell");
        assert_eq!(parsed.info, "build --dep fetch --interpolate");
    }
}
