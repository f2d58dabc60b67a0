//! POSIX-like tokenizer for raw PI strings.
//!
//! Splits a fence info string into whitespace-separated tokens, honoring
//! single quotes (no escapes inside), double quotes (backslash escapes
//! inside), and backslash escapes outside quotes. Never fails: an
//! unterminated quote is tolerated to end-of-input, matching the PI
//! parser's "malformed input never throws" contract.

/// Tokenize `input` the way a POSIX shell would split a single command
/// line, without performing any globbing, variable expansion, or
/// command substitution — just quote and escape handling.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current = String::new();
    let mut in_token = false;

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '"' => {
                in_token = true;
                while let Some(c) = chars.next() {
                    if c == '"' {
                        break;
                    }
                    if c == '\\' {
                        match chars.peek() {
                            Some(&next) => {
                                current.push(next);
                                chars.next();
                            }
                            None => current.push('\\'),
                        }
                    } else {
                        current.push(c);
                    }
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some(next) => current.push(next),
                    None => current.push('\\'),
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("a b  c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(tokenize(r"'a\ b'"), vec![r"a\ b"]);
    }

    #[test]
    fn double_quotes_allow_escapes() {
        assert_eq!(tokenize(r#""a \" b""#), vec!["a \" b"]);
    }

    #[test]
    fn backslash_escapes_outside_quotes() {
        assert_eq!(tokenize(r"a\ b c"), vec!["a b", "c"]);
    }

    #[test]
    fn unterminated_quote_tolerated() {
        assert_eq!(tokenize(r#"a "b c"#), vec!["a", "b c"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn posix_example_from_spec() {
        let input = r#"build "src/main.ts" --out=dist --tag a --tag "b c" -v"#;
        assert_eq!(
            tokenize(input),
            vec!["build", "src/main.ts", "--out=dist", "--tag", "a", "--tag", "b c", "-v"]
        );
    }
}
