//! C8: the "trusted eval" template interpolator.
//!
//! Templates use `${expr}` interpolation. The implementation deliberately
//! does not embed a scripting engine — `expr` is parsed by a small
//! recursive-descent grammar restricted to dotted-path access, index
//! access, and a closed set of method calls (`text()`, `json()`,
//! `get(key)`), plus the one special form `partial(name[, localsIdent])`
//! for recursive rendering. See DESIGN.md for why this was chosen over
//! embedding `rhai`/`mlua` or a mustache-style engine.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::Value;

use spry_enrich::PartialsRegistry;

use crate::error::InterpolateError;

#[derive(Clone, Debug)]
pub struct InterpolatorConfig {
    pub ctx_name: String,
    pub recursion_limit: usize,
    pub use_cache: bool,
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        InterpolatorConfig { ctx_name: "ctx".to_string(), recursion_limit: 9, use_cache: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpolateStatus {
    Unmodified,
    Mutated,
}

#[derive(Clone, Debug)]
pub struct InterpolateOutcome {
    pub text: String,
    pub status: InterpolateStatus,
}

#[derive(Clone, Debug)]
pub struct InterpolateFailure {
    pub error: InterpolateError,
    pub source: String,
}

/// Bound against one DAG run's context; reused across many
/// `interpolate` calls so the compiled-expression cache (when enabled)
/// pays off.
pub struct Interpolator<'a> {
    ctx: Value,
    config: InterpolatorConfig,
    partials: &'a PartialsRegistry,
    cache: RefCell<HashMap<String, Vec<Token>>>,
}

impl<'a> Interpolator<'a> {
    pub fn new(ctx: Value, config: InterpolatorConfig, partials: &'a PartialsRegistry) -> Self {
        Interpolator { ctx, config, partials, cache: RefCell::new(HashMap::new()) }
    }

    /// Interpolate `template` against `locals`. `stack` is the chain of
    /// enclosing partial names (empty for a top-level task); recursion
    /// beyond `recursion_limit` degrades to an inline error string
    /// rather than failing the call (§4.8, testable property 8).
    pub fn interpolate(&self, template: &str, locals: &Value, stack: &[String]) -> Result<InterpolateOutcome, InterpolateFailure> {
        if let Some(key) = locals.as_object().map(|obj| {
            obj.keys().find(|k| !is_valid_identifier(k) || *k == &self.config.ctx_name)
        }).flatten() {
            let error = if key == &self.config.ctx_name {
                InterpolateError::ReservedIdentifier { key: key.clone() }
            } else {
                InterpolateError::InvalidIdentifier { key: key.clone() }
            };
            return Err(InterpolateFailure { error, source: template.to_string() });
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        let mut mutated = false;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = find_matching_brace(after) else {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            };
            let expr = &after[..end];
            mutated = true;

            match self.eval_top(expr, locals, stack) {
                Ok(EvalOutcome::Value(value) ) => out.push_str(&value_to_text(&value)),
                Ok(EvalOutcome::RecursionCapped(message)) => out.push_str(&message),
                Err(error) => return Err(InterpolateFailure { error, source: template.to_string() }),
            }

            rest = &after[end + 1..];
        }
        out.push_str(rest);

        let status = if mutated { InterpolateStatus::Mutated } else { InterpolateStatus::Unmodified };
        Ok(InterpolateOutcome { text: out, status })
    }

    fn eval_top(&self, expr: &str, locals: &Value, stack: &[String]) -> Result<EvalOutcome, InterpolateError> {
        let tokens = self.tokenize_cached(expr)?;
        let mut parser = Parser { tokens: &tokens, pos: 0 };
        let node = parser.parse_expr().map_err(|message| InterpolateError::EvalFailed { expr: expr.to_string(), message })?;
        if parser.pos != parser.tokens.len() {
            return Err(InterpolateError::EvalFailed { expr: expr.to_string(), message: "unexpected trailing tokens".to_string() });
        }
        self.eval_node(&node, locals, stack, expr)
    }

    fn tokenize_cached(&self, expr: &str) -> Result<Vec<Token>, InterpolateError> {
        if self.config.use_cache {
            if let Some(cached) = self.cache.borrow().get(expr) {
                return Ok(cached.clone());
            }
        }
        let tokens = tokenize(expr).map_err(|message| InterpolateError::EvalFailed { expr: expr.to_string(), message })?;
        if self.config.use_cache {
            self.cache.borrow_mut().insert(expr.to_string(), tokens.clone());
        }
        Ok(tokens)
    }

    fn eval_node(&self, node: &Node, locals: &Value, stack: &[String], expr: &str) -> Result<EvalOutcome, InterpolateError> {
        match node {
            Node::PartialCall { name, locals_ident } => {
                if stack.len() >= self.config.recursion_limit {
                    let chain = stack.join(" -> ");
                    return Ok(EvalOutcome::RecursionCapped(format!(
                        "<<interpolation recursion limit exceeded: {chain} -> {name}>>"
                    )));
                }
                let partial = self.partials.get(name).ok_or_else(|| InterpolateError::EvalFailed {
                    expr: expr.to_string(),
                    message: format!("no partial registered under `{name}`"),
                })?;
                let partial_locals = match locals_ident {
                    Some(ident) => self.resolve_identifier(ident, locals)?,
                    None => Value::Object(serde_json::Map::new()),
                };
                let render = partial.content(partial_locals.clone(), None);
                if !render.interpolate {
                    return Ok(EvalOutcome::Value(Value::String(render.content)));
                }
                let mut next_stack: Vec<String> = stack.to_vec();
                next_stack.push(name.clone());
                match self.interpolate(&render.content, &partial_locals, &next_stack) {
                    Ok(outcome) => Ok(EvalOutcome::Value(Value::String(outcome.text))),
                    Err(failure) => Err(failure.error),
                }
            }
            Node::Path { root, ops } => {
                let mut value = self.resolve_identifier(root, locals)?;
                for op in ops {
                    value = self.apply_op(value, op, expr)?;
                }
                Ok(EvalOutcome::Value(value))
            }
        }
    }

    /// Resolve a bare identifier. `ctx` is special-cased to the whole
    /// run context; `captured` is special-cased as a top-level alias
    /// for `ctx.captured` (literal scenario S6 interpolates
    /// `captured.key...` directly, not `ctx.captured.key...`).
    /// Anything else comes from `locals`.
    fn resolve_identifier(&self, name: &str, locals: &Value) -> Result<Value, InterpolateError> {
        if name == self.config.ctx_name {
            return Ok(self.ctx.clone());
        }
        if let Some(value) = locals.get(name) {
            return Ok(value.clone());
        }
        if name == "captured" {
            if let Some(captured) = self.ctx.get("captured") {
                return Ok(captured.clone());
            }
        }
        Err(InterpolateError::EvalFailed { expr: name.to_string(), message: format!("unbound identifier `{name}`") })
    }

    fn apply_op(&self, value: Value, op: &Op, expr: &str) -> Result<Value, InterpolateError> {
        match op {
            Op::Field(name) => Ok(value.get(name).cloned().unwrap_or(Value::Null)),
            Op::Index(idx) => Ok(value.get(*idx).cloned().unwrap_or(Value::Null)),
            Op::StringIndex(key) => Ok(value.get(key).cloned().unwrap_or(Value::Null)),
            Op::MethodCall { name, arg } => call_method(&value, name, arg.as_deref()).map_err(|message| InterpolateError::EvalFailed { expr: expr.to_string(), message }),
        }
    }
}

enum EvalOutcome {
    Value(Value),
    RecursionCapped(String),
}

/// A dotted-path/index/method-call expression, or the `partial(...)`
/// special form.
enum Node {
    Path { root: String, ops: Vec<Op> },
    PartialCall { name: String, locals_ident: Option<String> },
}

enum Op {
    Field(String),
    Index(usize),
    StringIndex(String),
    MethodCall { name: String, arg: Option<String> },
}

fn call_method(value: &Value, name: &str, arg: Option<&str>) -> Result<Value, String> {
    match name {
        "text" => Ok(Value::String(value_to_text(value))),
        "json" => match value {
            Value::String(s) => serde_json::from_str(s).map_err(|e| format!("json(): {e}")),
            other => Ok(other.clone()),
        },
        "get" => {
            let key = arg.ok_or_else(|| "get() requires one argument".to_string())?;
            Ok(value.get(key).cloned().unwrap_or(Value::Null))
        }
        other => Err(format!("unknown method `{other}`; only text(), json(), get(key) are supported")),
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn find_matching_brace(s: &str) -> Option<usize> {
    let mut depth = 1i32;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// --- tiny expression lexer/parser -----------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Number(usize),
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '.' => { tokens.push(Token::Dot); i += 1; }
            '(' => { tokens.push(Token::LParen); i += 1; }
            ')' => { tokens.push(Token::RParen); i += 1; }
            '[' => { tokens.push(Token::LBracket); i += 1; }
            ']' => { tokens.push(Token::RBracket); i += 1; }
            ',' => { tokens.push(Token::Comma); i += 1; }
            '"' | '\'' => {
                let quote = c;
                i += 1;
                let mut s = String::new();
                while i < chars.len() && chars[i] != quote {
                    s.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err("unterminated string literal".to_string());
                }
                i += 1;
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() => {
                let mut s = String::new();
                while i < chars.len() && chars[i].is_ascii_digit() {
                    s.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token::Number(s.parse().map_err(|_| "bad number literal".to_string())?));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut s = String::new();
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    s.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token::Ident(s));
            }
            other => return Err(format!("unexpected character `{other}`")),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        self.pos += 1;
        t
    }

    fn parse_expr(&mut self) -> Result<Node, String> {
        let Some(Token::Ident(first)) = self.next().cloned() else {
            return Err("expected an identifier".to_string());
        };

        if first == "partial" && self.peek() == Some(&Token::LParen) {
            self.next();
            let Some(Token::Str(name)) = self.next().cloned() else {
                return Err("partial() requires a string literal name".to_string());
            };
            let mut locals_ident = None;
            if self.peek() == Some(&Token::Comma) {
                self.next();
                let Some(Token::Ident(ident)) = self.next().cloned() else {
                    return Err("partial()'s second argument must be an identifier".to_string());
                };
                locals_ident = Some(ident);
            }
            if self.next() != Some(&Token::RParen) {
                return Err("expected `)` to close partial(...)".to_string());
            }
            return Ok(Node::PartialCall { name, locals_ident });
        }

        let mut ops = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.next();
                    let Some(Token::Ident(name)) = self.next().cloned() else {
                        return Err("expected identifier after `.`".to_string());
                    };
                    if self.peek() == Some(&Token::LParen) {
                        self.next();
                        let mut arg = None;
                        if let Some(Token::Str(s)) = self.peek().cloned() {
                            self.next();
                            arg = Some(s);
                        }
                        if self.next() != Some(&Token::RParen) {
                            return Err("expected `)` to close method call".to_string());
                        }
                        ops.push(Op::MethodCall { name, arg });
                    } else {
                        ops.push(Op::Field(name));
                    }
                }
                Some(Token::LBracket) => {
                    self.next();
                    match self.next().cloned() {
                        Some(Token::Number(n)) => ops.push(Op::Index(n)),
                        Some(Token::Str(s)) => ops.push(Op::StringIndex(s)),
                        _ => return Err("expected an index or string key inside `[...]`".to_string()),
                    }
                    if self.next() != Some(&Token::RBracket) {
                        return Err("expected `]`".to_string());
                    }
                }
                _ => break,
            }
        }

        Ok(Node::Path { root: first, ops })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spry_types::Partial;

    fn empty_registry() -> PartialsRegistry {
        PartialsRegistry::new()
    }

    #[test]
    fn no_interpolation_markers_is_unmodified() {
        let registry = empty_registry();
        let interp = Interpolator::new(Value::Null, InterpolatorConfig::default(), &registry);
        let outcome = interp.interpolate("plain text", &Value::Null, &[]).unwrap();
        assert_eq!(outcome.status, InterpolateStatus::Unmodified);
        assert_eq!(outcome.text, "plain text");
    }

    #[test]
    fn local_identifier_substitution() {
        let registry = empty_registry();
        let interp = Interpolator::new(Value::Null, InterpolatorConfig::default(), &registry);
        let locals = serde_json::json!({ "name": "world" });
        let outcome = interp.interpolate("hello ${name}", &locals, &[]).unwrap();
        assert_eq!(outcome.text, "hello world");
        assert_eq!(outcome.status, InterpolateStatus::Mutated);
    }

    #[test]
    fn s6_capture_json_field_access() {
        let registry = empty_registry();
        let ctx = serde_json::json!({ "captured": { "payload": "{\"k\":1}" } });
        let interp = Interpolator::new(ctx, InterpolatorConfig::default(), &registry);
        let outcome = interp.interpolate("echo ${captured.payload.json().k}", &Value::Null, &[]).unwrap();
        assert_eq!(outcome.text, "echo 1");
    }

    #[test]
    fn recursion_cap_degrades_to_inline_error_text_instead_of_failing() {
        let mut registry = empty_registry();
        registry.register(Partial::new("self", "${partial(\"self\")}"), spry_types::DuplicatePolicy::Overwrite).unwrap();
        let interp = Interpolator::new(Value::Null, InterpolatorConfig { recursion_limit: 3, ..Default::default() }, &registry);
        let outcome = interp.interpolate("${partial(\"self\")}", &Value::Null, &[]).unwrap();
        assert!(outcome.text.contains("recursion limit exceeded"));
    }

    #[test]
    fn reserved_identifier_in_locals_fails() {
        let registry = empty_registry();
        let interp = Interpolator::new(Value::Null, InterpolatorConfig::default(), &registry);
        let locals = serde_json::json!({ "ctx": 1 });
        let failure = interp.interpolate("${ctx}", &locals, &[]).unwrap_err();
        assert!(matches!(failure.error, InterpolateError::ReservedIdentifier { .. }));
    }
}
