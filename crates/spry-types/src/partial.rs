use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Validates a partial's `locals` against its `argsSchema`. Implemented
/// in `spry-enrich` against a JSON Schema document; kept as a trait here
/// so `spry-types` never needs to depend on a schema-validation crate.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, locals: &Value) -> Result<(), String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectionMode {
    Prepend,
    Append,
    Both,
}

#[derive(Clone)]
pub struct InjectionSpec {
    pub globs: Vec<String>,
    pub mode: InjectionMode,
    pub wrap: Option<Arc<dyn Fn(&str) -> String + Send + Sync>>,
}

impl fmt::Debug for InjectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionSpec")
            .field("globs", &self.globs)
            .field("mode", &self.mode)
            .field("wrap", &self.wrap.is_some())
            .finish()
    }
}

/// What happens when a collection already holds a [`Partial`] (or
/// spawnable) under the identity being registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Overwrite,
    Throw,
    Ignore,
}

/// Result of rendering a [`Partial`] against a set of locals.
#[derive(Clone, Debug)]
pub struct PartialRender {
    pub content: String,
    pub interpolate: bool,
    pub locals: Value,
}

/// A named reusable code fragment. `identity` must be globally unique
/// within whatever collection holds it; the collection enforces that
/// via [`DuplicatePolicy`], not this type.
#[derive(Clone)]
pub struct Partial {
    pub identity: String,
    pub source: String,
    pub args_schema: Option<Arc<dyn SchemaValidator>>,
    pub injection: Option<InjectionSpec>,
}

impl fmt::Debug for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partial")
            .field("identity", &self.identity)
            .field("source_len", &self.source.len())
            .field("has_schema", &self.args_schema.is_some())
            .field("injection", &self.injection)
            .finish()
    }
}

impl Partial {
    pub fn new(identity: impl Into<String>, source: impl Into<String>) -> Self {
        Partial { identity: identity.into(), source: source.into(), args_schema: None, injection: None }
    }

    /// Render this partial's body against `locals`. `on_error`, if
    /// given, may supply a caller-chosen replacement message (see
    /// spec §4.4.2); its return value, when `None`, falls back to the
    /// validator's own error message.
    pub fn content(
        &self,
        locals: Value,
        on_error: Option<&dyn Fn(&str, &str, &str) -> Option<String>>,
    ) -> PartialRender {
        if let Some(schema) = &self.args_schema {
            if let Err(err) = schema.validate(&locals) {
                let message = format!("partial `{}` rejected locals: {err}", self.identity);
                let content = on_error
                    .and_then(|f| f(&message, &self.source, &err))
                    .unwrap_or_else(|| message.clone());
                return PartialRender { content, interpolate: false, locals };
            }
        }
        PartialRender { content: self.source.clone(), interpolate: true, locals }
    }
}
