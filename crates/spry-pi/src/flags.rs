//! Flag value types shared by [`crate::Pi`].

use std::fmt;

/// A single occurrence of a flag's value: either a bare boolean (the
/// flag appeared with no `=value` and wasn't followed by a token that
/// could be its value) or text (an explicit `=value`, or the next
/// bare token consumed as the value).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagScalar {
    Bool(bool),
    Text(String),
}

impl FlagScalar {
    /// Stringify this scalar the way `getTextFlag` would: booleans
    /// become `"true"` / `"false"`, text is returned verbatim.
    pub fn as_text(&self) -> String {
        match self {
            FlagScalar::Bool(b) => b.to_string(),
            FlagScalar::Text(s) => s.clone(),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FlagScalar::Bool(b) => *b,
            FlagScalar::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for FlagScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// A flag's value: a single occurrence, or — once the same key has
/// been seen more than once within one parse — an ordered list of
/// occurrences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagValue {
    Scalar(FlagScalar),
    List(Vec<FlagScalar>),
}

impl FlagValue {
    pub fn as_text(&self) -> String {
        match self {
            FlagValue::Scalar(s) => s.as_text(),
            FlagValue::List(list) => list.last().map(FlagScalar::as_text).unwrap_or_default(),
        }
    }

    /// Every occurrence of this flag's value as text, in occurrence order.
    pub fn as_text_values(&self) -> Vec<String> {
        match self {
            FlagValue::Scalar(s) => vec![s.as_text()],
            FlagValue::List(list) => list.iter().map(FlagScalar::as_text).collect(),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FlagValue::Scalar(s) => s.as_bool(),
            FlagValue::List(list) => list.last().map(FlagScalar::as_bool).unwrap_or(false),
        }
    }
}
