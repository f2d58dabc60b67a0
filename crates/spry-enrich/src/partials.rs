//! 4.4.2 Partial registration: code cells whose PI's first bare token is
//! `PARTIAL` become reusable fragments.

use std::sync::Arc;

use indexmap::IndexMap;
use spry_types::{CodeCell, DuplicatePolicy, InjectionMode, InjectionSpec, Partial};

use crate::error::DuplicatePolicyError;
use crate::schema::JsonSchemaValidator;

/// Inspect a code cell's PI and, if it declares `PARTIAL <identity>`,
/// build the corresponding [`Partial`]. Returns `None` for cells that
/// aren't partial declarations at all (most cells).
pub fn partial_from_cell(cell: &CodeCell) -> Option<Partial> {
    let pi = cell.pi.as_ref()?;
    if pi.first_bare_word() != Some("PARTIAL") {
        return None;
    }
    let identity = pi.bare.get(1)?.clone();

    let args_schema = if cell.attrs.is_empty() {
        None
    } else {
        let schema_value = serde_json::Value::Object(cell.attrs.clone());
        JsonSchemaValidator::compile(&schema_value).ok().map(|v| Arc::new(v) as Arc<dyn spry_types::SchemaValidator>)
    };

    let globs = pi.get_text_flag_values("inject", &[]);
    let injection = if globs.is_empty() {
        None
    } else {
        let prepend = pi.has_flag("prepend", &[]);
        let append = pi.has_flag("append", &[]);
        let mode = match (prepend, append) {
            (true, true) => InjectionMode::Both,
            (false, true) => InjectionMode::Append,
            _ => InjectionMode::Prepend,
        };
        Some(InjectionSpec { globs, mode, wrap: None })
    };

    Some(Partial { identity, source: cell.source.clone(), args_schema, injection })
}

/// A collection of registered partials, enforcing a [`DuplicatePolicy`]
/// on identity collisions.
#[derive(Default)]
pub struct PartialsRegistry {
    partials: IndexMap<String, Partial>,
}

impl PartialsRegistry {
    pub fn new() -> Self {
        PartialsRegistry::default()
    }

    pub fn register(&mut self, partial: Partial, policy: DuplicatePolicy) -> Result<(), DuplicatePolicyError> {
        if self.partials.contains_key(&partial.identity) {
            match policy {
                DuplicatePolicy::Overwrite => {
                    self.partials.insert(partial.identity.clone(), partial);
                    Ok(())
                }
                DuplicatePolicy::Throw => Err(DuplicatePolicyError::Duplicate { identity: partial.identity }),
                DuplicatePolicy::Ignore => Ok(()),
            }
        } else {
            self.partials.insert(partial.identity.clone(), partial);
            Ok(())
        }
    }

    pub fn get(&self, identity: &str) -> Option<&Partial> {
        self.partials.get(identity)
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partial> {
        self.partials.values()
    }
}
