//! 4.4.3 Spawnable detection: code cells eligible to become tasks.

use indexmap::IndexMap;
use spry_types::{CodeCell, DuplicatePolicy, Spawnable};

use crate::error::DuplicatePolicyError;

#[derive(Clone, Debug, Default)]
pub struct SpawnableConfig {
    /// Languages (lowercased) eligible for spawnable detection.
    /// Seed: `shell` and its aliases.
    pub languages: Vec<String>,
}

impl SpawnableConfig {
    pub fn with_seed_languages() -> Self {
        SpawnableConfig { languages: vec!["shell".to_string(), "sh".to_string(), "bash".to_string()] }
    }
}

/// Attach spawnable metadata to a code cell, per §4.4.3: eligible
/// language, a PI present, not already a partial, at least one bare PI
/// token.
pub fn detect_spawnable(cell: &CodeCell, config: &SpawnableConfig) -> Option<Spawnable> {
    if !config.languages.iter().any(|lang| lang == &cell.language) {
        return None;
    }
    let pi = cell.pi.as_ref()?;
    if pi.first_bare_word() == Some("PARTIAL") {
        return None;
    }
    Spawnable::from_pi(pi.clone())
}

#[derive(Default)]
pub struct SpawnablesCatalog {
    spawnables: IndexMap<String, Spawnable>,
}

impl SpawnablesCatalog {
    pub fn new() -> Self {
        SpawnablesCatalog::default()
    }

    pub fn register(&mut self, spawnable: Spawnable, policy: DuplicatePolicy) -> Result<(), DuplicatePolicyError> {
        if self.spawnables.contains_key(&spawnable.identity) {
            match policy {
                DuplicatePolicy::Overwrite => {
                    self.spawnables.insert(spawnable.identity.clone(), spawnable);
                    Ok(())
                }
                DuplicatePolicy::Throw => Err(DuplicatePolicyError::Duplicate { identity: spawnable.identity }),
                DuplicatePolicy::Ignore => Ok(()),
            }
        } else {
            self.spawnables.insert(spawnable.identity.clone(), spawnable);
            Ok(())
        }
    }

    pub fn get(&self, identity: &str) -> Option<&Spawnable> {
        self.spawnables.get(identity)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.spawnables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Spawnable> {
        self.spawnables.values()
    }

    pub fn len(&self) -> usize {
        self.spawnables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spawnables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spry_pi::Pi;

    fn cell(language: &str, pi_str: &str) -> CodeCell {
        CodeCell {
            language: language.into(),
            info: pi_str.into(),
            attrs: serde_json::Map::new(),
            source: "echo hi".into(),
            start_line: 1,
            end_line: 2,
            pi: Some(Pi::parse(pi_str, None)),
            spawnable: None,
        }
    }

    #[test]
    fn eligible_language_with_bare_token_becomes_spawnable() {
        let config = SpawnableConfig::with_seed_languages();
        let c = cell("shell", "build --dep fetch");
        let spawnable = detect_spawnable(&c, &config).unwrap();
        assert_eq!(spawnable.identity, "build");
    }

    #[test]
    fn ineligible_language_is_never_spawnable() {
        let config = SpawnableConfig::with_seed_languages();
        let c = cell("sql", "build");
        assert!(detect_spawnable(&c, &config).is_none());
    }

    #[test]
    fn partial_declarations_are_never_spawnable() {
        let config = SpawnableConfig::with_seed_languages();
        let c = cell("shell", "PARTIAL greet");
        assert!(detect_spawnable(&c, &config).is_none());
    }

    #[test]
    fn missing_bare_token_is_never_spawnable() {
        let config = SpawnableConfig::with_seed_languages();
        let c = cell("shell", "--dep fetch");
        assert!(detect_spawnable(&c, &config).is_none());
    }
}
