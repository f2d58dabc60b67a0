//! `spry.toml` project configuration, layered underneath CLI flags.
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────────┐
//! │ Key           │ Overrides                                      │
//! ├───────────────┼──────────────────────────────────────────────┤
//! │ base          │ default spec-block/glob base directory        │
//! │ allowed_hosts │ C5 fetch allow-list                           │
//! │ timeout_secs  │ C5 fetch timeout                               │
//! │ max_bytes     │ C5 fetch size cap                              │
//! │ recursion_limit │ C8 interpolation recursion cap               │
//! └───────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Precedence: explicit CLI flags always win over whatever `spry.toml`
//! supplies; file values win over the engine's own built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SpryConfig {
    pub base: Option<PathBuf>,
    pub allowed_hosts: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub max_bytes: Option<u64>,
    pub recursion_limit: Option<usize>,
}

impl SpryConfig {
    /// Load `spry.toml` from `dir` if present; a missing file is not an
    /// error and yields the all-`None` default.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let path = dir.join("spry.toml");
        if !path.exists() {
            return Ok(SpryConfig::default());
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
    }
}
