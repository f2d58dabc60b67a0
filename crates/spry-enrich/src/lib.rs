//! AST enrichment (C4) and content acquisition (C5).
//!
//! The three enrichment sub-passes — spec-block expansion, partial
//! registration, spawnable detection — compose in that strict order
//! (§4.4): expansion can introduce new code cells that the later passes
//! then classify.

pub mod acquire;
pub mod error;
pub mod partials;
pub mod schema;
pub mod spawnables;
pub mod spec_block;

pub use acquire::{AcquireConfig, Acquirer, FetchOutcome, ResolutionMode, SafeFetch};
pub use error::{DuplicatePolicyError, ProvenanceError};
pub use partials::{partial_from_cell, PartialsRegistry};
pub use schema::JsonSchemaValidator;
pub use spawnables::{detect_spawnable, SpawnableConfig, SpawnablesCatalog};
pub use spec_block::{apply_spec_block_expansion, expand_spec_block, ExpandedNotebook, PlacementPolicy, SpecBlockConfig};

use spry_types::{DuplicatePolicy, Notebook};

/// Run the full C4 enrichment pipeline over a freshly parsed notebook:
/// spec-block expansion, then partial registration, then spawnable
/// detection — in that order, as required by §4.4.
pub struct EnrichmentOutcome {
    pub notebook: Notebook,
    pub partials: PartialsRegistry,
    pub spawnables: SpawnablesCatalog,
    pub injected: std::collections::HashMap<usize, spry_types::InjectedNode>,
}

pub fn enrich(
    notebook: Notebook,
    spec_config: &SpecBlockConfig,
    spawnable_config: &SpawnableConfig,
    duplicate_policy: DuplicatePolicy,
    read_file: &dyn Fn(&std::path::Path) -> std::io::Result<String>,
) -> Result<EnrichmentOutcome, DuplicatePolicyError> {
    let expanded = apply_spec_block_expansion(notebook, spec_config, read_file);
    let mut notebook = expanded.notebook;

    let mut partials = PartialsRegistry::new();
    let mut spawnables = SpawnablesCatalog::new();

    for cell in notebook.code_cells_mut() {
        if let Some(partial) = partial_from_cell(cell) {
            partials.register(partial, duplicate_policy)?;
            continue;
        }
        if let Some(spawnable) = detect_spawnable(cell, spawnable_config) {
            spawnables.register(spawnable.clone(), duplicate_policy)?;
            cell.spawnable = Some(spawnable);
        }
    }

    Ok(EnrichmentOutcome { notebook, partials, spawnables, injected: expanded.injected })
}
