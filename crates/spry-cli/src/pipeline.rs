//! Shared parse → enrich pipeline used by every subcommand.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use spry_enrich::{enrich, AcquireConfig, Acquirer, EnrichmentOutcome, FetchOutcome, ResolutionMode, SpawnableConfig, SpecBlockConfig};
use spry_types::{Cell, DuplicatePolicy, InjectedSource, Source};

use crate::config::SpryConfig;

pub fn read_notebook_source(file: &Path) -> Result<Source> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    Ok(Source::file(content, file.to_path_buf()))
}

/// Parse `file` and run the full C4 enrichment pipeline over it, using
/// `config`'s `base` (if set) as the spec-block default base directory.
/// Any spec-block line naming a remote `http(s)` URL is then fetched for
/// real through C5's `Acquirer`, so a runbook's imported nodes carry
/// actual content rather than the permanently empty placeholder
/// `expand_spec_block` stamps in at parse time.
pub async fn load_enriched(file: &Path, config: &SpryConfig) -> Result<EnrichmentOutcome> {
    let source = read_notebook_source(file)?;
    let notebook = spry_parser::parse_notebook(&source);

    let default_base: PathBuf = config
        .base
        .clone()
        .or_else(|| file.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let spec_config = SpecBlockConfig { default_base, ..SpecBlockConfig::default() };
    let spawnable_config = SpawnableConfig::with_seed_languages();

    let read_file = |p: &Path| std::fs::read_to_string(p);
    let mut outcome = enrich(notebook, &spec_config, &spawnable_config, DuplicatePolicy::Throw, &read_file)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    materialize_remote_injections(&mut outcome, config).await?;
    Ok(outcome)
}

/// Fetch every spec-block-injected node whose source names a remote
/// `http(s)` URL and whose bytes weren't read eagerly by
/// `expand_spec_block`, using `config`'s `allowed_hosts`/`timeout_secs`/
/// `max_bytes` to build the fetch's `AcquireConfig`. Both the
/// originating `InjectedNode` and its spliced-in `CodeCell` are updated
/// with the fetched text so downstream interpolation/execution sees the
/// real content.
async fn materialize_remote_injections(outcome: &mut EnrichmentOutcome, config: &SpryConfig) -> Result<()> {
    let remote: Vec<(usize, String)> = outcome
        .injected
        .iter()
        .filter_map(|(index, node)| match &node.source {
            InjectedSource::Binary { imported_from, stream: None, .. }
                if imported_from.starts_with("http://") || imported_from.starts_with("https://") =>
            {
                Some((*index, imported_from.clone()))
            }
            _ => None,
        })
        .collect();

    if remote.is_empty() {
        return Ok(());
    }

    let acquire_config = AcquireConfig {
        timeout: Duration::from_secs(config.timeout_secs.unwrap_or(10)),
        max_bytes: config.max_bytes.unwrap_or(10 * 1024 * 1024),
        allowed_hosts: config.allowed_hosts.clone(),
        ..AcquireConfig::default()
    };
    let acquirer = Acquirer::new(acquire_config);

    for (index, uri) in remote {
        let fetched = acquirer
            .fetch(&uri, ResolutionMode::ModuleRelative, None)
            .await
            .with_context(|| format!("fetching spec-block import `{uri}`"))?;
        let content = match fetched {
            FetchOutcome::Fresh(source) => source.content,
            FetchOutcome::NotModified => continue,
        };

        if let Some(node) = outcome.injected.get_mut(&index) {
            node.value = content.clone();
        }
        if let Some(Cell::Code(cell)) = outcome.notebook.cells.get_mut(index) {
            cell.source = content;
        }
    }

    Ok(())
}
