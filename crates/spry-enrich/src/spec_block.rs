//! 4.4.1 Spec-block expansion: `import`-language fences whose body lines
//! name files or URLs to splice into the document as injected nodes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::glob;
use spry_types::{Cell, CodeCell, InjectedNode, InjectedSource, Notebook};

/// Where injected nodes land relative to the spec block that produced
/// them. Pinned default: `RetainAfterInjections` (see DESIGN.md).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementPolicy {
    RetainAfterInjections,
    RemoveBeforeInjections,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        PlacementPolicy::RetainAfterInjections
    }
}

pub struct SpecBlockConfig {
    pub language_predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
    pub placement: PlacementPolicy,
    pub default_base: PathBuf,
}

impl Default for SpecBlockConfig {
    fn default() -> Self {
        SpecBlockConfig {
            language_predicate: Arc::new(|lang| lang == "import" || lang == "utf8"),
            placement: PlacementPolicy::default(),
            default_base: crate::acquire::default_base_dir(),
        }
    }
}

struct SpecLine {
    glob_or_url: String,
    rest: String,
    base: PathBuf,
}

/// Parse one non-comment, non-blank spec-block body line:
/// `<globOrUrl> [rest...]`, honoring a preceding `--base <dir>` line.
fn parse_spec_line(line: &str, current_base: &Path) -> Option<SpecLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let mut parts = trimmed.split_whitespace();
    let glob_or_url = parts.next()?.to_string();
    let rest: Vec<&str> = parts.collect();
    Some(SpecLine { glob_or_url, rest: rest.join(" "), base: current_base.to_path_buf() })
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Expand one spec-block body into its injected nodes. `spec_language`
/// is the fence's own language tag (`import` vs. the binary-marking
/// `utf8` alias). `read_file` reads a local file's contents
/// synchronously (callers in async contexts should pre-read or wrap in
/// `spawn_blocking`); kept as an injected function so this pass has no
/// direct filesystem dependency.
pub fn expand_spec_block(
    body: &str,
    spec_language: &str,
    config: &SpecBlockConfig,
    read_file: &dyn Fn(&Path) -> std::io::Result<String>,
) -> Vec<InjectedNode> {
    let mut nodes = Vec::new();
    let mut base = config.default_base.clone();
    let treat_as_binary = spec_language == "utf8";

    for line in body.lines() {
        let trimmed = line.trim();
        if let Some(dir) = trimmed.strip_prefix("--base ") {
            base = PathBuf::from(dir.trim());
            continue;
        }

        let Some(spec_line) = parse_spec_line(line, &base) else { continue };

        if is_http_url(&spec_line.glob_or_url) {
            let meta = format!("{} --import {} {}", spec_line.glob_or_url, spec_line.glob_or_url, spec_line.rest).trim().to_string();
            nodes.push(InjectedNode::binary(meta, spec_line.glob_or_url.clone(), None));
            continue;
        }

        let pattern = spec_line.base.join(&spec_line.glob_or_url);
        let Ok(paths) = glob(&pattern.to_string_lossy()) else { continue };
        for entry in paths.flatten() {
            let rel = entry.strip_prefix(&spec_line.base).unwrap_or(&entry).to_string_lossy().to_string();
            if treat_as_binary {
                let meta = format!("{rel} --import {} --is-binary {}", entry.display(), spec_line.rest).trim().to_string();
                nodes.push(InjectedNode::binary(meta, entry.to_string_lossy().to_string(), None));
            } else {
                let content = read_file(&entry).unwrap_or_default();
                let meta = format!("{rel} --import {} {}", entry.display(), spec_line.rest).trim().to_string();
                nodes.push(InjectedNode::text(meta, content.clone(), entry.to_string_lossy().to_string(), content));
            }
        }
    }

    nodes
}

/// The result of applying spec-block expansion across a whole
/// notebook: the notebook with injected `CodeCell`s spliced in, and a
/// side table from cell index to the originating `InjectedNode` (the
/// only place the lazy byte-stream / binary provenance detail lives —
/// `CodeCell` itself has no such field, see DESIGN.md).
pub struct ExpandedNotebook {
    pub notebook: Notebook,
    pub injected: std::collections::HashMap<usize, InjectedNode>,
}

pub fn apply_spec_block_expansion(
    mut notebook: Notebook,
    config: &SpecBlockConfig,
    read_file: &dyn Fn(&Path) -> std::io::Result<String>,
) -> ExpandedNotebook {
    // Collect (index, injected nodes) first, then mutate right-to-left
    // so earlier indices stay valid (§4.4.1 / §9).
    let mut insertions: Vec<(usize, Vec<InjectedNode>)> = Vec::new();
    for (i, cell) in notebook.cells.iter().enumerate() {
        if let Cell::Code(code) = cell {
            if config.language_predicate.as_ref()(&code.language) {
                let nodes = expand_spec_block(&code.source, &code.language, config, read_file);
                if !nodes.is_empty() {
                    insertions.push((i, nodes));
                }
            }
        }
    }

    let mut injected = std::collections::HashMap::new();
    for (index, nodes) in insertions.into_iter().rev() {
        let mut new_cells: Vec<Cell> = Vec::new();
        if matches!(config.placement, PlacementPolicy::RetainAfterInjections) {
            new_cells.push(notebook.cells[index].clone());
        }
        let start_insert_at = new_cells.len();
        for node in &nodes {
            new_cells.push(injected_node_to_cell(node));
        }
        notebook.cells.splice(index..=index, new_cells);
        for (offset, node) in nodes.into_iter().enumerate() {
            injected.insert(index + start_insert_at + offset, node);
        }
    }

    ExpandedNotebook { notebook, injected }
}

fn injected_node_to_cell(node: &InjectedNode) -> Cell {
    let pi = spry_pi::Pi::parse(node.meta.as_str(), None);
    let is_binary = matches!(node.source, InjectedSource::Binary { .. });
    Cell::Code(CodeCell {
        language: "text".to_string(),
        info: node.meta.clone(),
        attrs: serde_json::Map::new(),
        source: if is_binary { String::new() } else { node.value.clone() },
        start_line: 0,
        end_line: 0,
        pi: Some(pi),
        spawnable: None,
    })
}
