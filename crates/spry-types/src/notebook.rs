use std::collections::HashMap;

use serde_json::Value;

use crate::cell::{Cell, CodeCell, Spawnable};
use crate::issue::Issue;

/// A cached reference to the underlying Markdown AST node(s) a cell
/// was built from, kept as byte offsets rather than borrowed
/// `pulldown_cmark::Event`s so `Notebook` owns its data independent of
/// the parser's lifetime. `spry-parser` is the only crate that needs
/// the original events; everything downstream works off `Cell`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellAst {
    pub start_offset: usize,
    pub end_offset: usize,
}

/// An ordered list of cells produced by parsing one Markdown document,
/// immutable once parsing completes (enrichment passes work against a
/// scratch copy — see `spry-enrich`).
#[derive(Clone, Debug, Default)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub fm: Value,
    pub issues: Vec<Issue>,
    pub ast_cache: HashMap<usize, Vec<CellAst>>,
}

impl Notebook {
    pub fn new() -> Self {
        Notebook { cells: Vec::new(), fm: Value::Null, issues: Vec::new(), ast_cache: HashMap::new() }
    }

    pub fn push_issue(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn code_cells(&self) -> impl Iterator<Item = &CodeCell> {
        self.cells.iter().filter_map(Cell::as_code)
    }

    pub fn code_cells_mut(&mut self) -> impl Iterator<Item = &mut CodeCell> {
        self.cells.iter_mut().filter_map(Cell::as_code_mut)
    }

    pub fn spawnables(&self) -> impl Iterator<Item = &Spawnable> {
        self.code_cells().filter_map(|c| c.spawnable.as_ref())
    }

    pub fn has_fence_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
