//! Core domain model shared by every Spry crate downstream of parsing:
//! cells, notebooks, partials, spawnables, and injected nodes.
//!
//! This crate deliberately knows nothing about Markdown parsing,
//! dependency resolution, or execution — it only defines the shapes
//! those stages pass between each other, sitting beneath every other
//! crate in the workspace without depending on any of them.
//! Execution-scoped state (captures, interpolation results) lives in
//! `spry-exec` instead, so this crate never needs an async runtime as
//! a dependency.

mod cell;
mod injected;
mod issue;
mod notebook;
mod partial;
mod provenance;

pub use cell::{Cell, CodeCell, MarkdownCell, Spawnable};
pub use injected::{InjectedNode, InjectedSource, LazyBytes};
pub use issue::{Issue, IssueKind};
pub use notebook::{CellAst, Notebook};
pub use partial::{DuplicatePolicy, InjectionMode, InjectionSpec, Partial, PartialRender, SchemaValidator};
pub use provenance::{Provenance, Source};
