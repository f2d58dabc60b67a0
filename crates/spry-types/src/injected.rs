use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

/// A lazily-materialized byte stream, e.g. "read this file when someone
/// actually asks for its bytes" rather than eagerly.
pub type LazyBytes = Arc<dyn Fn() -> BoxFuture<'static, std::io::Result<Vec<u8>>> + Send + Sync>;

/// Where an [`InjectedNode`] came from.
#[derive(Clone)]
pub enum InjectedSource {
    /// Content was read eagerly; `original` is the raw text as found at
    /// `imported_from`.
    Text { imported_from: String, original: String },
    /// Content is treated as binary and is read on demand via `stream`.
    Binary { imported_from: String, encoding: &'static str, stream: Option<LazyBytes> },
}

impl fmt::Debug for InjectedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectedSource::Text { imported_from, original } => f
                .debug_struct("Text")
                .field("imported_from", imported_from)
                .field("original_len", &original.len())
                .finish(),
            InjectedSource::Binary { imported_from, encoding, stream } => f
                .debug_struct("Binary")
                .field("imported_from", imported_from)
                .field("encoding", encoding)
                .field("stream", &stream.is_some())
                .finish(),
        }
    }
}

impl InjectedSource {
    pub fn is_binary(&self) -> bool {
        matches!(self, InjectedSource::Binary { .. })
    }

    pub fn imported_from(&self) -> &str {
        match self {
            InjectedSource::Text { imported_from, .. } => imported_from,
            InjectedSource::Binary { imported_from, .. } => imported_from,
        }
    }
}

/// A synthetic code node materialized by spec-block expansion (see
/// `spry-enrich`'s import pass). `meta` is the reconstructed PI-like
/// string (`"<relPath> --import <url> [--is-binary] [rest...]"`);
/// `value` is the eagerly-read text, or empty for binary/lazy sources.
#[derive(Clone, Debug)]
pub struct InjectedNode {
    pub meta: String,
    pub value: String,
    pub source: InjectedSource,
}

impl InjectedNode {
    pub fn text(meta: impl Into<String>, value: impl Into<String>, imported_from: impl Into<String>, original: impl Into<String>) -> Self {
        let imported_from = imported_from.into();
        let original = original.into();
        InjectedNode {
            meta: meta.into(),
            value: value.into(),
            source: InjectedSource::Text { imported_from, original },
        }
    }

    pub fn binary(meta: impl Into<String>, imported_from: impl Into<String>, stream: Option<LazyBytes>) -> Self {
        InjectedNode {
            meta: meta.into(),
            value: String::new(),
            source: InjectedSource::Binary { imported_from: imported_from.into(), encoding: "UTF-8", stream },
        }
    }
}
