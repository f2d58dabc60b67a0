use std::path::PathBuf;

use url::Url;

/// Where a [`crate::Source`]'s content came from.
///
/// ```text
/// ┌──────────┬────────────────────────────────────────────┐
/// │ Variant  │ Meaning                                     │
/// ├──────────┼────────────────────────────────────────────┤
/// │ File     │ read from a local filesystem path          │
/// │ Url      │ fetched over http(s)                        │
/// │ Prime    │ supplied inline, no backing resource        │
/// └──────────┴────────────────────────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provenance {
    File(PathBuf),
    Url(Url),
    Prime,
}

impl Provenance {
    pub fn is_remote(&self) -> bool {
        matches!(self, Provenance::Url(_))
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::File(p) => write!(f, "{}", p.display()),
            Provenance::Url(u) => write!(f, "{u}"),
            Provenance::Prime => write!(f, "<prime>"),
        }
    }
}

/// An opaque content string tagged with where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub content: String,
    pub provenance: Provenance,
}

impl Source {
    pub fn prime(content: impl Into<String>) -> Self {
        Source { content: content.into(), provenance: Provenance::Prime }
    }

    pub fn file(content: impl Into<String>, path: PathBuf) -> Self {
        Source { content: content.into(), provenance: Provenance::File(path) }
    }

    pub fn url(content: impl Into<String>, url: Url) -> Self {
        Source { content: content.into(), provenance: Provenance::Url(url) }
    }
}
