/// Errors surfaced by content acquisition (C5): reading a
/// [`spry_types::Provenance`] from the local filesystem or over HTTP(S).
///
/// ```text
///   ProvenanceError
///   ├── UnsupportedScheme   ← neither file:// nor http(s)://
///   ├── HttpNotAllowed      ← host not on the allow-list
///   ├── FetchFailed         ← transport-level failure
///   ├── Timeout             ← exceeded the configured deadline
///   ├── TooLarge            ← exceeded the byte-size cap
///   └── Io                  ← local filesystem read failed
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("unsupported scheme `{scheme}` in `{uri}`")]
    UnsupportedScheme { scheme: String, uri: String },

    #[error("host `{host}` is not on the allowed-host list")]
    HttpNotAllowed { host: String },

    #[error("fetch failed for `{uri}`: {source}")]
    FetchFailed { uri: String, #[source] source: reqwest::Error },

    #[error("fetch of `{uri}` timed out after {millis}ms")]
    Timeout { uri: String, millis: u64 },

    #[error("`{uri}` exceeded the {max_bytes}-byte size cap ({seen_bytes} bytes and counting)")]
    TooLarge { uri: String, max_bytes: u64, seen_bytes: u64 },

    #[error("I/O error reading `{path}`: {source}")]
    Io { path: String, #[source] source: std::io::Error },
}

/// What a caller wants to happen when a [`spry_types::Partial`] or
/// [`spry_types::Spawnable`] is registered under an identity that's
/// already taken.
#[derive(Debug, thiserror::Error)]
pub enum DuplicatePolicyError {
    #[error("identity `{identity}` is already registered and the duplicate policy is `throw`")]
    Duplicate { identity: String },

    #[error("`{identity}` is not a valid partial: first bare PI token must equal `PARTIAL`")]
    NotAPartial { identity: String },
}
