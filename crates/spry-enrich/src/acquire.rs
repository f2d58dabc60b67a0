//! C5: uniform local-FS / HTTP(S) content acquisition.
//!
//! Networked reads are streamed so an oversized response is aborted
//! mid-flight rather than fully buffered first; local reads go through
//! `tokio::fs` as the single suspension point they need.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use url::Url;

use spry_types::{Provenance, Source};

use crate::error::ProvenanceError;

#[derive(Clone, Debug)]
pub struct AcquireConfig {
    pub timeout: Duration,
    pub max_bytes: u64,
    /// `None` allows every host; `Some(list)` restricts to it.
    pub allowed_hosts: Option<Vec<String>>,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        AcquireConfig {
            timeout: Duration::from_secs(10),
            max_bytes: 10 * 1024 * 1024,
            allowed_hosts: None,
            max_retries: 2,
            backoff_base: Duration::from_millis(200),
        }
    }
}

/// Resolution mode for [`Acquirer::fetch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionMode {
    /// `file:` and `http(s):` both allowed.
    ModuleRelative,
    /// Only local file paths / `file:` URLs.
    LocalFs,
}

pub enum FetchOutcome {
    Fresh(Source),
    /// The caller's `If-None-Match` matched; no body was transferred.
    NotModified,
}

/// The non-throwing counterpart to [`Acquirer::fetch`]'s `Result`.
pub enum SafeFetch {
    Ok(FetchOutcome),
    Error { error: ProvenanceError, uri: String },
}

pub struct Acquirer {
    client: reqwest::Client,
    config: AcquireConfig,
}

impl Acquirer {
    pub fn new(config: AcquireConfig) -> Self {
        let client = reqwest::Client::builder().timeout(config.timeout).build().unwrap_or_default();
        Acquirer { client, config }
    }

    /// Safe variant: never propagates an error, returns it as data
    /// instead (per §4.5, "safe variants never throw").
    pub async fn fetch_safe(&self, uri: &str, mode: ResolutionMode, if_none_match: Option<&str>) -> SafeFetch {
        match self.fetch(uri, mode, if_none_match).await {
            Ok(outcome) => SafeFetch::Ok(outcome),
            Err(error) => SafeFetch::Error { error, uri: uri.to_string() },
        }
    }

    pub async fn fetch(&self, uri: &str, mode: ResolutionMode, if_none_match: Option<&str>) -> Result<FetchOutcome, ProvenanceError> {
        if let Some(path) = uri.strip_prefix("file://") {
            return self.fetch_file(Path::new(path)).await;
        }
        if let Ok(url) = Url::parse(uri) {
            if url.scheme() == "http" || url.scheme() == "https" {
                if mode == ResolutionMode::LocalFs {
                    return Err(ProvenanceError::UnsupportedScheme { scheme: url.scheme().to_string(), uri: uri.to_string() });
                }
                return self.fetch_http(url, if_none_match).await;
            }
            if url.scheme() != "file" {
                return Err(ProvenanceError::UnsupportedScheme { scheme: url.scheme().to_string(), uri: uri.to_string() });
            }
        }
        self.fetch_file(Path::new(uri)).await
    }

    async fn fetch_file(&self, path: &Path) -> Result<FetchOutcome, ProvenanceError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ProvenanceError::Io { path: path.display().to_string(), source })?;
        let content = decode_text(&bytes, None);
        Ok(FetchOutcome::Fresh(Source::file(content, path.to_path_buf())))
    }

    async fn fetch_http(&self, url: Url, if_none_match: Option<&str>) -> Result<FetchOutcome, ProvenanceError> {
        if let Some(allowed) = &self.config.allowed_hosts {
            let host = url.host_str().unwrap_or_default();
            if !allowed.iter().any(|h| h == host) {
                return Err(ProvenanceError::HttpNotAllowed { host: host.to_string() });
            }
        }

        let mut attempt = 0u32;
        loop {
            match self.try_fetch_http(&url, if_none_match).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if attempt < self.config.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    tokio::time::sleep(self.config.backoff_base * 2u32.pow(attempt - 1)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_fetch_http(&self, url: &Url, if_none_match: Option<&str>) -> Result<FetchOutcome, ProvenanceError> {
        let mut req = self.client.get(url.clone());
        if let Some(etag) = if_none_match {
            req = req.header(reqwest::header::IF_NONE_MATCH, etag);
        }

        let uri = url.to_string();
        let response = tokio::time::timeout(self.config.timeout, req.send())
            .await
            .map_err(|_| ProvenanceError::Timeout { uri: uri.clone(), millis: self.config.timeout.as_millis() as u64 })?
            .map_err(|source| ProvenanceError::FetchFailed { uri: uri.clone(), source })?;

        if response.status() == reqwest::StatusCode::NOT_MODIFIED {
            return Ok(FetchOutcome::NotModified);
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let max_bytes = self.config.max_bytes;
        let mut buf: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| ProvenanceError::FetchFailed { uri: uri.clone(), source })?;
            buf.extend_from_slice(&chunk);
            if buf.len() as u64 > max_bytes {
                return Err(ProvenanceError::TooLarge { uri: uri.clone(), max_bytes, seen_bytes: buf.len() as u64 });
            }
        }

        let content = decode_text(&buf, content_type.as_deref());
        Ok(FetchOutcome::Fresh(Source::url(content, url.clone())))
    }
}

fn is_retryable(err: &ProvenanceError) -> bool {
    matches!(err, ProvenanceError::FetchFailed { .. } | ProvenanceError::Timeout { .. })
}

/// Decode `bytes` per the `charset` declared in `content-type`
/// (defaulting to `utf-8`), never failing on invalid input — unmappable
/// bytes become `U+FFFD` rather than erroring the read (§4.5).
fn decode_text(bytes: &[u8], content_type: Option<&str>) -> String {
    let charset = content_type
        .and_then(|ct| ct.split(';').nth(1))
        .and_then(|param| param.trim().strip_prefix("charset="))
        .unwrap_or("utf-8");

    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes()).unwrap_or(encoding_rs::UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Resolve a provenance tag back into a fetchable URI string, for
/// callers that already hold a [`Provenance`] (e.g. re-fetching an
/// injected node's origin).
pub fn provenance_uri(provenance: &Provenance) -> Option<String> {
    match provenance {
        Provenance::File(path) => Some(path.display().to_string()),
        Provenance::Url(url) => Some(url.to_string()),
        Provenance::Prime => None,
    }
}

pub fn default_base_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reading_a_missing_file_surfaces_io_error() {
        let acquirer = Acquirer::new(AcquireConfig::default());
        let result = acquirer.fetch("/no/such/file.md", ResolutionMode::LocalFs, None).await;
        assert!(matches!(result, Err(ProvenanceError::Io { .. })));
    }

    #[tokio::test]
    async fn local_fs_mode_rejects_http_urls() {
        let acquirer = Acquirer::new(AcquireConfig::default());
        let result = acquirer.fetch("https://example.com/a.md", ResolutionMode::LocalFs, None).await;
        assert!(matches!(result, Err(ProvenanceError::UnsupportedScheme { .. })));
    }

    #[test]
    fn decode_text_honors_a_declared_non_utf8_charset() {
        // 0xE9 is "é" in ISO-8859-1; invalid as a standalone UTF-8 byte.
        let bytes = [b'c', b'a', b'f', 0xE9];
        let decoded = decode_text(&bytes, Some("text/plain; charset=iso-8859-1"));
        assert_eq!(decoded, "caf\u{e9}");
    }

    #[test]
    fn decode_text_defaults_to_utf8_without_a_content_type() {
        let decoded = decode_text("hello".as_bytes(), None);
        assert_eq!(decoded, "hello");
    }

    #[tokio::test]
    async fn reads_a_real_file_through_module_relative_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.md");
        tokio::fs::write(&path, "hello").await.unwrap();
        let acquirer = Acquirer::new(AcquireConfig::default());
        let outcome = acquirer.fetch(path.to_str().unwrap(), ResolutionMode::ModuleRelative, None).await.unwrap();
        match outcome {
            FetchOutcome::Fresh(source) => assert_eq!(source.content, "hello"),
            FetchOutcome::NotModified => panic!("expected fresh content"),
        }
    }
}
