//! Where the requirement tree comes from
//!
//! This module provides a trait-based abstraction over entry sources,
//! allowing the tree to be loaded from a REST endpoint, a local file or the
//! built-in sample data while the rest of the system only sees `Vec<Entry>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FetchError;
use crate::models::{self, DecodedTree, Entry};
use crate::sample::sample_entries;

/// Default REST endpoint base
pub const DEFAULT_BASE_URL: &str = "https://api.example.com";
/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default collection (repository) id
pub const DEFAULT_COLLECTION_ID: &str = "1";

/// Types of entry sources available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// REST endpoint
    Http,
    /// Local JSON or YAML file
    File,
    /// Built-in sample mapping
    #[default]
    Sample,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Http => write!(f, "http"),
            SourceKind::File => write!(f, "file"),
            SourceKind::Sample => write!(f, "sample"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" | "https" | "rest" => Ok(SourceKind::Http),
            "file" => Ok(SourceKind::File),
            "sample" | "mock" => Ok(SourceKind::Sample),
            other => Err(format!(
                "Invalid source '{}'. Expected one of: http, file, sample",
                other
            )),
        }
    }
}

/// Configuration for entry sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Base URL for the REST source
    pub base_url: String,
    /// Path for the file source
    pub path: Option<PathBuf>,
    /// Repository whose mapping is fetched
    pub collection_id: String,
    /// Request timeout for the REST source
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Request timeout, never below one second
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Sample,
            base_url: DEFAULT_BASE_URL.to_string(),
            path: None,
            collection_id: DEFAULT_COLLECTION_ID.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Core trait for entry sources
///
/// Implementations are called from a background thread, hence `Send + Sync`.
pub trait EntrySource: Send + Sync {
    /// Loads the full requirement tree for a collection
    fn fetch_entries(&self, collection_id: &str) -> Result<Vec<Entry>, FetchError>;

    /// Short human-readable description (shown in status bars and logs)
    fn describe(&self) -> String;
}

/// Creates an entry source from configuration
pub fn create_source(config: &SourceConfig) -> Result<Box<dyn EntrySource>, FetchError> {
    match config.kind {
        SourceKind::Http => Ok(Box::new(HttpSource::new(&config.base_url, config.timeout())?)),
        SourceKind::File => {
            let path = config.path.clone().ok_or_else(|| {
                FetchError::NotConfigured("no file path set for the file source".to_string())
            })?;
            Ok(Box::new(FileSource::new(path)))
        }
        SourceKind::Sample => Ok(Box::new(SampleSource::new())),
    }
}

fn log_skipped(decoded: &DecodedTree, origin: &str) {
    if decoded.skipped > 0 {
        log::warn!(
            "Dropped {} malformed entr{} from {}",
            decoded.skipped,
            if decoded.skipped == 1 { "y" } else { "ies" },
            origin
        );
    }
}

// =============================================================================
// REST
// =============================================================================

/// Error body returned by the API on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Maps a non-2xx response to an error, preferring the server's own message
fn status_error(status: u16, body: &str) -> FetchError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| "An error occurred".to_string());
    FetchError::Status { status, message }
}

/// Fetches `GET {base_url}/repositories/{id}/srs-mapping`
///
/// No retry: a failed request is reported and the user decides when to try again.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: reqwest::Url,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let parsed = reqwest::Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            FetchError::NotConfigured(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(FetchError::NotConfigured(format!(
                "base URL '{}' cannot hold a path",
                base_url
            )));
        }

        let user_agent = format!("srsmap/{}", env!("CARGO_PKG_VERSION"));
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: parsed,
            timeout,
        })
    }

    /// Endpoint for a collection's mapping; the id is escaped as one path segment
    pub fn endpoint(&self, collection_id: &str) -> reqwest::Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["repositories", collection_id, "srs-mapping"]);
        }
        url
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs())
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl EntrySource for HttpSource {
    fn fetch_entries(&self, collection_id: &str) -> Result<Vec<Entry>, FetchError> {
        let url = self.endpoint(collection_id);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.map_error(e))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }

        let decoded = models::decode_json(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        log_skipped(&decoded, url.as_str());
        Ok(decoded.entries)
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}

// =============================================================================
// Local file
// =============================================================================

/// Reads the tree from a `.json`, `.yaml` or `.yml` file; the collection id is ignored
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("json")
        )
    }
}

impl EntrySource for FileSource {
    fn fetch_entries(&self, _collection_id: &str) -> Result<Vec<Entry>, FetchError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| FetchError::Io {
            path: self.path.clone(),
            source,
        })?;

        // Infer from file extension, YAML by default
        let decoded = if self.is_json() {
            models::decode_json(&text).map_err(|e| FetchError::Decode(e.to_string()))?
        } else {
            models::decode_yaml(&text).map_err(|e| FetchError::Decode(e.to_string()))?
        };

        log_skipped(&decoded, &self.path.display().to_string());
        Ok(decoded.entries)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// =============================================================================
// Sample data
// =============================================================================

/// Serves the built-in sample mapping, optionally after a delay
#[derive(Debug, Clone, Default)]
pub struct SampleSource {
    delay: Duration,
}

impl SampleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates network latency
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl EntrySource for SampleSource {
    fn fetch_entries(&self, _collection_id: &str) -> Result<Vec<Entry>, FetchError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(sample_entries())
    }

    fn describe(&self) -> String {
        "sample data".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("HTTP".parse::<SourceKind>(), Ok(SourceKind::Http));
        assert_eq!("mock".parse::<SourceKind>(), Ok(SourceKind::Sample));
        assert!("ftp".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_http_endpoint() -> Result<()> {
        let source = HttpSource::new("https://api.example.com/", Duration::from_secs(1))?;
        assert_eq!(
            source.endpoint("1").as_str(),
            "https://api.example.com/repositories/1/srs-mapping"
        );

        let nested = HttpSource::new("https://srs.internal/api", Duration::from_secs(1))?;
        assert_eq!(
            nested.endpoint("a/b?c").as_str(),
            "https://srs.internal/api/repositories/a%2Fb%3Fc/srs-mapping"
        );
        Ok(())
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpSource::new("not a url", Duration::from_secs(1)),
            Err(FetchError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_status_error_message() {
        match status_error(404, r#"{"message": "Repository not found"}"#) {
            FetchError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Repository not found");
            }
            other => panic!("unexpected error {:?}", other),
        }

        for body in ["", "<html>Bad Gateway</html>", r#"{"error": "x"}"#] {
            match status_error(502, body) {
                FetchError::Status { message, .. } => assert_eq!(message, "An error occurred"),
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let config = SourceConfig {
            kind: SourceKind::Http,
            timeout_secs: 0,
            ..SourceConfig::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(1));
        assert!(create_source(&config).is_ok());
        assert_eq!(SourceConfig::default().timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_sample_source() -> Result<()> {
        let source = SampleSource::new();
        assert_eq!(source.fetch_entries("1")?.len(), 4);
        Ok(())
    }

    #[test]
    fn test_file_source_json_and_yaml() -> Result<()> {
        let dir = tempdir()?;
        let entries = sample_entries();

        let json_path = dir.path().join("mapping.json");
        std::fs::write(&json_path, serde_json::to_string_pretty(&entries)?)?;
        assert_eq!(FileSource::new(&json_path).fetch_entries("ignored")?, entries);

        let yaml_path = dir.path().join("mapping.yaml");
        std::fs::write(&yaml_path, serde_yaml::to_string(&entries)?)?;
        assert_eq!(FileSource::new(&yaml_path).fetch_entries("ignored")?, entries);

        Ok(())
    }

    #[test]
    fn test_file_source_errors() -> Result<()> {
        let dir = tempdir()?;
        let missing = FileSource::new(dir.path().join("missing.yaml"));
        assert!(matches!(missing.fetch_entries("1"), Err(FetchError::Io { .. })));

        let bad_path = dir.path().join("bad.json");
        std::fs::write(&bad_path, "{ not json")?;
        let bad = FileSource::new(&bad_path);
        assert!(matches!(bad.fetch_entries("1"), Err(FetchError::Decode(_))));
        Ok(())
    }

    #[test]
    fn test_create_source_requires_path_for_file() {
        let config = SourceConfig {
            kind: SourceKind::File,
            ..SourceConfig::default()
        };
        assert!(create_source(&config).is_err());

        let config = SourceConfig::default();
        let source = create_source(&config).unwrap();
        assert_eq!(source.describe(), "sample data");
    }
}
