use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the requirement tree
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Could not decode SRS mappings: {0}")]
    Decode(String),

    #[error("Source not configured: {0}")]
    NotConfigured(String),

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the system clipboard
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard access denied")]
    PermissionDenied,

    #[error("Clipboard not available on this system")]
    Unsupported,

    #[error("Clipboard error: {0}")]
    Other(String),
}

/// Errors reading or writing the settings file
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not determine a configuration directory")]
    NoConfigDir,

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
