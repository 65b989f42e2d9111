use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;

/// Main application error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum TestNodError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to perform request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timeout: {url} after {timeout_seconds} seconds")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("received non-OK response: {status}{}", remote_message(.message))]
    UnexpectedStatus {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("failed to marshal request body: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to decode response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    #[error("failed to open file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing XML at byte {position}: {details}")]
    MalformedXml { position: u64, details: String },

    #[error("{} doesn't seem to be a valid JUnit XML file", .path.display())]
    NotJUnit { path: PathBuf },

    #[error("no file specified")]
    NoFile,

    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("no token specified")]
    MissingToken,

    #[error("Configuration error: {0}")]
    Config(String),
}

fn remote_message(message: &Option<String>) -> String {
    match message {
        Some(message) => format!(" ({message})"),
        None => String::new(),
    }
}

impl From<ConfigError> for TestNodError {
    fn from(err: ConfigError) -> Self {
        TestNodError::Config(err.to_string())
    }
}

impl TestNodError {
    /// Local precondition failures are detected before any network activity
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TestNodError::NoFile
                | TestNodError::FileNotFound { .. }
                | TestNodError::MissingToken
                | TestNodError::Config(_)
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TestNodError>;
