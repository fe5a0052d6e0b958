//! Error types for the comparison harness

use std::path::PathBuf;
use thiserror::Error;

/// Result type for comparison operations
pub type CompareResult<T> = Result<T, CompareError>;

/// Errors that can occur while driving a comparison run
#[derive(Debug, Error)]
pub enum CompareError {
    /// Failed to read the endpoint configuration file
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Endpoint configuration is not a valid JSON endpoint list
    #[error("failed to parse config file {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A server base URL could not be parsed
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// An endpoint descriptor produced a request that cannot be sent
    #[error("invalid request for {method} {path}: {reason}")]
    InvalidRequest {
        method: String,
        path: String,
        reason: String,
    },

    /// The underlying HTTP client could not be constructed
    #[error("failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },

    /// A request failed at the transport level (timeout, refused, DNS)
    #[error("request to {server} failed: {source}")]
    Transport {
        server: String,
        #[source]
        source: reqwest::Error,
    },

    /// The report could not be serialized
    #[error("failed to serialize report: {source}")]
    SerializeReport {
        #[source]
        source: serde_json::Error,
    },

    /// The report file could not be written
    #[error("failed to write report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
