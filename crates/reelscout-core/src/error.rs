//! Error types for the reelscout pipeline.
//!
//! Errors are organized by subsystem so call sites can report actionable
//! messages with the media reference or file path that triggered them.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for reelscout operations.
#[derive(Error, Debug)]
pub enum ReelError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inference gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Creator scraping and download errors
    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors from inference gateway calls.
///
/// A `status_code` is attached when the failure maps to an HTTP response,
/// so the retry layer can classify it without string matching.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The gateway (or the model runtime behind it) rejected the call
    #[error("Gateway error: {message}")]
    Gateway {
        message: String,
        status_code: Option<u16>,
    },

    /// Call exceeded its deadline
    #[error("Timeout for {media} after {timeout_ms}ms")]
    Timeout { media: String, timeout_ms: u64 },

    /// Local media reference does not exist
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Batched call returned a result list that does not line up with input
    #[error("Batch result count mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Errors from creator resolution and media download.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Creator URL did not match the expected format
    #[error("Invalid creator URL: {0}")]
    InvalidUrl(String),

    /// The scraping API returned a failure envelope or transport error
    #[error("Creator API error: {message}")]
    Api { message: String },

    /// A media download failed
    #[error("Download failed for {url}: {message}")]
    Download { url: String, message: String },

    /// Downloader process exceeded its deadline
    #[error("Download timed out for {url} after {timeout_ms}ms")]
    DownloadTimeout { url: String, timeout_ms: u64 },

    /// Filesystem failures while saving media
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for reelscout results.
pub type Result<T> = std::result::Result<T, ReelError>;

/// Convenience type alias for gateway-call results.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
