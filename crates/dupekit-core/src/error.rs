//! Error types for the deduplication engine.
//!
//! Degraded fingerprints are not errors: a missing perceptual or acoustic
//! channel is recorded on the [`Fingerprint`](crate::types::Fingerprint)
//! itself. The types here cover what callers must see: bad configuration,
//! unreadable items and malformed comparison input.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for dupekit operations.
#[derive(Error, Debug)]
pub enum DedupError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An item could not be fingerprinted
    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),

    /// A comparison was handed malformed input
    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

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

/// Failures that exclude a single item from the fingerprinted set.
#[derive(Error, Debug)]
pub enum FingerprintError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Path exists but is not a regular file
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// File exists but its bytes could not be read
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed input handed to a comparator.
///
/// These are programmer or configuration errors, never data-quality issues,
/// and must not be turned into a "no match" verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    /// Two perceptual hashes of different widths were compared
    #[error("Hash length mismatch: {left} hex chars vs {right} hex chars")]
    HashLengthMismatch { left: usize, right: usize },

    /// A hash string is not valid hexadecimal
    #[error("Invalid hex hash: {hash:?}")]
    InvalidHex { hash: String },
}

/// Convenience type alias for dupekit results.
pub type Result<T> = std::result::Result<T, DedupError>;

/// Convenience type alias for comparator results.
pub type CompareResult<T> = std::result::Result<T, CompareError>;
