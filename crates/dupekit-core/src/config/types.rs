//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::matcher::Strategy;

/// Fingerprint engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Chunk size for streaming content hashes, in bytes
    pub buffer_size: usize,

    /// Perceptual hash side length; the hash is `hash_size²` bits wide
    pub hash_size: u32,

    /// Compute image perceptual hashes
    pub perceptual: bool,

    /// Compute audio spectral signatures
    pub acoustic: bool,

    /// Number of time bins the mel spectrogram is averaged over
    pub audio_time_bins: usize,

    /// Analysis frame length in samples
    pub audio_frame_size: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            buffer_size: 65536,
            hash_size: 8,
            perceptual: true,
            acoustic: true,
            audio_time_bins: 32,
            audio_frame_size: 1024,
        }
    }
}

/// Per-field weights for the metadata channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataWeights {
    pub filename: f64,
    pub capture_time: f64,
    pub dimensions: f64,
    pub device: f64,
}

impl Default for MetadataWeights {
    fn default() -> Self {
        Self {
            filename: 0.30,
            capture_time: 0.25,
            dimensions: 0.25,
            device: 0.20,
        }
    }
}

impl MetadataWeights {
    pub fn total(&self) -> f64 {
        self.filename + self.capture_time + self.dimensions + self.device
    }
}

/// Cascade matcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Which channels run: EXACT_ONLY, PERCEPTUAL, FUZZY or CASCADE
    pub strategy: Strategy,

    /// Maximum Hamming distance for a perceptual match (inclusive)
    pub perceptual_threshold: u32,

    /// Minimum metadata score for audio, image and video items
    pub metadata_threshold: f64,

    /// Minimum metadata score for document and generic items
    pub generic_metadata_threshold: f64,

    /// Largest duration difference allowed for an acoustic match, in seconds
    pub duration_tolerance_secs: f64,

    /// Aspect ratio tolerance for partial dimension credit
    pub aspect_ratio_tolerance: f64,

    /// Metadata field weights
    pub weights: MetadataWeights,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Cascade,
            perceptual_threshold: 8,
            metadata_threshold: 0.85,
            generic_metadata_threshold: 0.80,
            duration_tolerance_secs: 2.0,
            aspect_ratio_tolerance: 0.01,
            weights: MetadataWeights::default(),
        }
    }
}

/// Canonical selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Format → quality rank. Higher wins; unlisted formats rank 0.
    pub quality_ranking: BTreeMap<String, i32>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        let ranking = [
            // audio
            ("wav", 5),
            ("aiff", 4),
            ("aif", 4),
            ("flac", 4),
            ("alac", 3),
            ("m4a", 2),
            ("mp3", 1),
            // images
            ("tiff", 5),
            ("tif", 5),
            ("png", 4),
            ("heic", 3),
            ("webp", 2),
            ("jpg", 2),
            ("jpeg", 2),
            ("gif", 1),
        ];
        Self {
            quality_ranking: ranking
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers for fingerprinting and scanning
    pub parallel_workers: usize,

    /// Extensions to include during discovery; empty means every file
    pub extensions: Vec<String>,

    /// Follow symbolic links while walking directories
    pub follow_links: bool,

    /// Include dot-files and dot-directories
    pub include_hidden: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            extensions: Vec::new(),
            follow_links: false,
            include_hidden: false,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
