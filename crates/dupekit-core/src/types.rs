//! Core data types for the deduplication engine.
//!
//! Items go in, fingerprints are attached, match results justify grouping,
//! and duplicate groups come out. Fingerprints, match results and groups are
//! never mutated once built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

const AUDIO_EXTENSIONS: &[&str] = &[
    "wav", "wave", "aiff", "aif", "flac", "alac", "m4a", "mp3", "ogg", "opus", "aac", "wma",
];
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "heic", "heif", "avif", "raw",
    "cr2", "nef", "arw", "dng",
];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mkv", "webm", "wmv", "mts"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "md", "rtf", "odt", "xls", "xlsx", "ppt", "pptx", "csv",
];

/// Declared content category of an item.
///
/// The category is supplied by the caller. [`Category::infer`] is an optional
/// helper for callers that only have a file name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Audio,
    Image,
    Video,
    Document,
    #[default]
    Generic,
}

impl Category {
    /// Parse an open category string. Unrecognized values map to `Generic`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "audio" => Self::Audio,
            "image" => Self::Image,
            "video" => Self::Video,
            "document" => Self::Document,
            _ => Self::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Generic => "generic",
        }
    }

    /// Guess a category from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_lowercase();
        let ext = ext.as_str();
        if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            Self::Document
        } else {
            Self::Generic
        }
    }

    /// Guess a category from a path's extension.
    pub fn infer(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }

    /// Whether pixel-domain perceptual hashes are computed for this category.
    pub fn supports_perceptual(&self) -> bool {
        matches!(self, Self::Image)
    }

    /// Whether a spectral acoustic signature is computed for this category.
    pub fn supports_acoustic(&self) -> bool {
        matches!(self, Self::Audio)
    }

    /// Media categories use the stricter metadata threshold.
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Audio | Self::Image | Self::Video)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Where an item's bytes come from.
#[derive(Debug, Clone)]
pub enum ItemSource {
    /// A file on disk
    Path(PathBuf),
    /// An in-memory buffer; `name` stands in for the source path
    Bytes { name: String, data: Arc<[u8]> },
}

impl ItemSource {
    /// Path reported on the fingerprint.
    pub fn display_path(&self) -> PathBuf {
        match self {
            Self::Path(p) => p.clone(),
            Self::Bytes { name, .. } => PathBuf::from(name),
        }
    }
}

/// Caller-supplied metadata used by the fuzzy channel and canonical selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Lower-case format name, usually the file extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Last modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,

    /// Capture timestamp as recorded by the device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Camera or device identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// A unit of content submitted for deduplication.
#[derive(Debug, Clone)]
pub struct Item {
    /// Identity used by the grouping pass
    pub id: String,
    pub source: ItemSource,
    pub category: Category,
    pub metadata: ItemMetadata,
}

impl Item {
    /// An item backed by a file. The id defaults to the path string.
    pub fn from_path(path: impl Into<PathBuf>, category: Category) -> Self {
        let path = path.into();
        Self {
            id: path.to_string_lossy().into_owned(),
            source: ItemSource::Path(path),
            category,
            metadata: ItemMetadata::default(),
        }
    }

    /// An item backed by an in-memory buffer. The id defaults to `name`.
    pub fn from_bytes(
        name: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
        category: Category,
    ) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            source: ItemSource::Bytes {
                name,
                data: data.into(),
            },
            category,
            metadata: ItemMetadata::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Which optional fingerprint channel was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Perceptual,
    Acoustic,
}

/// Record of an optional channel that could not be computed for an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    pub channel: Channel,
    pub reason: String,
}

/// Spectral signature of an audio item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSignature {
    /// Hex-encoded contour hash of the time-binned mel spectrogram
    pub hash: String,

    /// Decoded duration; a mismatch vetoes an acoustic match
    pub duration_secs: f64,

    pub sample_rate: u32,
}

/// Perceptual hash variants, in the order the matcher consults them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerceptualVariant {
    /// Frequency-domain (DCT) hash
    PHash,
    /// Difference (gradient) hash
    DHash,
    /// Average (mean) hash
    AHash,
}

impl PerceptualVariant {
    pub const ORDER: [PerceptualVariant; 3] = [Self::PHash, Self::DHash, Self::AHash];
}

/// Fingerprints computed for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub item_id: String,

    pub category: Category,

    /// SHA-256 of the full byte content, lower-case hex
    pub content_hash: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceptual_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioSignature>,

    pub file_size: u64,

    pub source_path: PathBuf,

    /// Optional channels that were skipped for this item
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<Degradation>,
}

impl Fingerprint {
    /// The stored hash for a perceptual variant, if computed.
    pub fn variant(&self, variant: PerceptualVariant) -> Option<&str> {
        match variant {
            PerceptualVariant::PHash => self.perceptual_hash.as_deref(),
            PerceptualVariant::DHash => self.difference_hash.as_deref(),
            PerceptualVariant::AHash => self.average_hash.as_deref(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Channel that confirmed a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Perceptual,
    Metadata,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Perceptual => f.write_str("perceptual"),
            Self::Metadata => f.write_str("metadata"),
        }
    }
}

/// Metadata fields scored by the fuzzy channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Filename,
    CaptureTime,
    Dimensions,
    Device,
}

/// One field's contribution to a metadata score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldScore {
    pub field: MetadataField,
    pub score: f64,
    pub weight: f64,
}

/// Channel-specific evidence attached to a match result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum MatchDetail {
    /// No channel produced evidence
    None,
    Exact,
    Perceptual {
        variant: PerceptualVariant,
        distance: u32,
        width: u32,
    },
    Acoustic {
        distance: u32,
        width: u32,
        duration_delta: f64,
    },
    Metadata {
        score: f64,
        fields: Vec<FieldScore>,
    },
}

/// Outcome of comparing two fingerprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub source_id: String,
    pub target_id: String,
    pub is_match: bool,

    /// Set only when `is_match` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,

    /// In `[0, 1]`
    pub confidence: f64,

    pub detail: MatchDetail,
}

impl MatchResult {
    pub(crate) fn matched(
        source: &Fingerprint,
        target: &Fingerprint,
        match_type: MatchType,
        confidence: f64,
        detail: MatchDetail,
    ) -> Self {
        Self {
            source_id: source.item_id.clone(),
            target_id: target.item_id.clone(),
            is_match: true,
            match_type: Some(match_type),
            confidence: confidence.clamp(0.0, 1.0),
            detail,
        }
    }

    pub(crate) fn no_match(
        source: &Fingerprint,
        target: &Fingerprint,
        detail: MatchDetail,
    ) -> Self {
        Self {
            source_id: source.item_id.clone(),
            target_id: target.item_id.clone(),
            is_match: false,
            match_type: None,
            confidence: 0.0,
            detail,
        }
    }
}

/// A member of a duplicate group with the attributes used to rank it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: String,
    pub source_path: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    pub quality_rank: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,

    pub file_size: u64,
    pub content_hash: String,
}

/// Two or more items judged to be the same content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The keeper
    pub canonical: GroupMember,

    /// All members in canonical order; `members[0]` is the canonical
    pub members: Vec<GroupMember>,

    /// Results that linked each member into the group
    pub matches: Vec<MatchResult>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Non-canonical members, lowest priority last.
    pub fn removal_candidates(&self) -> &[GroupMember] {
        self.members.get(1..).unwrap_or(&[])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// Strongest channel that justified any member.
    pub fn match_type(&self) -> Option<MatchType> {
        self.matches.iter().filter_map(|m| m.match_type).min()
    }

    /// Sum of bytes held by removal candidates.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.removal_candidates().iter().map(|m| m.file_size).sum()
    }
}

/// An item that could not be fingerprinted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item_id: String,
    pub path: PathBuf,
    pub message: String,
}

/// Counters for a deduplication run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupStats {
    pub items: usize,
    pub fingerprinted: usize,
    pub failed: usize,
    pub degraded: usize,
    pub groups: usize,
    pub duplicates: usize,
    pub reclaimable_bytes: u64,
    pub elapsed_ms: u64,
}

/// Full output of a deduplication run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupReport {
    pub groups: Vec<DuplicateGroup>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ItemFailure>,

    pub stats: DedupStats,
}
