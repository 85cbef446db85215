//! Weighted metadata similarity.
//!
//! Each field scores in `[0, 1]`. Only fields present on both sides take
//! part, and their weights form the denominator, so missing fields do not
//! drag the score down.

use std::collections::HashSet;

use crate::config::MetadataWeights;
use crate::types::{FieldScore, ItemMetadata, MetadataField};

/// Partial credit for dimensions that share an aspect ratio but differ in size.
const ASPECT_MATCH_SCORE: f64 = 0.7;

/// Weighted score plus the per-field breakdown that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataScore {
    pub score: f64,
    pub fields: Vec<FieldScore>,
}

impl MetadataScore {
    /// No field was present on both sides.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// At least one field other than the filename took part.
    ///
    /// A shared name alone is not evidence of shared content.
    pub fn is_corroborated(&self) -> bool {
        self.fields.iter().any(|f| f.field != MetadataField::Filename)
    }
}

/// Scores two metadata records against each other.
#[derive(Debug, Clone)]
pub struct MetadataComparator {
    weights: MetadataWeights,
    aspect_tolerance: f64,
}

impl MetadataComparator {
    pub fn new(weights: MetadataWeights, aspect_tolerance: f64) -> Self {
        Self {
            weights,
            aspect_tolerance,
        }
    }

    pub fn compare(&self, a: &ItemMetadata, b: &ItemMetadata) -> MetadataScore {
        let mut fields = Vec::with_capacity(4);

        if let (Some(x), Some(y)) = (&a.filename, &b.filename) {
            fields.push(FieldScore {
                field: MetadataField::Filename,
                score: filename_similarity(x, y),
                weight: self.weights.filename,
            });
        }

        if let (Some(x), Some(y)) = (&a.captured_at, &b.captured_at) {
            fields.push(FieldScore {
                field: MetadataField::CaptureTime,
                score: binary(x.trim() == y.trim()),
                weight: self.weights.capture_time,
            });
        }

        if let (Some(wa), Some(ha), Some(wb), Some(hb)) = (a.width, a.height, b.width, b.height) {
            fields.push(FieldScore {
                field: MetadataField::Dimensions,
                score: self.dimension_similarity((wa, ha), (wb, hb)),
                weight: self.weights.dimensions,
            });
        }

        if let (Some(x), Some(y)) = (&a.device, &b.device) {
            fields.push(FieldScore {
                field: MetadataField::Device,
                score: binary(x.trim() == y.trim()),
                weight: self.weights.device,
            });
        }

        let total: f64 = fields.iter().map(|f| f.weight).sum();
        let score = if total > 0.0 {
            let weighted: f64 = fields.iter().map(|f| f.score * f.weight).sum();
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        MetadataScore { score, fields }
    }

    fn dimension_similarity(&self, a: (u32, u32), b: (u32, u32)) -> f64 {
        if a == b {
            return 1.0;
        }
        if a.1 == 0 || b.1 == 0 {
            return 0.0;
        }
        let ratio_a = a.0 as f64 / a.1 as f64;
        let ratio_b = b.0 as f64 / b.1 as f64;
        if (ratio_a - ratio_b).abs() <= self.aspect_tolerance {
            ASPECT_MATCH_SCORE
        } else {
            0.0
        }
    }
}

impl Default for MetadataComparator {
    fn default() -> Self {
        Self::new(MetadataWeights::default(), 0.01)
    }
}

/// Jaccard similarity over the lower-cased character sets of two names.
pub fn filename_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }

    let left: HashSet<char> = a.chars().collect();
    let right: HashSet<char> = b.chars().collect();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

fn binary(equal: bool) -> f64 {
    if equal {
        1.0
    } else {
        0.0
    }
}
