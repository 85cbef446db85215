//! Cascade matcher.
//!
//! A pair of fingerprints walks `Exact → Perceptual → Metadata`. The first
//! stage that confirms a match ends the walk; stages the strategy excludes
//! are skipped. Matching is stateless per call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::compare::{self, hamming_distance, perceptual_confidence, MetadataComparator};
use crate::config::MatchingConfig;
use crate::error::CompareResult;
use crate::types::{
    Category, Fingerprint, ItemMetadata, MatchDetail, MatchResult, MatchType, PerceptualVariant,
};

/// Which channels the cascade runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// Content hash only
    ExactOnly,
    /// Exact, then perceptual/acoustic
    Perceptual,
    /// Exact, then metadata; perceptual is skipped
    Fuzzy,
    /// All three channels
    #[default]
    Cascade,
}

impl Strategy {
    pub fn runs_perceptual(&self) -> bool {
        matches!(self, Self::Perceptual | Self::Cascade)
    }

    pub fn runs_metadata(&self) -> bool {
        matches!(self, Self::Fuzzy | Self::Cascade)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactOnly => "EXACT_ONLY",
            Self::Perceptual => "PERCEPTUAL",
            Self::Fuzzy => "FUZZY",
            Self::Cascade => "CASCADE",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "EXACT_ONLY" | "EXACT" => Ok(Self::ExactOnly),
            "PERCEPTUAL" => Ok(Self::Perceptual),
            "FUZZY" => Ok(Self::Fuzzy),
            "CASCADE" => Ok(Self::Cascade),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Exact,
    Perceptual,
    Metadata,
}

impl Stage {
    fn next(self, strategy: Strategy) -> Option<Stage> {
        match self {
            Stage::Exact if strategy.runs_perceptual() => Some(Stage::Perceptual),
            Stage::Exact | Stage::Perceptual if strategy.runs_metadata() => Some(Stage::Metadata),
            _ => None,
        }
    }
}

/// Outcome of a single stage.
enum Verdict {
    Match(MatchType, f64, MatchDetail),
    /// The stage ran and rejected the pair; the detail is kept as evidence
    Reject(MatchDetail),
    /// The pair is ruled out; later stages do not run
    Veto(MatchDetail),
    /// The stage had nothing to compare
    Skip,
}

/// Decides whether two fingerprints are duplicates.
#[derive(Debug, Clone)]
pub struct CascadeMatcher {
    strategy: Strategy,
    perceptual_threshold: u32,
    metadata_threshold: f64,
    generic_metadata_threshold: f64,
    duration_tolerance_secs: f64,
    metadata: MetadataComparator,
}

impl CascadeMatcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            strategy: config.strategy,
            perceptual_threshold: config.perceptual_threshold,
            metadata_threshold: config.metadata_threshold,
            generic_metadata_threshold: config.generic_metadata_threshold,
            duration_tolerance_secs: config.duration_tolerance_secs,
            metadata: MetadataComparator::new(
                config.weights.clone(),
                config.aspect_ratio_tolerance,
            ),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Metadata threshold that applies to a category.
    pub fn metadata_threshold_for(&self, category: Category) -> f64 {
        if category.is_media() {
            self.metadata_threshold
        } else {
            self.generic_metadata_threshold
        }
    }

    /// Compare two fingerprints.
    ///
    /// Errors only on malformed hashes; an error is never turned into a
    /// non-match.
    pub fn compare(
        &self,
        a: &Fingerprint,
        b: &Fingerprint,
        meta_a: Option<&ItemMetadata>,
        meta_b: Option<&ItemMetadata>,
    ) -> CompareResult<MatchResult> {
        let mut evidence = MatchDetail::None;
        let mut stage = Some(Stage::Exact);

        while let Some(current) = stage {
            let verdict = match current {
                Stage::Exact => self.exact_stage(a, b),
                Stage::Perceptual => self.perceptual_stage(a, b)?,
                Stage::Metadata => self.metadata_stage(a, b, meta_a, meta_b),
            };

            match verdict {
                Verdict::Match(match_type, confidence, detail) => {
                    return Ok(MatchResult::matched(a, b, match_type, confidence, detail));
                }
                Verdict::Reject(detail) => evidence = detail,
                Verdict::Veto(detail) => return Ok(MatchResult::no_match(a, b, detail)),
                Verdict::Skip => {}
            }

            stage = current.next(self.strategy);
        }

        Ok(MatchResult::no_match(a, b, evidence))
    }

    fn exact_stage(&self, a: &Fingerprint, b: &Fingerprint) -> Verdict {
        if compare::exact(a, b) {
            Verdict::Match(MatchType::Exact, 1.0, MatchDetail::Exact)
        } else {
            Verdict::Skip
        }
    }

    fn perceptual_stage(&self, a: &Fingerprint, b: &Fingerprint) -> CompareResult<Verdict> {
        if a.category != b.category {
            return Ok(Verdict::Skip);
        }

        if let (Some(left), Some(right)) = (&a.audio, &b.audio) {
            let distance = hamming_distance(&left.hash, &right.hash)?;
            let width = compare::hash_width(&left.hash);
            let duration_delta = (left.duration_secs - right.duration_secs).abs();
            let detail = MatchDetail::Acoustic {
                distance,
                width,
                duration_delta,
            };
            return Ok(if duration_delta > self.duration_tolerance_secs {
                Verdict::Veto(detail)
            } else if distance <= self.perceptual_threshold {
                Verdict::Match(
                    MatchType::Perceptual,
                    perceptual_confidence(distance, width),
                    detail,
                )
            } else {
                Verdict::Reject(detail)
            });
        }

        for variant in PerceptualVariant::ORDER {
            let (Some(left), Some(right)) = (a.variant(variant), b.variant(variant)) else {
                continue;
            };
            let distance = hamming_distance(left, right)?;
            let width = compare::hash_width(left);
            let detail = MatchDetail::Perceptual {
                variant,
                distance,
                width,
            };
            return Ok(if distance <= self.perceptual_threshold {
                Verdict::Match(
                    MatchType::Perceptual,
                    perceptual_confidence(distance, width),
                    detail,
                )
            } else {
                Verdict::Reject(detail)
            });
        }

        Ok(Verdict::Skip)
    }

    fn metadata_stage(
        &self,
        a: &Fingerprint,
        b: &Fingerprint,
        meta_a: Option<&ItemMetadata>,
        meta_b: Option<&ItemMetadata>,
    ) -> Verdict {
        if a.category != b.category {
            return Verdict::Skip;
        }
        let (Some(meta_a), Some(meta_b)) = (meta_a, meta_b) else {
            return Verdict::Skip;
        };

        let result = self.metadata.compare(meta_a, meta_b);
        if result.is_empty() {
            return Verdict::Skip;
        }

        let threshold = self.metadata_threshold_for(a.category);
        let corroborated = result.is_corroborated();
        let score = result.score;
        let detail = MatchDetail::Metadata {
            score,
            fields: result.fields,
        };
        if corroborated && score >= threshold {
            Verdict::Match(MatchType::Metadata, score, detail)
        } else {
            Verdict::Reject(detail)
        }
    }
}

impl Default for CascadeMatcher {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}
