//! CLI enum types: output format, strategy, category.

use clap::ValueEnum;

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON report
    Json,
    /// One record per line (groups, failures, then stats)
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl From<OutputFormat> for dupekit_core::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => Self::Json,
            OutputFormat::Jsonl => Self::JsonLines,
        }
    }
}

/// Which match channels to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Byte-identical content only
    ExactOnly,
    /// Exact, then perceptual/acoustic hashes
    Perceptual,
    /// Exact, then metadata similarity
    Fuzzy,
    /// Exact, perceptual, then metadata
    Cascade,
}

impl From<Strategy> for dupekit_core::Strategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::ExactOnly => Self::ExactOnly,
            Strategy::Perceptual => Self::Perceptual,
            Strategy::Fuzzy => Self::Fuzzy,
            Strategy::Cascade => Self::Cascade,
        }
    }
}

/// Force a category for every discovered file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Category {
    Audio,
    Image,
    Video,
    Document,
    Generic,
}

impl From<Category> for dupekit_core::Category {
    fn from(category: Category) -> Self {
        match category {
            Category::Audio => Self::Audio,
            Category::Image => Self::Image,
            Category::Video => Self::Video,
            Category::Document => Self::Document,
            Category::Generic => Self::Generic,
        }
    }
}
