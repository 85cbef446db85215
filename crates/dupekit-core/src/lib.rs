//! Dupekit Core - identity resolution and deduplication library.
//!
//! Given a collection of items (files or byte buffers), dupekit decides which
//! items are duplicates of each other and picks one canonical keeper per
//! group. It never deletes, moves or archives anything; callers act on the
//! report.
//!
//! # Architecture
//!
//! ```text
//! Items → Fingerprint (SHA-256, pHash/dHash/aHash, acoustic) → Cascade match
//!       (exact → perceptual → metadata) → Groups → Canonical selection → Report
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use dupekit_core::{Category, Config, Dedup, Item};
//!
//! fn main() -> dupekit_core::Result<()> {
//!     let dedup = Dedup::new(Config::load()?)?;
//!     let items = vec![
//!         Item::from_path("/music/a.wav", Category::Audio),
//!         Item::from_path("/backup/a.wav", Category::Audio),
//!     ];
//!     let report = dedup.run(&items)?;
//!     for group in &report.groups {
//!         println!("keep {}", group.canonical.source_path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod compare;
pub mod config;
pub mod discovery;
pub mod error;
pub mod fingerprint;
pub mod group;
pub mod matcher;
pub mod metadata;
pub mod output;
pub mod select;
pub mod types;

pub use config::Config;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use error::{CompareError, ConfigError, DedupError, FingerprintError, Result};
pub use fingerprint::{FingerprintCache, FingerprintEngine};
pub use group::DuplicateFinder;
pub use matcher::{CascadeMatcher, Strategy};
pub use metadata::MetadataExtractor;
pub use output::{OutputFormat, OutputWriter};
pub use select::{CanonicalSelector, QualityRanking};
pub use types::{
    Category, DedupReport, DedupStats, DuplicateGroup, Fingerprint, Item, ItemMetadata,
    ItemSource, MatchResult, MatchType,
};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Deduplication entry point: configuration, fingerprint engine, group
/// builder and a worker pool sized by `processing.parallel_workers`.
pub struct Dedup {
    config: Config,
    engine: FingerprintEngine,
    finder: DuplicateFinder,
    pool: ThreadPool,
}

impl Dedup {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::debug!("Initializing dupekit v{}", VERSION);

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.processing.parallel_workers)
            .thread_name(|i| format!("dupekit-worker-{i}"))
            .build()?;

        Ok(Self {
            engine: FingerprintEngine::new(config.fingerprint.clone()),
            finder: DuplicateFinder::from_config(&config),
            pool,
            config,
        })
    }

    /// Share a fingerprint cache with this instance.
    pub fn with_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        self.engine = self.engine.with_cache(cache);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &FingerprintEngine {
        &self.engine
    }

    pub fn finder(&self) -> &DuplicateFinder {
        &self.finder
    }

    /// Walk `path` and build items with extracted metadata.
    ///
    /// `category` overrides the extension-based guess for every file.
    pub fn discover(&self, path: &Path, category: Option<Category>) -> Vec<Item> {
        let discovery = FileDiscovery::new(self.config.processing.clone());
        let files = discovery.discover(path);
        self.pool.install(|| {
            files
                .into_par_iter()
                .map(|file| MetadataExtractor::enrich(file.into_item(category)))
                .collect()
        })
    }

    pub fn fingerprint(&self, item: &Item) -> Result<Fingerprint> {
        Ok(self.engine.generate(item)?)
    }

    /// Fingerprint, group and summarize `items`.
    pub fn run(&self, items: &[Item]) -> Result<DedupReport> {
        self.pool.install(|| self.finder.run(&self.engine, items))
    }

    /// Like [`run`](Self::run), calling `on_done` after each item is fingerprinted.
    pub fn run_with_progress<F>(&self, items: &[Item], on_done: F) -> Result<DedupReport>
    where
        F: Fn() + Sync + Send,
    {
        self.pool
            .install(|| self.finder.run_with_progress(&self.engine, items, on_done))
    }

    /// Group already-fingerprinted items.
    pub fn find_duplicates(
        &self,
        fingerprints: &[Fingerprint],
        metadata: &HashMap<String, ItemMetadata>,
    ) -> Result<Vec<DuplicateGroup>> {
        Ok(self
            .pool
            .install(|| self.finder.find_duplicates(fingerprints, metadata))?)
    }

    /// Everything in `candidates` that duplicates `source`, best first.
    ///
    /// The source must be readable; unreadable candidates are skipped.
    pub fn find_matches(
        &self,
        source: &Item,
        candidates: &[Item],
        limit: Option<usize>,
    ) -> Result<Vec<MatchResult>> {
        let source_fp = self.engine.generate(source)?;

        self.pool.install(|| {
            let candidate_fps: Vec<Fingerprint> = self
                .engine
                .generate_batch(candidates)
                .into_iter()
                .zip(candidates)
                .filter_map(|(result, item)| match result {
                    Ok(fp) => Some(fp),
                    Err(e) => {
                        tracing::warn!("Skipping {}: {}", item.id, e);
                        None
                    }
                })
                .collect();

            let metadata: HashMap<String, ItemMetadata> = std::iter::once(source)
                .chain(candidates)
                .map(|item| (item.id.clone(), item.metadata.clone()))
                .collect();

            Ok(self
                .finder
                .find_matches(&source_fp, &candidate_fps, &metadata, limit)?)
        })
    }
}
