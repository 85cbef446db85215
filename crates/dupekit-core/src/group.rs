//! Duplicate-group builder.
//!
//! Items are visited in input order. Each unprocessed item opens a group and
//! is compared against every later unprocessed item; matches join the group
//! and are marked processed. Groups of one are dropped.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::config::Config;
use crate::error::{CompareResult, Result};
use crate::fingerprint::FingerprintEngine;
use crate::matcher::{CascadeMatcher, Strategy};
use crate::select::CanonicalSelector;
use crate::types::{
    DedupReport, DedupStats, DuplicateGroup, Fingerprint, Item, ItemFailure, ItemMetadata,
    MatchResult,
};

/// Partitions fingerprinted items into duplicate groups.
#[derive(Debug, Clone, Default)]
pub struct DuplicateFinder {
    matcher: CascadeMatcher,
    selector: CanonicalSelector,
}

impl DuplicateFinder {
    pub fn new(matcher: CascadeMatcher, selector: CanonicalSelector) -> Self {
        Self { matcher, selector }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CascadeMatcher::new(&config.matching),
            CanonicalSelector::from_config(&config.selection),
        )
    }

    pub fn matcher(&self) -> &CascadeMatcher {
        &self.matcher
    }

    pub fn selector(&self) -> &CanonicalSelector {
        &self.selector
    }

    /// Group fingerprints into duplicate sets.
    ///
    /// `metadata` is keyed by item id; items without an entry simply skip the
    /// metadata channel. The inner comparison loop runs on the current rayon
    /// pool.
    pub fn find_duplicates(
        &self,
        fingerprints: &[Fingerprint],
        metadata: &HashMap<String, ItemMetadata>,
    ) -> CompareResult<Vec<DuplicateGroup>> {
        if fingerprints.len() < 2 {
            return Ok(Vec::new());
        }

        let groups = if self.matcher.strategy() == Strategy::ExactOnly {
            self.exact_buckets(fingerprints)?
        } else {
            self.pairwise_scan(fingerprints, metadata)?
        };

        let groups: Vec<DuplicateGroup> = groups
            .into_iter()
            .filter_map(|(members, matches)| self.build_group(members, matches, metadata))
            .collect();

        tracing::debug!(
            items = fingerprints.len(),
            groups = groups.len(),
            strategy = %self.matcher.strategy(),
            "Grouping complete"
        );
        Ok(groups)
    }

    /// Every candidate that matches `source`, best first.
    pub fn find_matches(
        &self,
        source: &Fingerprint,
        candidates: &[Fingerprint],
        metadata: &HashMap<String, ItemMetadata>,
        limit: Option<usize>,
    ) -> CompareResult<Vec<MatchResult>> {
        let source_meta = metadata.get(&source.item_id);

        let results = candidates
            .par_iter()
            .filter(|c| c.item_id != source.item_id)
            .map(|c| {
                self.matcher
                    .compare(source, c, source_meta, metadata.get(&c.item_id))
            })
            .collect::<CompareResult<Vec<_>>>()?;

        let mut matches: Vec<MatchResult> = results.into_iter().filter(|r| r.is_match).collect();
        matches.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.match_type.cmp(&b.match_type))
        });
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    /// Fingerprint `items`, group them and summarize the run.
    ///
    /// Unreadable items are reported as failures and left out of grouping.
    pub fn run(&self, engine: &FingerprintEngine, items: &[Item]) -> Result<DedupReport> {
        self.run_with_progress(engine, items, || {})
    }

    /// Like [`run`](Self::run), calling `on_done` after each item is fingerprinted.
    pub fn run_with_progress<F>(
        &self,
        engine: &FingerprintEngine,
        items: &[Item],
        on_done: F,
    ) -> Result<DedupReport>
    where
        F: Fn() + Sync,
    {
        let start = Instant::now();
        let results = engine.generate_batch_with_progress(items, on_done);

        let mut fingerprints = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for (item, result) in items.iter().zip(results) {
            match result {
                Ok(fp) => fingerprints.push(fp),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", item.id, e);
                    failures.push(ItemFailure {
                        item_id: item.id.clone(),
                        path: item.source.display_path(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let metadata: HashMap<String, ItemMetadata> = items
            .iter()
            .map(|item| (item.id.clone(), item.metadata.clone()))
            .collect();

        let groups = self.find_duplicates(&fingerprints, &metadata)?;

        let stats = DedupStats {
            items: items.len(),
            fingerprinted: fingerprints.len(),
            failed: failures.len(),
            degraded: fingerprints.iter().filter(|fp| fp.is_degraded()).count(),
            groups: groups.len(),
            duplicates: groups.iter().map(|g| g.removal_candidates().len()).sum(),
            reclaimable_bytes: groups.iter().map(DuplicateGroup::reclaimable_bytes).sum(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Found {} duplicate groups ({} removable items) in {} of {} items",
            stats.groups,
            stats.duplicates,
            stats.fingerprinted,
            stats.items
        );

        Ok(DedupReport {
            groups,
            failures,
            stats,
        })
    }

    fn pairwise_scan<'a>(
        &self,
        fingerprints: &'a [Fingerprint],
        metadata: &HashMap<String, ItemMetadata>,
    ) -> CompareResult<Vec<(Vec<&'a Fingerprint>, Vec<MatchResult>)>> {
        let mut processed: HashSet<&str> = HashSet::with_capacity(fingerprints.len());
        let mut groups = Vec::new();

        for (i, anchor) in fingerprints.iter().enumerate() {
            if processed.contains(anchor.item_id.as_str()) {
                continue;
            }
            let anchor_meta = metadata.get(&anchor.item_id);

            let remaining: Vec<&Fingerprint> = fingerprints[i + 1..]
                .iter()
                .filter(|c| c.item_id != anchor.item_id)
                .filter(|c| !processed.contains(c.item_id.as_str()))
                .collect();

            let results = remaining
                .par_iter()
                .map(|c| {
                    self.matcher
                        .compare(anchor, c, anchor_meta, metadata.get(&c.item_id))
                })
                .collect::<CompareResult<Vec<_>>>()?;

            processed.insert(anchor.item_id.as_str());

            let mut members = vec![anchor];
            let mut matches = Vec::new();
            for (candidate, result) in remaining.into_iter().zip(results) {
                if result.is_match {
                    processed.insert(candidate.item_id.as_str());
                    members.push(candidate);
                    matches.push(result);
                }
            }

            if members.len() > 1 {
                groups.push((members, matches));
            }
        }

        Ok(groups)
    }

    /// Same output as the pairwise scan under `EXACT_ONLY`, without the O(n²) loop.
    fn exact_buckets<'a>(
        &self,
        fingerprints: &'a [Fingerprint],
    ) -> CompareResult<Vec<(Vec<&'a Fingerprint>, Vec<MatchResult>)>> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut buckets: Vec<Vec<&Fingerprint>> = Vec::new();

        for fp in fingerprints {
            if fp.content_hash.is_empty() || !seen.insert(fp.item_id.as_str()) {
                continue;
            }
            match index.get(fp.content_hash.as_str()) {
                Some(&slot) => buckets[slot].push(fp),
                None => {
                    index.insert(fp.content_hash.as_str(), buckets.len());
                    buckets.push(vec![fp]);
                }
            }
        }

        buckets
            .into_iter()
            .filter(|members| members.len() > 1)
            .map(|members| -> CompareResult<_> {
                let anchor = members[0];
                let matches = members[1..]
                    .iter()
                    .map(|c| self.matcher.compare(anchor, c, None, None))
                    .collect::<CompareResult<Vec<_>>>()?;
                Ok((members, matches))
            })
            .collect()
    }

    fn build_group(
        &self,
        members: Vec<&Fingerprint>,
        matches: Vec<MatchResult>,
        metadata: &HashMap<String, ItemMetadata>,
    ) -> Option<DuplicateGroup> {
        let members: Vec<_> = members
            .into_iter()
            .map(|fp| self.selector.member(fp, metadata.get(&fp.item_id)))
            .collect();

        let (canonical, rest) = self.selector.select(members)?;
        if rest.is_empty() {
            return None;
        }

        let mut ordered = Vec::with_capacity(rest.len() + 1);
        ordered.push(canonical.clone());
        ordered.extend(rest);

        tracing::debug!(
            canonical = %canonical.source_path.display(),
            size = ordered.len(),
            "Duplicate group"
        );

        Some(DuplicateGroup {
            canonical,
            members: ordered,
            matches,
        })
    }
}
