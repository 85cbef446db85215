//! Canonical selection.
//!
//! Members of a duplicate group are put in a total order: quality rank
//! (higher first), modification time (newer first), path depth (shallower
//! first), then path and id as final tie-breaks. The first member is the
//! keeper; the rest are removal candidates in the same order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use crate::config::SelectionConfig;
use crate::types::{Fingerprint, GroupMember, ItemMetadata};

/// Format → quality rank lookup. Unlisted formats rank 0.
#[derive(Debug, Clone)]
pub struct QualityRanking {
    ranks: HashMap<String, i32>,
}

impl QualityRanking {
    pub fn new<I, S>(ranks: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: AsRef<str>,
    {
        Self {
            ranks: ranks
                .into_iter()
                .map(|(format, rank)| (normalize_format(format.as_ref()), rank))
                .collect(),
        }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.quality_ranking.iter().map(|(k, v)| (k, *v)))
    }

    pub fn rank(&self, format: &str) -> i32 {
        self.ranks
            .get(&normalize_format(format))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for QualityRanking {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

fn normalize_format(format: &str) -> String {
    format.trim().trim_start_matches('.').to_lowercase()
}

/// Picks the canonical member of a group and orders the rest.
#[derive(Debug, Clone)]
pub struct CanonicalSelector {
    ranking: QualityRanking,
}

impl CanonicalSelector {
    pub fn new(ranking: QualityRanking) -> Self {
        Self { ranking }
    }

    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(QualityRanking::from_config(config))
    }

    pub fn ranking(&self) -> &QualityRanking {
        &self.ranking
    }

    /// Build a rankable member from a fingerprint and its metadata.
    ///
    /// The format comes from the metadata when given, otherwise from the
    /// path's extension.
    pub fn member(&self, fp: &Fingerprint, metadata: Option<&ItemMetadata>) -> GroupMember {
        let format = metadata
            .and_then(|m| m.format.clone())
            .or_else(|| {
                fp.source_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_string)
            })
            .map(|f| normalize_format(&f));

        GroupMember {
            id: fp.item_id.clone(),
            source_path: fp.source_path.clone(),
            quality_rank: format.as_deref().map_or(0, |f| self.ranking.rank(f)),
            format,
            modified: metadata.and_then(|m| m.modified),
            file_size: fp.file_size,
            content_hash: fp.content_hash.clone(),
        }
    }

    /// Total order; `Less` means `a` is the better keeper.
    pub fn compare(&self, a: &GroupMember, b: &GroupMember) -> Ordering {
        b.quality_rank
            .cmp(&a.quality_rank)
            .then_with(|| b.modified.cmp(&a.modified))
            .then_with(|| path_depth(&a.source_path).cmp(&path_depth(&b.source_path)))
            .then_with(|| a.source_path.cmp(&b.source_path))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn sort(&self, members: &mut [GroupMember]) {
        members.sort_by(|a, b| self.compare(a, b));
    }

    /// Returns `(canonical, removal_order)`, or `None` for an empty input.
    ///
    /// A singleton comes back as its own canonical with nothing to remove.
    pub fn select(
        &self,
        mut members: Vec<GroupMember>,
    ) -> Option<(GroupMember, Vec<GroupMember>)> {
        if members.is_empty() {
            return None;
        }
        self.sort(&mut members);
        let canonical = members.remove(0);
        Some((canonical, members))
    }
}

impl Default for CanonicalSelector {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

fn path_depth(path: &Path) -> usize {
    path.components().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn member(path: &str, rank: i32) -> GroupMember {
        GroupMember {
            id: path.to_string(),
            source_path: PathBuf::from(path),
            format: None,
            quality_rank: rank,
            modified: None,
            file_size: 10,
            content_hash: "aa".to_string(),
        }
    }

    fn fp(path: &str) -> Fingerprint {
        Fingerprint {
            item_id: path.to_string(),
            category: crate::types::Category::Audio,
            content_hash: "aa".to_string(),
            perceptual_hash: None,
            average_hash: None,
            difference_hash: None,
            audio: None,
            file_size: 10,
            source_path: PathBuf::from(path),
            degradations: vec![],
        }
    }

    #[test]
    fn test_wav_beats_m4a_and_mp3() {
        let selector = CanonicalSelector::from_config(&SelectionConfig::default());
        let members = vec![
            selector.member(&fp("/music/song.mp3"), None),
            selector.member(&fp("/music/song.m4a"), None),
            selector.member(&fp("/music/song.wav"), None),
        ];

        let (canonical, rest) = selector.select(members).unwrap();
        assert_eq!(canonical.source_path, PathBuf::from("/music/song.wav"));
        assert_eq!(canonical.quality_rank, 5);
        let order: Vec<_> = rest.iter().map(|m| m.format.as_deref().unwrap()).collect();
        assert_eq!(order, vec!["m4a", "mp3"]);
    }

    #[test]
    fn test_recency_breaks_quality_ties() {
        let selector = CanonicalSelector::default();
        let mut old = member("/a/old.wav", 5);
        old.modified = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let mut new = member("/a/new.wav", 5);
        new.modified = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let unknown = member("/a/unknown.wav", 5);

        let (canonical, rest) = selector.select(vec![old, unknown, new]).unwrap();
        assert_eq!(canonical.id, "/a/new.wav");
        assert_eq!(rest[0].id, "/a/old.wav");
        assert_eq!(rest[1].id, "/a/unknown.wav");
    }

    #[test]
    fn test_shallower_path_breaks_remaining_ties() {
        let selector = CanonicalSelector::default();
        let deep = member("/a/b/c/file.flac", 4);
        let shallow = member("/a/file.flac", 4);
        let (canonical, _) = selector.select(vec![deep, shallow]).unwrap();
        assert_eq!(canonical.id, "/a/file.flac");
    }

    #[test]
    fn test_order_is_independent_of_input_order() {
        let selector = CanonicalSelector::default();
        let a = member("/x/a.jpg", 2);
        let b = member("/x/b.jpg", 2);
        let c = member("/y/c.jpg", 2);

        let (first, _) = selector
            .select(vec![a.clone(), b.clone(), c.clone()])
            .unwrap();
        let (second, _) = selector.select(vec![c, b, a]).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.id, "/x/a.jpg");
    }

    #[test]
    fn test_singleton_and_empty() {
        let selector = CanonicalSelector::default();
        let (canonical, rest) = selector.select(vec![member("/only", 0)]).unwrap();
        assert_eq!(canonical.id, "/only");
        assert!(rest.is_empty());
        assert!(selector.select(Vec::new()).is_none());
    }

    #[test]
    fn test_metadata_format_overrides_extension() {
        let selector = CanonicalSelector::from_config(&SelectionConfig::default());
        let meta = ItemMetadata {
            format: Some("FLAC".to_string()),
            ..Default::default()
        };
        let m = selector.member(&fp("/music/track.bin"), Some(&meta));
        assert_eq!(m.format.as_deref(), Some("flac"));
        assert_eq!(m.quality_rank, 4);
    }

    #[test]
    fn test_default_selector_uses_default_table() {
        let selector = CanonicalSelector::default();
        assert_eq!(selector.ranking().rank("wav"), 5);
        assert_eq!(selector.ranking().rank("mp3"), 1);
        assert_eq!(selector.ranking().rank("png"), 4);

        let (canonical, _) = selector
            .select(vec![
                selector.member(&fp("/a/song.mp3"), None),
                selector.member(&fp("/a/song.flac"), None),
            ])
            .unwrap();
        assert_eq!(canonical.format.as_deref(), Some("flac"));
    }

    #[test]
    fn test_ranking_normalizes_keys() {
        let ranking = QualityRanking::new([(".WAV", 5), ("mp3", 1)]);
        assert_eq!(ranking.rank("wav"), 5);
        assert_eq!(ranking.rank(".Mp3"), 1);
        assert_eq!(ranking.rank("ogg"), 0);
    }
}
