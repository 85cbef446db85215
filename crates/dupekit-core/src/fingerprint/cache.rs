//! Shared fingerprint cache with caller-controlled lifetime.

use dashmap::DashMap;
use std::path::{Path, PathBuf};

use crate::types::{Category, Fingerprint};

/// Fingerprints keyed by `(category, absolute path)`.
///
/// Reads are concurrent and writes are insert-if-absent, so two workers
/// racing on the same miss both compute and the first insert wins. The engine
/// never invalidates entries; callers do.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: DashMap<(Category, PathBuf), Fingerprint>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(category: Category, path: &Path) -> (Category, PathBuf) {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        (category, absolute)
    }

    /// Look up a cached fingerprint.
    pub fn get(&self, category: Category, path: &Path) -> Option<Fingerprint> {
        self.entries
            .get(&Self::key(category, path))
            .map(|entry| entry.value().clone())
    }

    /// Store `fingerprint` unless an entry exists; return the stored value.
    pub fn insert_if_absent(
        &self,
        category: Category,
        path: &Path,
        fingerprint: Fingerprint,
    ) -> Fingerprint {
        self.entries
            .entry(Self::key(category, path))
            .or_insert(fingerprint)
            .value()
            .clone()
    }

    /// Drop the entry for one `(category, path)` pair.
    pub fn invalidate(&self, category: Category, path: &Path) -> Option<Fingerprint> {
        self.entries
            .remove(&Self::key(category, path))
            .map(|(_, fp)| fp)
    }

    /// Drop every entry for `path`, whatever its category.
    pub fn invalidate_path(&self, path: &Path) -> usize {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let before = self.entries.len();
        self.entries.retain(|(_, p), _| *p != absolute);
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(id: &str, hash: &str) -> Fingerprint {
        Fingerprint {
            item_id: id.to_string(),
            category: Category::Generic,
            content_hash: hash.to_string(),
            perceptual_hash: None,
            average_hash: None,
            difference_hash: None,
            audio: None,
            file_size: 1,
            source_path: PathBuf::from(id),
            degradations: vec![],
        }
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = FingerprintCache::new();
        let path = Path::new("/music/a.mp3");
        let stored = cache.insert_if_absent(Category::Audio, path, fp("a", "first"));
        assert_eq!(stored.content_hash, "first");
        let stored = cache.insert_if_absent(Category::Audio, path, fp("a", "second"));
        assert_eq!(stored.content_hash, "first");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_category_is_part_of_key() {
        let cache = FingerprintCache::new();
        let path = Path::new("/x/file.bin");
        cache.insert_if_absent(Category::Generic, path, fp("x", "g"));
        assert!(cache.get(Category::Audio, path).is_none());
        assert!(cache.get(Category::Generic, path).is_some());
    }

    #[test]
    fn test_invalidate() {
        let cache = FingerprintCache::new();
        let path = Path::new("/x/file.bin");
        cache.insert_if_absent(Category::Generic, path, fp("x", "g"));
        cache.insert_if_absent(Category::Document, path, fp("x", "d"));
        assert!(cache.invalidate(Category::Generic, path).is_some());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate_path(path), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_relative_and_absolute_paths_share_entry() {
        let cache = FingerprintCache::new();
        let relative = Path::new("some/file.txt");
        let absolute = std::path::absolute(relative).unwrap();
        cache.insert_if_absent(Category::Generic, relative, fp("r", "h"));
        assert!(cache.get(Category::Generic, &absolute).is_some());
    }
}
