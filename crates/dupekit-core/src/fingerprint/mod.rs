//! Fingerprint engine.
//!
//! Every item gets a SHA-256 content hash. Images additionally get pHash,
//! dHash and aHash; audio gets a spectral signature. When an optional channel
//! cannot be computed the fingerprint is still returned with that channel
//! absent and a [`Degradation`] recorded; only unreadable items fail.

pub mod audio;
pub mod cache;
pub mod content;
pub mod perceptual;

pub use audio::AcousticAnalyzer;
pub use cache::FingerprintCache;
pub use perceptual::ImageHasher;

use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;

use crate::config::FingerprintConfig;
use crate::error::FingerprintError;
use crate::types::{AudioSignature, Channel, Degradation, Fingerprint, Item, ItemSource};

/// Computes fingerprints for items according to their category.
pub struct FingerprintEngine {
    config: FingerprintConfig,
    image_hasher: ImageHasher,
    acoustic: AcousticAnalyzer,
    cache: Option<Arc<FingerprintCache>>,
}

impl FingerprintEngine {
    pub fn new(config: FingerprintConfig) -> Self {
        Self {
            image_hasher: ImageHasher::new(config.hash_size),
            acoustic: AcousticAnalyzer::new(&config),
            config,
            cache: None,
        }
    }

    /// Attach a read-through cache. Byte-buffer items bypass it.
    pub fn with_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<FingerprintCache>> {
        self.cache.as_ref()
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Fingerprint one item.
    ///
    /// Fails only when the item's bytes cannot be read. Perceptual and
    /// acoustic failures degrade to a content-hash-only fingerprint.
    pub fn generate(&self, item: &Item) -> Result<Fingerprint, FingerprintError> {
        match &item.source {
            ItemSource::Path(path) => self.generate_from_path(item, path),
            ItemSource::Bytes { name, data } => Ok(self.generate_from_bytes(item, name, data)),
        }
    }

    /// Fingerprint many items in parallel on the current rayon pool.
    ///
    /// Results line up with `items`.
    pub fn generate_batch(&self, items: &[Item]) -> Vec<Result<Fingerprint, FingerprintError>> {
        self.generate_batch_with_progress(items, || {})
    }

    /// Like [`generate_batch`](Self::generate_batch), calling `on_done` after each item.
    pub fn generate_batch_with_progress<F>(
        &self,
        items: &[Item],
        on_done: F,
    ) -> Vec<Result<Fingerprint, FingerprintError>>
    where
        F: Fn() + Sync,
    {
        items
            .par_iter()
            .map(|item| {
                let result = self.generate(item);
                on_done();
                result
            })
            .collect()
    }

    fn generate_from_path(
        &self,
        item: &Item,
        path: &Path,
    ) -> Result<Fingerprint, FingerprintError> {
        let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FingerprintError::FileNotFound(path.to_path_buf()),
            _ => FingerprintError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        if !meta.is_file() {
            return Err(FingerprintError::NotAFile(path.to_path_buf()));
        }

        if let Some(cached) = self
            .cache
            .as_ref()
            .and_then(|c| c.get(item.category, path))
        {
            tracing::trace!("Cache hit: {:?}", path);
            return Ok(Fingerprint {
                item_id: item.id.clone(),
                ..cached
            });
        }

        let start = std::time::Instant::now();
        let (content_hash, file_size) = content::hash_file(path, self.config.buffer_size)
            .map_err(|e| FingerprintError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut fingerprint = Fingerprint {
            item_id: item.id.clone(),
            category: item.category,
            content_hash,
            perceptual_hash: None,
            average_hash: None,
            difference_hash: None,
            audio: None,
            file_size,
            source_path: path.to_path_buf(),
            degradations: Vec::new(),
        };

        if item.category.supports_perceptual() && self.config.perceptual {
            let hashes = self.image_hasher.hash_path(path);
            self.apply_image(&mut fingerprint, hashes);
        }
        if item.category.supports_acoustic() && self.config.acoustic {
            let signature = self.acoustic.analyze_file(path);
            self.apply_audio(&mut fingerprint, signature);
        }

        tracing::debug!(
            "Fingerprinted {:?} ({}, {} bytes) in {:?}",
            path,
            item.category,
            file_size,
            start.elapsed()
        );

        Ok(match &self.cache {
            Some(cache) => Fingerprint {
                item_id: item.id.clone(),
                ..cache.insert_if_absent(item.category, path, fingerprint)
            },
            None => fingerprint,
        })
    }

    fn generate_from_bytes(&self, item: &Item, name: &str, data: &Arc<[u8]>) -> Fingerprint {
        let mut fingerprint = Fingerprint {
            item_id: item.id.clone(),
            category: item.category,
            content_hash: content::hash_bytes(data),
            perceptual_hash: None,
            average_hash: None,
            difference_hash: None,
            audio: None,
            file_size: data.len() as u64,
            source_path: item.source.display_path(),
            degradations: Vec::new(),
        };

        if item.category.supports_perceptual() && self.config.perceptual {
            let hashes = self.image_hasher.hash_bytes(data);
            self.apply_image(&mut fingerprint, hashes);
        }
        if item.category.supports_acoustic() && self.config.acoustic {
            let ext = Path::new(name).extension().and_then(|e| e.to_str());
            let signature = self.acoustic.analyze_bytes(Arc::clone(data), ext);
            self.apply_audio(&mut fingerprint, signature);
        }
        fingerprint
    }

    fn apply_image(
        &self,
        fingerprint: &mut Fingerprint,
        hashes: Result<perceptual::ImageHashes, String>,
    ) {
        match hashes {
            Ok(h) => {
                fingerprint.perceptual_hash = Some(h.phash);
                fingerprint.difference_hash = Some(h.dhash);
                fingerprint.average_hash = Some(h.ahash);
            }
            Err(reason) => {
                tracing::warn!(
                    "Perceptual hash unavailable for {:?}: {}",
                    fingerprint.source_path,
                    reason
                );
                fingerprint.degradations.push(Degradation {
                    channel: Channel::Perceptual,
                    reason,
                });
            }
        }
    }

    fn apply_audio(
        &self,
        fingerprint: &mut Fingerprint,
        signature: Result<AudioSignature, String>,
    ) {
        match signature {
            Ok(sig) => fingerprint.audio = Some(sig),
            Err(reason) => {
                tracing::warn!(
                    "Acoustic signature unavailable for {:?}: {}",
                    fingerprint.source_path,
                    reason
                );
                fingerprint.degradations.push(Degradation {
                    channel: Channel::Acoustic,
                    reason,
                });
            }
        }
    }
}

impl Default for FingerprintEngine {
    fn default() -> Self {
        Self::new(FingerprintConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generic_item_has_only_content_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let engine = FingerprintEngine::default();
        let fp = engine
            .generate(&Item::from_path(&path, Category::Document))
            .unwrap();
        assert_eq!(fp.content_hash.len(), content::CONTENT_HASH_HEX_LEN);
        assert_eq!(fp.file_size, 5);
        assert!(fp.perceptual_hash.is_none());
        assert!(fp.audio.is_none());
        assert!(!fp.is_degraded());
    }

    #[test]
    fn test_undecodable_image_degrades_instead_of_failing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"not really a jpeg").unwrap();

        let engine = FingerprintEngine::default();
        let fp = engine
            .generate(&Item::from_path(&path, Category::Image))
            .unwrap();
        assert!(fp.perceptual_hash.is_none());
        assert!(fp.average_hash.is_none());
        assert!(fp.difference_hash.is_none());
        assert_eq!(fp.degradations.len(), 1);
        assert_eq!(fp.degradations[0].channel, Channel::Perceptual);
    }

    #[test]
    fn test_undecodable_audio_degrades_instead_of_failing() {
        let engine = FingerprintEngine::default();
        let item = Item::from_bytes("track.mp3", b"garbage bytes".to_vec(), Category::Audio);
        let fp = engine.generate(&item).unwrap();
        assert!(fp.audio.is_none());
        assert_eq!(fp.degradations[0].channel, Channel::Acoustic);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let engine = FingerprintEngine::default();
        let err = engine
            .generate(&Item::from_path("/nonexistent/a.wav", Category::Audio))
            .unwrap_err();
        assert!(matches!(err, FingerprintError::FileNotFound(_)));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let engine = FingerprintEngine::default();
        let err = engine
            .generate(&Item::from_path(dir.path(), Category::Generic))
            .unwrap_err();
        assert!(matches!(err, FingerprintError::NotAFile(_)));
    }

    #[test]
    fn test_bytes_and_file_agree_on_content_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        fs::write(&path, b"same bytes").unwrap();

        let engine = FingerprintEngine::default();
        let from_file = engine
            .generate(&Item::from_path(&path, Category::Generic))
            .unwrap();
        let from_bytes = engine
            .generate(&Item::from_bytes("blob.bin", b"same bytes".to_vec(), Category::Generic))
            .unwrap();
        assert_eq!(from_file.content_hash, from_bytes.content_hash);
        assert_eq!(from_bytes.source_path, Path::new("blob.bin"));
    }

    #[test]
    fn test_cache_serves_repeat_requests_with_caller_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"v1").unwrap();

        let cache = Arc::new(FingerprintCache::new());
        let engine = FingerprintEngine::default().with_cache(Arc::clone(&cache));
        let first = engine
            .generate(&Item::from_path(&path, Category::Generic))
            .unwrap();
        assert_eq!(cache.len(), 1);

        // The engine does not track mtimes: stale until the caller invalidates.
        fs::write(&path, b"v2").unwrap();
        let second = engine
            .generate(&Item::from_path(&path, Category::Generic).with_id("other"))
            .unwrap();
        assert_eq!(second.content_hash, first.content_hash);
        assert_eq!(second.item_id, "other");

        cache.invalidate(Category::Generic, &path);
        let third = engine
            .generate(&Item::from_path(&path, Category::Generic))
            .unwrap();
        assert_ne!(third.content_hash, first.content_hash);
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let c = dir.path().join("c.txt");
        fs::write(&a, b"a").unwrap();
        fs::write(&c, b"c").unwrap();

        let items = vec![
            Item::from_path(&a, Category::Generic),
            Item::from_path(dir.path().join("missing.txt"), Category::Generic),
            Item::from_path(&c, Category::Generic),
        ];
        let engine = FingerprintEngine::default();
        let results = engine.generate_batch(&items);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().item_id, items[0].id);
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().item_id, items[2].id);
    }

    #[test]
    fn test_disabled_perceptual_skips_without_degrading() {
        let engine = FingerprintEngine::new(FingerprintConfig {
            perceptual: false,
            ..Default::default()
        });
        let item = Item::from_bytes("x.png", b"not png".to_vec(), Category::Image);
        let fp = engine.generate(&item).unwrap();
        assert!(fp.perceptual_hash.is_none());
        assert!(!fp.is_degraded());
    }
}
