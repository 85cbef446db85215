//! Pixel-domain perceptual hashes (pHash, dHash, aHash) for images.

use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig};
use std::path::Path;

/// The three perceptual hash variants of one image, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHashes {
    pub phash: String,
    pub dhash: String,
    pub ahash: String,
}

/// Perceptual hasher with pre-configured `image_hasher` instances.
///
/// All three variants share `hash_size` so each yields `hash_size²` bits.
pub struct ImageHasher {
    phash: image_hasher::Hasher,
    dhash: image_hasher::Hasher,
    ahash: image_hasher::Hasher,
}

impl ImageHasher {
    pub fn new(hash_size: u32) -> Self {
        let phash = HasherConfig::new()
            .hash_alg(HashAlg::Mean)
            .hash_size(hash_size, hash_size)
            .preproc_dct()
            .to_hasher();
        let dhash = HasherConfig::new()
            .hash_alg(HashAlg::Gradient)
            .hash_size(hash_size, hash_size)
            .to_hasher();
        let ahash = HasherConfig::new()
            .hash_alg(HashAlg::Mean)
            .hash_size(hash_size, hash_size)
            .to_hasher();
        Self {
            phash,
            dhash,
            ahash,
        }
    }

    pub fn hash_image(&self, image: &DynamicImage) -> ImageHashes {
        ImageHashes {
            phash: hex::encode(self.phash.hash_image(image).as_bytes()),
            dhash: hex::encode(self.dhash.hash_image(image).as_bytes()),
            ahash: hex::encode(self.ahash.hash_image(image).as_bytes()),
        }
    }

    /// Decode an image file and hash it. The error is a human-readable reason.
    pub fn hash_path(&self, path: &Path) -> Result<ImageHashes, String> {
        let image = image::ImageReader::open(path)
            .map_err(|e| format!("cannot open image: {e}"))?
            .with_guessed_format()
            .map_err(|e| format!("cannot detect image format: {e}"))?
            .decode()
            .map_err(|e| format!("cannot decode image: {e}"))?;
        Ok(self.hash_image(&image))
    }

    /// Decode an in-memory image and hash it.
    pub fn hash_bytes(&self, data: &[u8]) -> Result<ImageHashes, String> {
        let image =
            image::load_from_memory(data).map_err(|e| format!("cannot decode image: {e}"))?;
        Ok(self.hash_image(&image))
    }
}
