//! Pairwise similarity primitives.
//!
//! Comparators are pure functions of their inputs. Malformed input is an
//! error, never a "no match".

pub mod hamming;
pub mod metadata;

pub use hamming::{hamming_distance, hash_width, perceptual_confidence};
pub use metadata::{MetadataComparator, MetadataScore};

use crate::types::Fingerprint;

/// Byte-identical content. Category-blind.
pub fn exact(a: &Fingerprint, b: &Fingerprint) -> bool {
    !a.content_hash.is_empty() && a.content_hash == b.content_hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::path::PathBuf;

    fn fp(id: &str, hash: &str, category: Category) -> Fingerprint {
        Fingerprint {
            item_id: id.to_string(),
            category,
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
    fn test_exact_ignores_category() {
        let a = fp("a", "ab12", Category::Image);
        let b = fp("b", "ab12", Category::Generic);
        assert!(exact(&a, &b));
    }

    #[test]
    fn test_exact_differs() {
        let a = fp("a", "ab12", Category::Image);
        let b = fp("b", "ab13", Category::Image);
        assert!(!exact(&a, &b));
    }

    #[test]
    fn test_exact_empty_hash_never_matches() {
        let a = fp("a", "", Category::Generic);
        let b = fp("b", "", Category::Generic);
        assert!(!exact(&a, &b));
    }
}
