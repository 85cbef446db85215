//! Hamming distance over hex-encoded fixed-width hashes.

use crate::error::{CompareError, CompareResult};

/// Bit width of a hex-encoded hash.
pub fn hash_width(hash: &str) -> u32 {
    (hash.len() * 4) as u32
}

/// Number of differing bits between two hex hashes of the same width.
///
/// Hashes of different hex lengths are rejected rather than padded.
pub fn hamming_distance(a: &str, b: &str) -> CompareResult<u32> {
    if a.len() != b.len() {
        return Err(CompareError::HashLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let left = decode(a)?;
    let right = decode(b)?;

    Ok(left
        .iter()
        .zip(&right)
        .map(|(x, y)| (x ^ y).count_ones())
        .sum())
}

/// `max(0, 1 - distance / width)`.
pub fn perceptual_confidence(distance: u32, width: u32) -> f64 {
    if width == 0 {
        return 0.0;
    }
    (1.0 - distance as f64 / width as f64).max(0.0)
}

fn decode(hash: &str) -> CompareResult<Vec<u8>> {
    // Odd-length hex gets a leading zero nibble.
    let result = if hash.len() % 2 == 1 {
        hex::decode(format!("0{hash}"))
    } else {
        hex::decode(hash)
    };
    result.map_err(|_| CompareError::InvalidHex {
        hash: hash.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_hashes() {
        assert_eq!(hamming_distance("ff00ff00ff00ff00", "ff00ff00ff00ff00").unwrap(), 0);
    }

    #[test]
    fn test_all_bits_differ() {
        assert_eq!(hamming_distance("0000000000000000", "ffffffffffffffff").unwrap(), 64);
    }

    #[test]
    fn test_counts_single_bits() {
        assert_eq!(hamming_distance("00", "01").unwrap(), 1);
        assert_eq!(hamming_distance("00", "81").unwrap(), 2);
        assert_eq!(hamming_distance("0f", "f0").unwrap(), 8);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(hamming_distance("ABCD", "abcd").unwrap(), 0);
    }

    #[test]
    fn test_odd_length_hashes() {
        assert_eq!(hamming_distance("f", "e").unwrap(), 1);
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let err = hamming_distance("ffff", "ffffffff").unwrap_err();
        assert_eq!(err, CompareError::HashLengthMismatch { left: 4, right: 8 });
    }

    #[test]
    fn test_invalid_hex_is_an_error() {
        let err = hamming_distance("zz", "00").unwrap_err();
        assert!(matches!(err, CompareError::InvalidHex { .. }));
    }

    #[test]
    fn test_confidence() {
        assert_eq!(perceptual_confidence(0, 64), 1.0);
        assert_eq!(perceptual_confidence(8, 64), 0.875);
        assert_eq!(perceptual_confidence(64, 64), 0.0);
        assert_eq!(perceptual_confidence(80, 64), 0.0);
        assert_eq!(perceptual_confidence(0, 0), 0.0);
    }

    #[test]
    fn test_width() {
        assert_eq!(hash_width("0123456789abcdef"), 64);
    }
}
