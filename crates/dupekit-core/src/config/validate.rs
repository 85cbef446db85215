//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Largest accepted `hash_size` (a 4096-bit hash).
const MAX_HASH_SIZE: u32 = 64;

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fp = &self.fingerprint;
        if fp.buffer_size == 0 {
            return Err(invalid("fingerprint.buffer_size must be > 0"));
        }
        if !(2..=MAX_HASH_SIZE).contains(&fp.hash_size) {
            return Err(ConfigError::ValidationError(format!(
                "fingerprint.hash_size must be between 2 and {MAX_HASH_SIZE}"
            )));
        }
        if (fp.hash_size * fp.hash_size) % 8 != 0 {
            return Err(invalid(
                "fingerprint.hash_size squared must be a multiple of 8 (e.g. 4, 8, 16)",
            ));
        }
        if fp.audio_time_bins < fp.hash_size as usize {
            return Err(invalid(
                "fingerprint.audio_time_bins must be >= fingerprint.hash_size",
            ));
        }
        if fp.audio_frame_size < 64 {
            return Err(invalid("fingerprint.audio_frame_size must be >= 64"));
        }

        let m = &self.matching;
        let width = fp.hash_size * fp.hash_size;
        if m.perceptual_threshold > width {
            return Err(ConfigError::ValidationError(format!(
                "matching.perceptual_threshold must be <= hash width ({width})"
            )));
        }
        for (name, value) in [
            ("matching.metadata_threshold", m.metadata_threshold),
            (
                "matching.generic_metadata_threshold",
                m.generic_metadata_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 1.0"
                )));
            }
        }
        if m.duration_tolerance_secs < 0.0 {
            return Err(invalid("matching.duration_tolerance_secs must be >= 0"));
        }
        if m.aspect_ratio_tolerance < 0.0 {
            return Err(invalid("matching.aspect_ratio_tolerance must be >= 0"));
        }
        let w = &m.weights;
        if [w.filename, w.capture_time, w.dimensions, w.device]
            .iter()
            .any(|v| *v < 0.0 || !v.is_finite())
        {
            return Err(invalid("matching.weights must be finite and non-negative"));
        }
        if w.total() <= 0.0 {
            return Err(invalid("matching.weights must sum to a positive value"));
        }

        if self.processing.parallel_workers == 0 {
            return Err(invalid("processing.parallel_workers must be > 0"));
        }
        Ok(())
    }
}
