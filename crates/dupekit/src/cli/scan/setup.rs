//! Config overrides from command-line flags.

use dupekit_core::Config;

use super::types::OutputFormat;
use super::ScanArgs;

/// Layer CLI flags over the loaded config and re-validate.
pub fn apply_overrides(mut config: Config, args: &ScanArgs) -> anyhow::Result<Config> {
    if let Some(strategy) = args.strategy {
        config.matching.strategy = strategy.into();
    }
    if let Some(threshold) = args.perceptual_threshold {
        config.matching.perceptual_threshold = threshold;
    }
    if let Some(threshold) = args.metadata_threshold {
        config.matching.metadata_threshold = threshold;
    }
    if let Some(workers) = args.parallel {
        config.processing.parallel_workers = workers;
    }
    if !args.extensions.is_empty() {
        config.processing.extensions = args.extensions.clone();
    }
    if args.include_hidden {
        config.processing.include_hidden = true;
    }
    if args.no_perceptual {
        config.fingerprint.perceptual = false;
    }
    if args.no_acoustic {
        config.fingerprint.acoustic = false;
    }

    config.validate()?;
    Ok(config)
}

/// The `--format` flag wins; otherwise the configured format, falling back to JSON.
pub fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> dupekit_core::OutputFormat {
    match flag {
        Some(format) => format.into(),
        None => dupekit_core::OutputFormat::parse(&config.output.format).unwrap_or_else(|| {
            tracing::warn!(
                "Unknown output format {:?} in config, using json",
                config.output.format
            );
            dupekit_core::OutputFormat::Json
        }),
    }
}
