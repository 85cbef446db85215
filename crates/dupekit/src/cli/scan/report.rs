//! Report writing, progress bar and summary table.

use dupekit_core::{DedupReport, DedupStats, OutputFormat, OutputWriter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write a report to `output`, or stdout when absent.
pub fn write_report(
    report: &DedupReport,
    output: Option<&Path>,
    format: OutputFormat,
    pretty: bool,
) -> anyhow::Result<()> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = OutputWriter::new(sink, format, pretty);
    writer.write_report(report)?;
    writer.flush()?;
    Ok(())
}

/// Create a progress bar for fingerprinting.
pub fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(concat!(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] ",
            "{pos}/{len} ({percent}%) {per_sec}",
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb
}

/// Print a formatted summary table after a scan.
pub fn print_summary(stats: &DedupStats) {
    let elapsed = stats.elapsed_ms as f64 / 1000.0;
    let rate = if elapsed > 0.0 {
        stats.fingerprinted as f64 / elapsed
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Files:        {:>8}", stats.items);
    eprintln!("    Fingerprinted:{:>8}", stats.fingerprinted);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    if stats.degraded > 0 {
        eprintln!("    Degraded:     {:>8}", stats.degraded);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Groups:       {:>8}", stats.groups);
    eprintln!("    Duplicates:   {:>8}", stats.duplicates);
    eprintln!("    Reclaimable:  {:>7.1} MB", stats.reclaimable_bytes as f64 / 1_000_000.0);
    eprintln!("    Duration:     {:>7.1}s", elapsed);
    eprintln!("    Rate:         {:>7.1} files/sec", rate);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.jsonl");
        let report = DedupReport {
            stats: DedupStats {
                items: 3,
                ..Default::default()
            },
            ..Default::default()
        };

        write_report(&report, Some(&path), OutputFormat::JsonLines, true).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["kind"], "stats");
        assert_eq!(value["items"], 3);
    }
}
