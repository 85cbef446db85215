//! Report output in JSON or JSON Lines.
//!
//! JSON writes the whole [`DedupReport`] as one document. JSON Lines writes
//! one record per line: each group, then each failure, then the stats, every
//! record tagged with a `kind` field so streams can be filtered with `jq`.

use serde::Serialize;
use std::io::{self, Write};

use crate::types::{DedupReport, DedupStats, DuplicateGroup, ItemFailure};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// One line of a JSON Lines report.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportLine<'a> {
    Group(&'a DuplicateGroup),
    Failure(&'a ItemFailure),
    Stats(&'a DedupStats),
}

/// Serializes reports and individual records.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    records_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            records_written: 0,
        }
    }

    /// Write a single serializable record.
    pub fn write<T: Serialize>(&mut self, record: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, record).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.records_written += 1;
        Ok(())
    }

    /// Write a full report in the configured format.
    pub fn write_report(&mut self, report: &DedupReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write(report),
            OutputFormat::JsonLines => {
                for group in &report.groups {
                    self.write(&ReportLine::Group(group))?;
                }
                for failure in &report.failures {
                    self.write(&ReportLine::Failure(failure))?;
                }
                self.write(&ReportLine::Stats(&report.stats))
            }
        }
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Serialize a value to a JSON string.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
