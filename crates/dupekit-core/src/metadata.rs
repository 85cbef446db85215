//! Metadata extraction for the fuzzy channel and canonical selection.

use chrono::{DateTime, Utc};
use exif::{In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::types::{Category, Item, ItemMetadata, ItemSource};

/// Builds [`ItemMetadata`] from a file on disk.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract whatever metadata is available for a file.
    ///
    /// Never fails: unreadable fields are left empty. Every file gets its
    /// format and modification time. Only images get the fuzzy-channel fields:
    /// file name, pixel dimensions and EXIF capture time and device.
    pub fn extract(path: &Path, category: Category) -> ItemMetadata {
        let mut meta = ItemMetadata {
            format: path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase),
            modified: Self::get_modified(path),
            ..Default::default()
        };

        if category == Category::Image {
            meta.filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string);
            if let Ok((width, height)) = image::image_dimensions(path) {
                meta.width = Some(width);
                meta.height = Some(height);
            }
            if let Some(exif) = Self::read_exif(path) {
                meta.captured_at = Self::get_datetime(&exif);
                meta.device = Self::get_device(&exif);
            }
        }

        meta
    }

    /// Attach extracted metadata to a path-backed item, keeping any fields
    /// the caller already set.
    pub fn enrich(item: Item) -> Item {
        let path = match &item.source {
            ItemSource::Path(p) => p.clone(),
            ItemSource::Bytes { .. } => return item,
        };
        let extracted = Self::extract(&path, item.category);
        let given = item.metadata.clone();
        let merged = ItemMetadata {
            filename: given.filename.or(extracted.filename),
            format: given.format.or(extracted.format),
            modified: given.modified.or(extracted.modified),
            captured_at: given.captured_at.or(extracted.captured_at),
            width: given.width.or(extracted.width),
            height: given.height.or(extracted.height),
            device: given.device.or(extracted.device),
            duration_secs: given.duration_secs.or(extracted.duration_secs),
        };
        item.with_metadata(merged)
    }

    fn get_modified(path: &Path) -> Option<DateTime<Utc>> {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    fn read_exif(path: &Path) -> Option<exif::Exif> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);
        Reader::new().read_from_container(&mut reader).ok()
    }

    /// Get a string field from EXIF data.
    fn get_string(exif: &exif::Exif, tag: Tag) -> Option<String> {
        exif.get_field(tag, In::PRIMARY)
            .map(|f| f.display_value().to_string().trim_matches('"').trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Get the capture datetime, preferring DateTimeOriginal over DateTime.
    fn get_datetime(exif: &exif::Exif) -> Option<String> {
        Self::get_string(exif, Tag::DateTimeOriginal)
            .or_else(|| Self::get_string(exif, Tag::DateTime))
    }

    /// Camera make and model joined, e.g. "Canon EOS R5".
    fn get_device(exif: &exif::Exif) -> Option<String> {
        let make = Self::get_string(exif, Tag::Make);
        let model = Self::get_string(exif, Tag::Model);
        match (make, model) {
            (Some(make), Some(model)) if model.starts_with(&make) => Some(model),
            (Some(make), Some(model)) => Some(format!("{make} {model}")),
            (make, model) => make.or(model),
        }
    }
}
