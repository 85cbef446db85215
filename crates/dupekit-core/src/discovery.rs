//! File discovery for building item lists from directories.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::ProcessingConfig;
use crate::types::{Category, Item};

/// Discovers candidate files in directories.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Category inferred from the extension
    pub category: Category,
}

impl DiscoveredFile {
    /// Turn into an item, optionally forcing the category.
    pub fn into_item(self, category: Option<Category>) -> Item {
        Item::from_path(self.path, category.unwrap_or(self.category))
    }
}

impl FileDiscovery {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// Discover all candidate files at a path.
    ///
    /// If path is a file, returns it if it passes the extension filter.
    /// If path is a directory, walks it recursively.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            if self.is_supported(path) {
                if let Ok(meta) = std::fs::metadata(path) {
                    return vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                        category: Category::infer(path),
                    }];
                }
            }
            return vec![];
        }

        let include_hidden = self.config.include_hidden;
        let mut files = Vec::new();

        for entry in WalkDir::new(path)
            .follow_links(self.config.follow_links)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || include_hidden || !is_hidden(e))
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry: {}", err);
                    None
                }
            })
        {
            let entry_path = entry.path();
            if entry.file_type().is_file() && self.is_supported(entry_path) {
                if let Ok(meta) = entry.metadata() {
                    files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                        category: Category::infer(entry_path),
                    });
                }
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Whether a file passes the extension filter. An empty filter accepts everything.
    fn is_supported(&self, path: &Path) -> bool {
        if self.config.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').to_lowercase() == ext_lower)
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn filtered(extensions: &[&str]) -> FileDiscovery {
        FileDiscovery::new(ProcessingConfig {
            extensions: extensions.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_is_supported() {
        let discovery = filtered(&["jpg", ".wav"]);

        assert!(discovery.is_supported(Path::new("test.jpg")));
        assert!(discovery.is_supported(Path::new("test.JPG")));
        assert!(discovery.is_supported(Path::new("song.wav")));
        assert!(!discovery.is_supported(Path::new("test.txt")));
        assert!(!discovery.is_supported(Path::new("Makefile")));
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let discovery = filtered(&[]);
        assert!(discovery.is_supported(Path::new("anything.bin")));
        assert!(discovery.is_supported(Path::new("Makefile")));
    }

    #[test]
    fn test_discover_walks_sorted_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("b.mp3"), b"bb").unwrap();
        fs::write(dir.path().join("sub/a.jpg"), b"a").unwrap();
        fs::write(dir.path().join(".hidden.jpg"), b"h").unwrap();
        fs::write(dir.path().join(".cache/c.jpg"), b"c").unwrap();

        let files = filtered(&[]).discover(dir.path());
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("b.mp3"), PathBuf::from("sub/a.jpg")]);
        assert_eq!(files[0].category, Category::Audio);
        assert_eq!(files[1].category, Category::Image);
        assert_eq!(FileDiscovery::total_size(&files), 3);
    }

    #[test]
    fn test_discover_includes_hidden_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hidden.jpg"), b"h").unwrap();

        let discovery = FileDiscovery::new(ProcessingConfig {
            include_hidden: true,
            ..Default::default()
        });
        assert_eq!(discovery.discover(dir.path()).len(), 1);
    }

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        fs::write(&path, b"%PDF").unwrap();

        let files = filtered(&[]).discover(&path);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].category, Category::Document);

        assert!(filtered(&["jpg"]).discover(&path).is_empty());
    }

    #[test]
    fn test_into_item_category_override() {
        let file = DiscoveredFile {
            path: PathBuf::from("/x/a.bin"),
            size: 1,
            category: Category::Generic,
        };
        let item = file.clone().into_item(None);
        assert_eq!(item.category, Category::Generic);
        assert_eq!(item.id, "/x/a.bin");
        assert_eq!(file.into_item(Some(Category::Audio)).category, Category::Audio);
    }
}
