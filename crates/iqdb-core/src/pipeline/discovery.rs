//! Finding image files under the paths given on the command line.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// Discovers image files in files and directories.
pub struct FileDiscovery {
    extensions: Vec<String>,
}

/// Information about a discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        let extensions = config
            .supported_formats
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        Self { extensions }
    }

    /// Discover all supported image files under `inputs`.
    ///
    /// Files named explicitly are kept regardless of extension; directories
    /// are walked recursively and filtered by extension. The result is sorted
    /// by path with duplicates removed.
    pub fn discover(&self, inputs: &[PathBuf]) -> Vec<DiscoveredFile> {
        let mut found = BTreeMap::new();

        for input in inputs {
            if input.is_file() {
                match std::fs::metadata(input) {
                    Ok(meta) => {
                        found.insert(input.clone(), meta.len());
                    }
                    Err(e) => tracing::warn!("Skipping {:?}: {}", input, e),
                }
                continue;
            }
            if !input.is_dir() {
                tracing::warn!("Skipping {:?}: not a file or directory", input);
                continue;
            }

            for entry in WalkDir::new(input).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !self.is_supported(entry.path()) {
                    continue;
                }
                if let Ok(meta) = entry.metadata() {
                    found.insert(entry.into_path(), meta.len());
                }
            }
        }

        found
            .into_iter()
            .map(|(path, size)| DiscoveredFile { path, size })
            .collect()
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
