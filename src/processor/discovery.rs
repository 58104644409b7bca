//! File discovery for batch runs
//!
//! Expands the paths given on the command line into the list of NSIPRO
//! documents to parse. Files are taken as given; directories contribute
//! their matching files, and their subdirectories only when recursion is
//! enabled.

use crate::error::{NsiproError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// File discovery component
#[derive(Debug)]
pub struct FileDiscovery {
    inputs: Vec<PathBuf>,
    recursive: bool,
    extension: String,
}

impl FileDiscovery {
    pub fn new(inputs: Vec<PathBuf>, recursive: bool, extension: impl Into<String>) -> Self {
        Self {
            inputs,
            recursive,
            extension: extension.into(),
        }
    }

    /// Resolve every input to a readable document path.
    ///
    /// Paths are canonicalized and de-duplicated, keeping the first
    /// occurrence. A missing or unreadable input fails the whole discovery.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for input in &self.inputs {
            if !input.exists() {
                return Err(NsiproError::InputNotFound {
                    path: input.clone(),
                });
            }

            if input.is_dir() {
                let found = self.discover_in_directory(input)?;
                if found.is_empty() {
                    warn!(
                        "No .{} files found in {}",
                        self.extension,
                        input.display()
                    );
                }
                files.extend(found);
            } else {
                files.push(input.clone());
            }
        }

        let mut unique: Vec<PathBuf> = Vec::with_capacity(files.len());
        for file in files {
            let canonical = std::fs::canonicalize(&file)?;
            if unique.contains(&canonical) {
                debug!("Skipping duplicate input: {}", file.display());
                continue;
            }
            unique.push(canonical);
        }

        for file in &unique {
            File::open(file)?;
        }

        debug!("Discovered {} document(s)", unique.len());
        Ok(unique)
    }

    fn discover_in_directory(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        debug!(
            "Searching {} for .{} files (recursive: {})",
            directory.display(),
            self.extension,
            self.recursive
        );

        let mut files = Vec::new();
        for entry in WalkDir::new(directory)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && has_extension(path, &self.extension) {
                files.push(path.to_path_buf());
            }
        }
        Ok(files)
    }
}

/// Check a path's extension, case-sensitively
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}
