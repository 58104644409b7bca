//! Configuration management and validation.
//!
//! Provides the settings for batch runs: how inputs are discovered, how
//! many documents are parsed at once, and how the results are written.

use crate::constants::{DEFAULT_SEPARATOR, NSIPRO_EXTENSION};
use crate::error::{NsiproError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output file format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One flattened row per document
    #[default]
    Csv,
    /// Pretty-printed array of full records
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsiproConfig {
    /// Number of documents parsed concurrently
    pub workers: usize,

    /// Descend into subdirectories of directory inputs
    pub recursive: bool,

    /// Extension (without the dot) of files picked up from directories
    pub extension: String,

    /// Joins nested keys into column names
    pub separator: String,

    pub output_format: OutputFormat,

    /// Explicit output path; derived from the first input when absent
    pub output_path: Option<PathBuf>,

    /// Show a progress bar while parsing
    pub show_progress: bool,
}

impl Default for NsiproConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            recursive: false,
            extension: NSIPRO_EXTENSION.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            output_format: OutputFormat::default(),
            output_path: None,
            show_progress: true,
        }
    }
}

impl NsiproConfig {
    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Disable the progress bar
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Reject settings the batch processor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(NsiproError::Configuration {
                message: "workers must be at least 1".to_string(),
            });
        }
        if self.separator.is_empty() {
            return Err(NsiproError::Configuration {
                message: "column separator must not be empty".to_string(),
            });
        }
        if self.extension.is_empty() {
            return Err(NsiproError::Configuration {
                message: "file extension must not be empty".to_string(),
            });
        }
        debug!("Configuration validated: {:?}", self);
        Ok(())
    }

    /// Output file for a run over `inputs`.
    ///
    /// An explicit path wins. Otherwise the basename of the first input
    /// with the format's extension, in the working directory.
    pub fn resolve_output_path(&self, inputs: &[PathBuf]) -> Result<PathBuf> {
        if let Some(path) = &self.output_path {
            return Ok(path.clone());
        }

        let stem = inputs
            .first()
            .and_then(|input| basename(input))
            .ok_or_else(|| NsiproError::Configuration {
                message: "cannot derive an output name without inputs".to_string(),
            })?;
        Ok(PathBuf::from(format!(
            "{}.{}",
            stem,
            self.output_format.extension()
        )))
    }
}

/// Final path component, resolving `.` and trailing separators first
fn basename(path: &Path) -> Option<String> {
    let resolved = if path.file_name().is_some() {
        path.to_path_buf()
    } else {
        std::fs::canonicalize(path).ok()?
    };
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
