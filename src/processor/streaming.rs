//! Concurrent document processing
//!
//! Each document is read and assembled on the blocking pool. At most
//! `workers` documents are in flight, and results come back in input
//! order. A document that fails is logged and counted, never fatal.

use crate::config::NsiproConfig;
use crate::error::{NsiproError, Result};
use crate::models::ParseTree;
use crate::record::assemble;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, error};

/// Outcome of a streaming run
#[derive(Debug, Default)]
pub struct StreamingResult {
    /// Assembled records, in input order
    pub records: Vec<ParseTree>,
    pub files_processed: usize,
    pub files_failed: usize,
}

/// Streaming processor for NSIPRO documents
#[derive(Debug)]
pub struct StreamingProcessor {
    config: NsiproConfig,
}

impl StreamingProcessor {
    pub fn new(config: NsiproConfig) -> Self {
        Self { config }
    }

    /// Parse every file with bounded concurrency
    pub async fn process_files(&self, files: &[PathBuf]) -> StreamingResult {
        let pb = self.progress_bar(files.len());
        let concurrent_limit = self.config.workers.clamp(1, files.len().max(1));
        debug!(
            "Processing {} file(s) with {} worker(s)",
            files.len(),
            concurrent_limit
        );

        let result = stream::iter(files)
            .map(|file_path| {
                let pb = pb.clone();
                async move {
                    if let Some(file_name) = file_path.file_name() {
                        pb.set_message(format!("Processing: {}", file_name.to_string_lossy()));
                    }
                    let result = process_single_file(file_path).await;
                    pb.inc(1);

                    match result {
                        Ok(record) => {
                            debug!("Successfully processed: {}", file_path.display());
                            Ok(record)
                        }
                        Err(e) => {
                            error!("Failed to process {}: {}", file_path.display(), e);
                            Err(e)
                        }
                    }
                }
            })
            .buffered(concurrent_limit)
            .fold(StreamingResult::default(), |mut acc, result| async move {
                match result {
                    Ok(record) => {
                        acc.records.push(record);
                        acc.files_processed += 1;
                    }
                    Err(_) => acc.files_failed += 1,
                }
                acc
            })
            .await;

        pb.finish_with_message("All NSIPRO files processed");
        result
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Processing files");
        pb
    }
}

/// Read one document and assemble its record on the blocking pool.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub async fn process_single_file(file_path: &Path) -> Result<ParseTree> {
    let path = file_path.to_path_buf();
    task::spawn_blocking(move || {
        let bytes = std::fs::read(&path)?;
        let text = String::from_utf8_lossy(&bytes);
        assemble(&path, &text)
    })
    .await
    .map_err(|e| NsiproError::ProcessingFailed {
        path: file_path.to_path_buf(),
        reason: format!("Worker task failed: {}", e),
    })?
}
