//! Batch processing engine.
//!
//! Orchestrates a complete run: discover the input documents, parse them
//! concurrently, then write every successful record to one output file.

pub mod discovery;
pub mod streaming;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{discovery::FileDiscovery, streaming::StreamingProcessor, writer::RecordWriter};

use crate::config::NsiproConfig;
use crate::error::Result;
use crate::models::ProcessingStats;

use colored::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Main processor for NSIPRO batch conversion
#[derive(Debug)]
pub struct BatchProcessor {
    inputs: Vec<PathBuf>,
    config: NsiproConfig,
    file_discovery: FileDiscovery,
    streaming_processor: StreamingProcessor,
    record_writer: RecordWriter,
}

impl BatchProcessor {
    /// Create a processor for `inputs` (files or directories)
    pub fn new(inputs: Vec<PathBuf>, config: NsiproConfig) -> Result<Self> {
        config.validate()?;
        let output_path = config.resolve_output_path(&inputs)?;

        Ok(Self {
            file_discovery: FileDiscovery::new(
                inputs.clone(),
                config.recursive,
                config.extension.clone(),
            ),
            streaming_processor: StreamingProcessor::new(config.clone()),
            record_writer: RecordWriter::new(
                output_path,
                config.output_format,
                config.separator.clone(),
            ),
            inputs,
            config,
        })
    }

    pub fn output_path(&self) -> &std::path::Path {
        self.record_writer.output_path()
    }

    /// Main processing entry point
    pub async fn process(&self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        let output_path = self.output_path().to_path_buf();
        self.announce(|| {
            println!("{}", "Starting NSIPRO processing".bright_green().bold());
            for input in &self.inputs {
                println!("  {} {}", "Input:".bright_cyan(), input.display());
            }
            println!("  {} {}", "Output:".bright_cyan(), output_path.display());
        });

        // Step 1: Discover documents
        let files = self.file_discovery.discover()?;
        self.announce(|| {
            println!(
                "\n  {} {} NSIPRO file(s)",
                "Found".bright_green(),
                files.len().to_string().bright_white().bold()
            );
        });

        if files.is_empty() {
            warn!("No NSIPRO files to process; nothing written");
            return Ok(ProcessingStats {
                output_path,
                processing_time_ms: start_time.elapsed().as_millis(),
                ..Default::default()
            });
        }

        // Step 2: Parse concurrently
        let result = self.streaming_processor.process_files(&files).await;

        // Step 3: Write output
        let written = self.record_writer.write(&result.records)?;
        info!("Wrote {} record(s) to {}", written, output_path.display());

        let stats = ProcessingStats {
            files_discovered: files.len(),
            files_processed: result.files_processed,
            files_failed: result.files_failed,
            output_path,
            processing_time_ms: start_time.elapsed().as_millis(),
        };
        self.announce(|| print_summary(&stats));
        Ok(stats)
    }

    fn announce(&self, print: impl FnOnce()) {
        if self.config.show_progress {
            print();
        }
    }
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        stats.output_path.display().to_string().bright_white().bold()
    );
}
