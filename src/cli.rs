//! Command-line interface components.

use crate::config::{NsiproConfig, OutputFormat};
use crate::constants::DEFAULT_SEPARATOR;
use crate::models::ProcessingStats;
use crate::processor::BatchProcessor;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "nsipro-parser")]
#[command(about = "Extract scan metadata from NSI CT .nsipro project files into CSV or JSON")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// .nsipro files or directories containing them
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Descend into subdirectories of directory inputs
    #[arg(short, long)]
    pub recursive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress the progress bar and summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Output file (defaults to <first input name>.<format> in the working directory)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Separator joining nested keys into CSV column names
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Number of files parsed concurrently (defaults to the CPU count)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Build the batch configuration from the parsed arguments
    pub fn to_config(&self) -> NsiproConfig {
        let mut config = NsiproConfig::default()
            .with_recursive(self.recursive)
            .with_output_format(self.format)
            .with_separator(self.separator.clone());
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(output) = &self.output {
            config = config.with_output_path(output.clone());
        }
        if self.quiet {
            config = config.without_progress();
        }
        config
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nsipro_parser={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}

/// Run a batch over the arguments' inputs
pub async fn run(args: Args) -> Result<ProcessingStats> {
    let config = args.to_config();
    let processor =
        BatchProcessor::new(args.paths, config).context("Invalid batch configuration")?;
    let output = processor.output_path().to_path_buf();
    processor
        .process()
        .await
        .with_context(|| format!("Batch run writing {} failed", output.display()))
}
