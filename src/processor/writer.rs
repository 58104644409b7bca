//! Output writing for batch runs
//!
//! CSV output holds one flattened row per record over the union of all
//! columns. JSON output is a pretty-printed array of the full records.

use crate::config::OutputFormat;
use crate::error::{NsiproError, Result};
use crate::models::ParseTree;
use crate::tabulate::{Row, flatten_record, records_to_dataframe};

use polars::prelude::{CsvWriter, SerWriter};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Record writer for a single output file
#[derive(Debug)]
pub struct RecordWriter {
    output_path: PathBuf,
    format: OutputFormat,
    separator: String,
}

impl RecordWriter {
    pub fn new(output_path: PathBuf, format: OutputFormat, separator: impl Into<String>) -> Self {
        Self {
            output_path,
            format,
            separator: separator.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write all records, returning how many were written
    pub fn write(&self, records: &[ParseTree]) -> Result<usize> {
        if let Some(parent) = self
            .output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)?;
        }

        match self.format {
            OutputFormat::Csv => self.write_csv(records)?,
            OutputFormat::Json => self.write_json(records)?,
        }

        debug!(
            "Wrote {} record(s) to {}",
            records.len(),
            self.output_path.display()
        );
        Ok(records.len())
    }

    fn write_csv(&self, records: &[ParseTree]) -> Result<()> {
        let rows: Vec<Row> = records
            .iter()
            .map(|record| flatten_record(record, &self.separator))
            .collect();
        let mut df = records_to_dataframe(&rows)?;

        let mut file = File::create(&self.output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| NsiproError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Failed to write CSV: {}", e),
            })?;
        Ok(())
    }

    fn write_json(&self, records: &[ParseTree]) -> Result<()> {
        let file = File::create(&self.output_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
