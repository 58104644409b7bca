//! Error handling for NSIPRO parsing operations.
//!
//! Covers the fatal per-document failures (markup that cannot be parsed),
//! recoverable derivation failures, and the I/O and export errors raised by
//! the batch layer.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NsiproError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory traversal error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Malformed markup: {reason}")]
    Markup { reason: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<NsiproError>,
    },

    #[error("Cannot derive {field}: {reason}")]
    Derivation { field: &'static str, reason: String },

    #[error("Input not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl NsiproError {
    pub(crate) fn markup(reason: impl Into<String>) -> Self {
        Self::Markup {
            reason: reason.into(),
        }
    }

    pub(crate) fn derivation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Derivation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<quick_xml::Error> for NsiproError {
    fn from(error: quick_xml::Error) -> Self {
        Self::markup(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NsiproError>;
