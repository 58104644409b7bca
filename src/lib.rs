//! NSIPRO Parser Library
//!
//! Turns the quasi-XML `.nsipro` project files written by NSI CT scanning
//! software into typed records, with a normalized summary of the scan
//! (timing, geometry, source and detector settings) attached to each.
//!
//! The core pipeline is synchronous and does no I/O:
//! - [`normalizer`] repairs the markup
//! - [`tree`] builds a typed [`ParseTree`]
//! - [`lookup`] resolves keys anywhere in the tree
//! - [`extract`] derives individual fields
//! - [`record`] ties them together
//!
//! [`tabulate`], [`processor`] and [`cli`] add CSV/JSON export and
//! concurrent batch runs over files and directories.
//!
//! ```
//! use std::path::Path;
//!
//! let record = nsipro_parser::assemble(
//!     Path::new("scan.nsipro"),
//!     "<Part name>ABC123\n<Creation Date>14-Jan-21 10:00:00 AM",
//! )
//! .unwrap();
//! let derived = record.derived_fields().unwrap();
//! assert_eq!(derived.get("uid").and_then(|v| v.as_str()), Some("ABC123"));
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod models;
pub mod normalizer;
pub mod processor;
pub mod record;
pub mod tabulate;
pub mod tree;

pub use config::{NsiproConfig, OutputFormat};
pub use error::{NsiproError, Result};
pub use lookup::{Lookup, lookup};
pub use models::{DerivedFields, ParseTree, ProcessingStats, Timestamp, Value};
pub use normalizer::normalize;
pub use processor::BatchProcessor;
pub use record::{assemble, derive};
pub use tabulate::{flatten_record, records_to_dataframe};
pub use tree::build;
