//! Semantic field extractors.
//!
//! Each extractor is a pure function over a [`ParseTree`] that locates one
//! piece of scan metadata, whatever key name, depth or schema version the
//! writing software used, and returns `None` when the evidence is absent.
//! Extractors never panic and never share state; the record assembler
//! composes them.

pub mod acquisition;
pub mod geometry;
pub mod hardware;
pub mod identity;

pub use acquisition::{acquisition_begin, acquisition_duration, acquisition_end};
pub use geometry::{
    calculated_ug, dimensions, estimated_slicethickness, pitch, source_to_detector_distance,
    source_to_table_distance, zoom_factor,
};
pub use hardware::{
    current, defective_pixels, filter, frames_averaged, framerate, helical_pitch, projections,
    rotations, voltage,
};
pub use identity::{ScanType, acquisition_software_version, scan_type, session_name, uid};

use crate::lookup::{get_path, lookup};
use crate::models::{ParseTree, Value};
use tracing::warn;

/// First non-blank value found under any of `keys`, tried in order.
///
/// Repeated tags are expanded item by item, so a key written several
/// times with one value resolves to that value. Differing values keep the
/// first in document order and are logged.
pub(crate) fn first_present<'a>(keys: &[&str], tree: &'a ParseTree) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        let present: Vec<&Value> = occurrences(key, tree)
            .into_iter()
            .filter(|value| !is_blank(value))
            .collect();
        let first = *present.first()?;
        if present.iter().any(|value| *value != first) {
            warn!("'{}' has conflicting values; using the first", key);
        }
        Some(first)
    })
}

/// Every value stored under `key` at any depth, sequences expanded
pub(crate) fn occurrences<'a>(key: &str, tree: &'a ParseTree) -> Vec<&'a Value> {
    lookup(key, tree)
        .values()
        .into_iter()
        .flat_map(Value::items)
        .collect()
}

/// First numeric value found under any of `keys`
pub(crate) fn first_number(keys: &[&str], tree: &ParseTree) -> Option<f64> {
    first_present(keys, tree).and_then(number)
}

/// First integral value found under any of `keys`
pub(crate) fn first_count(keys: &[&str], tree: &ParseTree) -> Option<i64> {
    first_present(keys, tree)
        .and_then(|value| value.items().into_iter().find_map(Value::as_i64))
}

/// Every string stored under `key`, duplicates and nested lists expanded
pub(crate) fn text_values<'a>(key: &str, tree: &'a ParseTree) -> Vec<&'a str> {
    occurrences(key, tree)
        .into_iter()
        .filter_map(Value::as_str)
        .collect()
}

pub(crate) fn subtree<'a>(tree: &'a ParseTree, path: &[&str]) -> Option<&'a ParseTree> {
    get_path(tree, path)?.as_tree()
}

/// Numeric view of a value; a duplicated field yields its first number
pub(crate) fn number(value: &Value) -> Option<f64> {
    value.items().into_iter().find_map(Value::as_f64)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Str(s) => s.trim().is_empty(),
        _ => false,
    }
}
