//! Acquisition timing: when the scan started, when it finished, and how
//! long it took.

use super::{occurrences, subtree, text_values};
use crate::constants::PROJECT_CONFIGURATION_PATH;
use crate::error::{NsiproError, Result};
use crate::models::{ParseTree, Timestamp, Value};
use crate::tree::parse_timestamp;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Legacy completion note, e.g. `Standard scan completed 14-Jan-21 10:05:00 AM`
static SCAN_COMPLETED_AT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)scan completed\s+(?P<timestamp>.+?)\s*$").expect("valid completion pattern")
});

/// Start of acquisition.
///
/// Newer software records `acquisition_begin` in the project configuration;
/// older files only have the document's `Creation_Date`.
pub fn acquisition_begin(tree: &ParseTree) -> Option<Timestamp> {
    let configured = subtree(tree, PROJECT_CONFIGURATION_PATH)
        .and_then(|config| config.get("acquisition_begin"));

    match configured {
        Some(value) => collapse_timestamps("acquisition_begin", value.items()),
        None => {
            debug!("No configured acquisition_begin; falling back to Creation_Date");
            collapse_timestamps("Creation_Date", occurrences("Creation_Date", tree))
        }
    }
}

/// End of acquisition, from an explicit field or a legacy completion comment
pub fn acquisition_end(tree: &ParseTree) -> Option<Timestamp> {
    let explicit = occurrences("acquisition_end", tree);
    if let Some(end) = collapse_timestamps("acquisition_end", explicit) {
        return Some(end);
    }

    let from_comment = text_values("Comments", tree).into_iter().find_map(|comment| {
        SCAN_COMPLETED_AT
            .captures(comment)
            .and_then(|caps| caps.name("timestamp"))
            .and_then(|m| parse_timestamp(m.as_str()))
    });
    if from_comment.is_none() {
        debug!("No acquisition_end field or completion comment found");
    }
    from_comment
}

/// Seconds between the two endpoints
pub fn acquisition_duration(begin: Option<Timestamp>, end: Option<Timestamp>) -> Result<f64> {
    match (begin, end) {
        (Some(begin), Some(end)) => Ok((end - begin).num_milliseconds() as f64 / 1000.0),
        (None, _) => Err(NsiproError::derivation(
            "acquisition_duration",
            "acquisition_begin is missing or not a timestamp",
        )),
        (_, None) => Err(NsiproError::derivation(
            "acquisition_duration",
            "acquisition_end is missing or not a timestamp",
        )),
    }
}

/// Reduce repeated timestamp reports to one.
///
/// Identical duplicates collapse. Distinct ones are never merged: the first
/// in document order is kept and the conflict logged.
fn collapse_timestamps(field: &str, values: Vec<&Value>) -> Option<Timestamp> {
    let mut distinct: Vec<Timestamp> = Vec::new();
    for ts in values.iter().filter_map(|v| v.as_timestamp()) {
        if !distinct.contains(&ts) {
            distinct.push(ts);
        }
    }

    match distinct.as_slice() {
        [] => {
            if !values.is_empty() {
                warn!("{} is present but is not a recognised timestamp", field);
            }
            None
        }
        [only] => Some(*only),
        [first, ..] => {
            warn!(
                "{} recorded {} different timestamps; using the first",
                field,
                distinct.len()
            );
            Some(*first)
        }
    }
}
