//! X-ray source, filter and detector settings.

use super::{first_count, first_number, first_present, text_values};
use crate::models::{ParseTree, Reading, Value};
use once_cell::sync::Lazy;
use regex::Regex;

/// `37 defective pixels corrected`
static DEFECTIVE_PIXELS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<count>\d+)\s+defective").expect("valid defective pattern"));

/// Tube voltage in kV, requested and measured
pub fn voltage(tree: &ParseTree) -> Reading {
    reading(tree, "kV", "actual_kV")
}

/// Tube current in uA, requested and measured
pub fn current(tree: &ParseTree) -> Reading {
    reading(tree, "uA", "actual_uA")
}

fn reading(tree: &ParseTree, reported: &str, actual: &str) -> Reading {
    Reading {
        reported: first_number(&[reported], tree),
        actual: first_number(&[actual], tree),
    }
}

/// Physical filter description. A bare `<phys_filter>` means no filter.
pub fn filter(tree: &ParseTree) -> Option<String> {
    first_present(&["phys_filter"], tree).and_then(Value::scalar_text)
}

pub fn framerate(tree: &ParseTree) -> Option<f64> {
    first_number(&["fps", "frame_rate"], tree)
}

pub fn projections(tree: &ParseTree) -> Option<i64> {
    first_count(&["Number_of_projections", "number_of_projections"], tree)
}

pub fn rotations(tree: &ParseTree) -> Option<i64> {
    first_count(&["Number_of_rotations", "number_of_rotations"], tree)
}

pub fn frames_averaged(tree: &ParseTree) -> Option<i64> {
    first_count(&["Frames_averaged", "frames_averaged"], tree)
}

pub fn helical_pitch(tree: &ParseTree) -> Option<f64> {
    first_number(&["Helical_pitch", "helical_pitch"], tree)
}

/// Defective pixel count reported in the detector status lines.
///
/// Status lines are scanned in order; the first that mentions a count wins.
pub fn defective_pixels(tree: &ParseTree) -> Option<i64> {
    text_values("status", tree).into_iter().find_map(|line| {
        DEFECTIVE_PIXELS
            .captures(line)
            .and_then(|caps| caps.name("count"))
            .and_then(|m| m.as_str().parse::<i64>().ok())
    })
}
