//! Scan geometry: distances, detector pitch, slice thickness, volume size
//! and the unsharpness/zoom figures from the `Ug` block.

use super::{first_present, number, occurrences, subtree, text_values};
use crate::constants::{SETUP_PATH, TEXT_KEY, UG_PATH};
use crate::error::{NsiproError, Result};
use crate::lookup::get_path;
use crate::models::{Dimensions, ParseTree, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// `(12.5 pixels)` inside the free-text Ug description
static UG_PIXELS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((?P<value>[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s+pixels\)")
        .expect("valid Ug pattern")
});

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("valid float pattern")
});

pub fn source_to_detector_distance(tree: &ParseTree) -> Option<f64> {
    number_at(tree, SETUP_PATH, "source_to_detector_distance")
}

pub fn source_to_table_distance(tree: &ParseTree) -> Option<f64> {
    number_at(tree, SETUP_PATH, "source_to_table_distance")
}

/// Detector pixel pitch
pub fn pitch(tree: &ParseTree) -> Option<f64> {
    number_at(tree, UG_PATH, "det_pitch")
}

/// Voxel size estimate: `pitch / source_to_detector * source_to_table`.
///
/// Every input must be present and non-zero.
pub fn estimated_slicethickness(
    pitch: Option<f64>,
    source_to_detector_distance: Option<f64>,
    source_to_table_distance: Option<f64>,
) -> Result<f64> {
    let nonzero = |v: Option<f64>| v.filter(|x| *x != 0.0);
    match (
        nonzero(pitch),
        nonzero(source_to_detector_distance),
        nonzero(source_to_table_distance),
    ) {
        (Some(pitch), Some(to_detector), Some(to_table)) => Ok(pitch * to_table / to_detector),
        _ => Err(NsiproError::derivation(
            "estimated_slicethickness",
            format!(
                "needs non-zero pitch, source_to_detector_distance and source_to_table_distance \
                 (got {:?}, {:?}, {:?})",
                pitch, source_to_detector_distance, source_to_table_distance
            ),
        )),
    }
}

/// Reconstruction volume size.
///
/// Only present when the project holds a `Volume`. Its `resolution` is
/// written as `width depth height`; the result is ordered width, height,
/// depth.
pub fn dimensions(tree: &ParseTree) -> Option<Dimensions> {
    let volume = occurrences("Volume", tree).into_iter().find_map(Value::as_tree);
    let Some(volume) = volume else {
        debug!("No reconstruction volume; dimensions unavailable");
        return None;
    };

    let resolution = first_present(&["resolution"], volume)?.scalar_text()?;
    let axes: Vec<i64> = resolution
        .split_whitespace()
        .map(parse_axis)
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();

    match axes.as_slice() {
        [width, depth, height] => Some(Dimensions::new(*width, *height, *depth)),
        _ => {
            warn!("Volume resolution '{}' is not a width/depth/height triplet", resolution);
            None
        }
    }
}

fn parse_axis(token: &str) -> Option<i64> {
    token.parse::<i64>().ok().or_else(|| {
        token
            .parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

/// Geometric unsharpness in pixels.
///
/// Prefers the numeric text of the `Ug` element itself; otherwise reads the
/// `(<value> pixels)` fragment of `ug_text`.
pub fn calculated_ug(tree: &ParseTree) -> Option<f64> {
    let candidates = match get_path(tree, UG_PATH) {
        Some(ug) => ug.items(),
        None => occurrences("Ug", tree),
    };
    let direct = candidates.into_iter().find_map(|value| match value {
        Value::Tree(ug) => ug.get(TEXT_KEY).and_then(Value::as_f64),
        other => other.as_f64(),
    });
    if direct.is_some() {
        return direct;
    }

    text_values("ug_text", tree).into_iter().find_map(|text| {
        UG_PIXELS
            .captures(text)
            .and_then(|caps| caps.name("value"))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    })
}

/// Zoom factor from `zoom_factor_text`, written as e.g. `(1.667x)`
pub fn zoom_factor(tree: &ParseTree) -> Option<f64> {
    match first_present(&["zoom_factor_text"], tree)? {
        Value::Str(text) => {
            let mut chars = text.chars();
            chars.next();
            LEADING_FLOAT
                .find(chars.as_str().trim_start())
                .and_then(|m| m.as_str().parse::<f64>().ok())
        }
        other => number(other),
    }
}

fn number_at(tree: &ParseTree, base: &[&str], key: &str) -> Option<f64> {
    let found = subtree(tree, base).and_then(|node| node.get(key));
    match found {
        Some(value) => number(value),
        None => {
            debug!("{} not found under {}", key, base.join("."));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures::{LEGACY_HELICAL, VORTEX_SCAN, parse};

    #[test]
    fn test_setup_distances() {
        let tree = parse(VORTEX_SCAN);
        assert_eq!(source_to_detector_distance(&tree), Some(500.0));
        assert_eq!(source_to_table_distance(&tree), Some(300.0));
        assert_eq!(pitch(&tree), Some(2.0));
    }

    #[test]
    fn test_distances_only_read_from_setup() {
        let tree = parse("<source_to_detector_distance>500</source_to_detector_distance>");
        assert_eq!(source_to_detector_distance(&tree), None);
    }

    #[test]
    fn test_slicethickness() {
        let value = estimated_slicethickness(Some(2.0), Some(500.0), Some(300.0)).unwrap();
        assert!((value - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_slicethickness_missing_or_zero_input() {
        assert!(estimated_slicethickness(None, Some(500.0), Some(300.0)).is_err());
        assert!(estimated_slicethickness(Some(2.0), Some(0.0), Some(300.0)).is_err());

        let tree = parse(LEGACY_HELICAL);
        let result = estimated_slicethickness(
            pitch(&tree),
            source_to_detector_distance(&tree),
            source_to_table_distance(&tree),
        );
        assert!(matches!(result, Err(NsiproError::Derivation { .. })));
    }

    #[test]
    fn test_dimensions_reorders_axes() {
        let dims = dimensions(&parse(VORTEX_SCAN)).unwrap();
        assert_eq!(dims.width, 1024);
        assert_eq!(dims.height, 900);
        assert_eq!(dims.depth, 768);
        assert_eq!(dims.xyz, [1024, 900, 768]);
    }

    #[test]
    fn test_dimensions_absent_without_volume() {
        assert_eq!(dimensions(&parse(LEGACY_HELICAL)), None);
    }

    #[test]
    fn test_dimensions_from_sibling_volumes() {
        let tree = parse(
            "<Volume>\n<resolution>1024 768 900\n</Volume>\n\
             <Volume>\n<resolution>512 384 450\n</Volume>",
        );
        assert_eq!(dimensions(&tree), Some(Dimensions::new(1024, 900, 768)));
    }

    #[test]
    fn test_dimensions_with_repeated_resolution() {
        let tree = parse("<Volume>\n<resolution>10 20 30\n<resolution>10 20 30\n</Volume>");
        assert_eq!(dimensions(&tree), Some(Dimensions::new(10, 30, 20)));
    }

    #[test]
    fn test_malformed_resolution() {
        let tree = parse("<Volume>\n<resolution>1024 x 768</resolution>\n</Volume>");
        assert_eq!(dimensions(&tree), None);
    }

    #[test]
    fn test_calculated_ug_from_text_fragment() {
        assert_eq!(calculated_ug(&parse(VORTEX_SCAN)), Some(12.5));
    }

    #[test]
    fn test_calculated_ug_prefers_element_text() {
        assert_eq!(calculated_ug(&parse(LEGACY_HELICAL)), Some(0.08));
    }

    #[test]
    fn test_calculated_ug_from_repeated_element() {
        assert_eq!(calculated_ug(&parse("<Ug>0.08</Ug>\n<Ug>0.08</Ug>")), Some(0.08));
    }

    #[test]
    fn test_calculated_ug_without_pixels_fragment() {
        let tree = parse("<Ug>\n<ug_text>not measured</ug_text>\n</Ug>");
        assert_eq!(calculated_ug(&tree), None);
    }

    #[test]
    fn test_zoom_factor() {
        assert_eq!(zoom_factor(&parse(VORTEX_SCAN)), Some(1.667));
        assert_eq!(zoom_factor(&parse("<zoom_factor_text>2.5</zoom_factor_text>")), Some(2.5));
        assert_eq!(zoom_factor(&parse("<zoom_factor_text>(n/a)</zoom_factor_text>")), None);
        assert_eq!(zoom_factor(&parse(LEGACY_HELICAL)), None);
    }
}
