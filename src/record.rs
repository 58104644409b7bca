//! Record assembly: one raw NSIPRO document in, one typed record out.
//!
//! Runs the normalizer and tree builder, then every field extractor, and
//! attaches the resulting summary to the tree under `derived_fields`.
//! Only a document that cannot be turned into a tree is an error; a field
//! that cannot be derived becomes null and is logged.

use crate::constants::DERIVED_FIELDS_KEY;
use crate::error::{NsiproError, Result};
use crate::extract;
use crate::models::{DerivedFields, DetectorSettings, ParseTree, SourceSettings};
use crate::normalizer::normalize;
use crate::tree::build;
use std::path::Path;
use tracing::{debug, warn};

/// Parse one document and attach its derived fields.
///
/// `path` only tags the record; it is never read.
pub fn assemble(path: &Path, text: &str) -> Result<ParseTree> {
    let markup = normalize(text);
    let mut tree = build(&markup).map_err(|source| NsiproError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    let derived = derive(&tree, Some(path));
    tree.insert(DERIVED_FIELDS_KEY, derived.to_tree());
    debug!("Assembled record for {}", path.display());
    Ok(tree)
}

/// Run every extractor against `tree`
pub fn derive(tree: &ParseTree, path: Option<&Path>) -> DerivedFields {
    let acquisition_begin = extract::acquisition_begin(tree);
    let acquisition_end = extract::acquisition_end(tree);
    let acquisition_duration = recover(extract::acquisition_duration(
        acquisition_begin,
        acquisition_end,
    ));

    let scan_type = extract::scan_type(tree);

    let pitch = extract::pitch(tree);
    let source_to_detector_distance = extract::source_to_detector_distance(tree);
    let source_to_table_distance = extract::source_to_table_distance(tree);
    let estimated_slicethickness = recover(extract::estimated_slicethickness(
        pitch,
        source_to_detector_distance,
        source_to_table_distance,
    ));

    DerivedFields {
        nsipro_filepath: path.map(|p| p.display().to_string()),
        acquisition_begin,
        acquisition_end,
        acquisition_duration,
        session_name: extract::session_name(tree),
        uid: extract::uid(tree),
        scan_type: scan_type.as_ref().map(|s| s.name.clone()),
        scan_type_category: scan_type.map(|s| s.category),
        acquisition_software_version: extract::acquisition_software_version(tree),
        source_to_detector_distance,
        source_to_table_distance,
        pitch,
        estimated_slicethickness,
        dimensions: extract::dimensions(tree),
        source: SourceSettings {
            voltage: extract::voltage(tree),
            current: extract::current(tree),
        },
        filter: extract::filter(tree),
        detector: DetectorSettings {
            framerate: extract::framerate(tree),
        },
        calculated_ug: extract::calculated_ug(tree),
        zoom_factor: extract::zoom_factor(tree),
        projections: extract::projections(tree),
        rotations: extract::rotations(tree),
        frames_averaged: extract::frames_averaged(tree),
        helical_pitch: extract::helical_pitch(tree),
        defective_pixels: extract::defective_pixels(tree),
    }
}

fn recover(result: Result<f64>) -> Option<f64> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}
