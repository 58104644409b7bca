//! Application constants for the NSIPRO parser
//!
//! This module contains the tag names, key paths, datetime formats and
//! default values used throughout the parser and the batch tooling.

// =============================================================================
// Markup Repair
// =============================================================================

/// Tags that NSI software sometimes writes with no value and no closing tag
pub const NULL_VALUE_TAGS: &[&str] = &[
    "fixturing",
    "phys_filter",
    "Software",
    "radio_dir",
    "radio_series",
];

// =============================================================================
// Typed Tree
// =============================================================================

/// Key under which an element's own text is stored when it also has
/// children or attributes
pub const TEXT_KEY: &str = "#text";

/// Timestamp formats in the order they are tried. The first is used by
/// recent NSI releases, the second by older ones.
pub const DATETIME_FORMATS: &[&str] = &["%d-%b-%y %I:%M:%S %p", "%m/%d/%Y %I:%M:%S %p"];

/// Output format for timestamps (ISO-8601 without timezone)
pub const TIMESTAMP_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// =============================================================================
// Record Layout
// =============================================================================

/// Reserved key holding the derived summary on an assembled record
pub const DERIVED_FIELDS_KEY: &str = "derived_fields";

/// Root element of every NSI reconstruction project
pub const PROJECT_ROOT: &str = "NSI_Reconstruction_Project";

/// Project configuration subtree, relative to the document root
pub const PROJECT_CONFIGURATION_PATH: &[&str] = &[PROJECT_ROOT, "CT_Project_Configuration"];

/// Scan geometry subtree (source/table/detector distances)
pub const SETUP_PATH: &[&str] = &[
    PROJECT_ROOT,
    "CT_Project_Configuration",
    "Technique_Configuration",
    "Setup",
];

/// Detector unsharpness subtree (pitch, Ug, zoom factor)
pub const UG_PATH: &[&str] = &[
    PROJECT_ROOT,
    "CT_Project_Configuration",
    "Technique_Configuration",
    "Ug",
];

// =============================================================================
// Scan Classification
// =============================================================================

/// Named scan techniques, matched by substring in this order
pub const SCAN_CATEGORIES: &[&str] = &["MosaiX", "VorteX"];

/// Additional technique only recognised in legacy comment text
pub const LEGACY_SCAN_CATEGORY: &str = "Helical";

/// Category reported when a scan type exists but names no technique
pub const STANDARD_SCAN_CATEGORY: &str = "Standard";

// =============================================================================
// Batch Defaults
// =============================================================================

/// Extension of NSI project files (without the dot)
pub const NSIPRO_EXTENSION: &str = "nsipro";

/// Default separator for flattened column names
pub const DEFAULT_SEPARATOR: &str = ".";
