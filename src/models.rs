//! Core data structures and types for NSIPRO processing.
//!
//! Defines the typed parse tree, the derived-field summary attached to
//! every record, and the statistics reported by batch runs.

use crate::constants::{DERIVED_FIELDS_KEY, TIMESTAMP_ISO_FORMAT};
use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// Calendar date-time with no implied timezone
pub type Timestamp = NaiveDateTime;

/// A typed value in the parse tree
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent derivation; never produced by the tree builder
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(Timestamp),
    Str(String),
    Tree(ParseTree),
    Seq(Vec<Value>),
}

impl Value {
    /// Numeric view of the value (integers widen to floats)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value; floats qualify only when integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ParseTree> {
        match self {
            Value::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Text rendering of a scalar. Trees, sequences and nulls have none.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Timestamp(ts) => Some(ts.format(TIMESTAMP_ISO_FORMAT).to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::Null | Value::Tree(_) | Value::Seq(_) => None,
        }
    }

    /// The value as a list: a sequence yields its items, anything else
    /// yields itself. Lets callers treat "one comment" and "many comments"
    /// alike.
    pub fn items(&self) -> Vec<&Value> {
        match self {
            Value::Seq(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "timestamp",
            Value::Str(_) => "str",
            Value::Tree(_) => "tree",
            Value::Seq(_) => "seq",
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Timestamp(ts) => serializer.collect_str(&ts.format(TIMESTAMP_ISO_FORMAT)),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Tree(tree) => tree.serialize(serializer),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Timestamp> for Value {
    fn from(value: Timestamp) -> Self {
        Value::Timestamp(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<ParseTree> for Value {
    fn from(value: ParseTree) -> Self {
        Value::Tree(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Ordered mapping from tag names to values.
///
/// Keys are unique per level and keep document order; repeated tags are
/// held as a single [`Value::Seq`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseTree {
    entries: Vec<(String, Value)>,
}

impl ParseTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert or replace a value. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The derived summary attached by the record assembler, if any
    pub fn derived_fields(&self) -> Option<&ParseTree> {
        self.get(DERIVED_FIELDS_KEY).and_then(Value::as_tree)
    }
}

impl IntoIterator for ParseTree {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Value)> for ParseTree {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut tree = ParseTree::new();
        for (key, value) in iter {
            tree.insert(key, value);
        }
        tree
    }
}

impl Serialize for ParseTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Reconstruction volume size in voxels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: i64,
    pub height: i64,
    pub depth: i64,
    pub xyz: [i64; 3],
}

impl Dimensions {
    pub fn new(width: i64, height: i64, depth: i64) -> Self {
        Self {
            width,
            height,
            depth,
            xyz: [width, height, depth],
        }
    }
}

/// Reported (requested) and actual (measured) value of a source setting
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub reported: Option<f64>,
    pub actual: Option<f64>,
}

/// X-ray source settings
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SourceSettings {
    pub voltage: Reading,
    pub current: Reading,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectorSettings {
    pub framerate: Option<f64>,
}

/// Normalized scan summary computed from a parse tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedFields {
    pub nsipro_filepath: Option<String>,
    pub acquisition_begin: Option<Timestamp>,
    pub acquisition_end: Option<Timestamp>,
    pub acquisition_duration: Option<f64>,
    pub session_name: Option<String>,
    pub uid: Option<Value>,
    pub scan_type: Option<String>,
    pub scan_type_category: Option<String>,
    pub acquisition_software_version: Option<Value>,
    pub source_to_detector_distance: Option<f64>,
    pub source_to_table_distance: Option<f64>,
    pub pitch: Option<f64>,
    pub estimated_slicethickness: Option<f64>,
    pub dimensions: Option<Dimensions>,
    pub source: SourceSettings,
    pub filter: Option<String>,
    pub detector: DetectorSettings,
    pub calculated_ug: Option<f64>,
    pub zoom_factor: Option<f64>,
    pub projections: Option<i64>,
    pub rotations: Option<i64>,
    pub frames_averaged: Option<i64>,
    pub helical_pitch: Option<f64>,
    pub defective_pixels: Option<i64>,
}

impl DerivedFields {
    /// Render the summary as a parse tree so it can be attached to a record
    pub fn to_tree(&self) -> ParseTree {
        let reading = |r: &Reading| {
            let mut tree = ParseTree::new();
            tree.insert("reported", r.reported);
            tree.insert("actual", r.actual);
            tree
        };

        let mut source = ParseTree::new();
        source.insert("voltage", reading(&self.source.voltage));
        source.insert("current", reading(&self.source.current));

        let mut detector = ParseTree::new();
        detector.insert("framerate", self.detector.framerate);

        let dimensions = self.dimensions.map_or(Value::Null, |d| {
            let mut tree = ParseTree::new();
            tree.insert("width", d.width);
            tree.insert("height", d.height);
            tree.insert("depth", d.depth);
            tree.insert("xyz", Value::Seq(d.xyz.iter().map(|&v| Value::Int(v)).collect()));
            Value::Tree(tree)
        });

        let mut tree = ParseTree::new();
        tree.insert("nsipro_filepath", self.nsipro_filepath.clone());
        tree.insert("acquisition_begin", self.acquisition_begin);
        tree.insert("acquisition_end", self.acquisition_end);
        tree.insert("acquisition_duration", self.acquisition_duration);
        tree.insert("session_name", self.session_name.clone());
        tree.insert("uid", self.uid.clone());
        tree.insert("scan_type", self.scan_type.clone());
        tree.insert("scan_type_category", self.scan_type_category.clone());
        tree.insert(
            "acquisition_software_version",
            self.acquisition_software_version.clone(),
        );
        tree.insert("source_to_detector_distance", self.source_to_detector_distance);
        tree.insert("source_to_table_distance", self.source_to_table_distance);
        tree.insert("pitch", self.pitch);
        tree.insert("estimated_slicethickness", self.estimated_slicethickness);
        tree.insert("dimensions", dimensions);
        tree.insert("source", source);
        tree.insert("filter", self.filter.clone());
        tree.insert("detector", detector);
        tree.insert("calculated_Ug", self.calculated_ug);
        tree.insert("zoom_factor", self.zoom_factor);
        tree.insert("projections", self.projections);
        tree.insert("rotations", self.rotations);
        tree.insert("frames_averaged", self.frames_averaged);
        tree.insert("helical_pitch", self.helical_pitch);
        tree.insert("defective_pixels", self.defective_pixels);
        tree
    }
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
