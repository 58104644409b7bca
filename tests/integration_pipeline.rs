//! End-to-end tests of the document pipeline through the public API

use chrono::NaiveDate;
use nsipro_parser::{
    NsiproError, ParseTree, Timestamp, Value, assemble, build, flatten_record, normalize,
    records_to_dataframe,
};
use std::path::Path;

const VORTEX_SCAN: &str = include_str!("fixtures/vortex_scan.nsipro");
const LEGACY_HELICAL: &str = include_str!("fixtures/legacy_helical.nsipro");

fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn derived(record: &ParseTree) -> &ParseTree {
    record.derived_fields().expect("record has derived fields")
}

fn field<'a>(record: &'a ParseTree, path: &[&str]) -> &'a Value {
    let mut node = derived(record);
    let (last, parents) = path.split_last().unwrap();
    for key in parents {
        node = node.get(key).and_then(Value::as_tree).unwrap();
    }
    node.get(last).unwrap()
}

#[test]
fn test_part_name_and_creation_date() {
    let text = "<Part_name>ABC123</Part_name>\n<Creation_Date>14-Jan-21 10:00:00 AM</Creation_Date>";
    let record = assemble(Path::new("a.nsipro"), text).unwrap();

    assert_eq!(field(&record, &["uid"]), &Value::Str("ABC123".to_string()));
    assert_eq!(
        field(&record, &["acquisition_begin"]),
        &Value::Timestamp(ts(2021, 1, 14, 10, 0, 0))
    );
}

#[test]
fn test_bare_null_tag_is_empty_value() {
    let markup = normalize("<fixturing>");
    assert_eq!(markup, "<fixturing></fixturing>");

    let tree = build(&markup).unwrap();
    assert_eq!(tree.get("fixturing"), Some(&Value::Str(String::new())));
    assert!(assemble(Path::new("b.nsipro"), "<fixturing>").is_ok());
}

#[test]
fn test_explicit_scan_type() {
    let record = assemble(
        Path::new("c.nsipro"),
        "<Scan_Type>VorteX continuous</Scan_Type>",
    )
    .unwrap();
    assert_eq!(
        field(&record, &["scan_type"]),
        &Value::Str("VorteX continuous".to_string())
    );
    assert_eq!(
        field(&record, &["scan_type_category"]),
        &Value::Str("VorteX".to_string())
    );
}

#[test]
fn test_repeated_sibling_tags_resolve() {
    let text = "<Creation_Date>14-Jan-21 09:58:12 AM</Creation_Date>\n\
                <Creation_Date>14-Jan-21 09:58:12 AM</Creation_Date>\n\
                <acquisition_end>14-Jan-21 10:45:30 AM</acquisition_end>\n\
                <acquisition_end>14-Jan-21 10:45:30 AM</acquisition_end>\n\
                <Scan_Type>VorteX continuous</Scan_Type>\n\
                <Scan_Type>VorteX continuous</Scan_Type>\n\
                <Project_Folder>D:\\scans\\Session_7</Project_Folder>\n\
                <Project_Folder>D:\\scans\\Session_7</Project_Folder>\n\
                <Volume>\n<resolution>1024 768 900</resolution>\n</Volume>\n\
                <Volume>\n<resolution>1024 768 900</resolution>\n</Volume>";
    let record = assemble(Path::new("repeated.nsipro"), text).unwrap();

    assert_eq!(
        field(&record, &["acquisition_begin"]),
        &Value::Timestamp(ts(2021, 1, 14, 9, 58, 12))
    );
    assert_eq!(
        field(&record, &["acquisition_end"]),
        &Value::Timestamp(ts(2021, 1, 14, 10, 45, 30))
    );
    assert_eq!(field(&record, &["acquisition_duration"]), &Value::Float(2838.0));
    assert_eq!(
        field(&record, &["scan_type_category"]),
        &Value::Str("VorteX".to_string())
    );
    assert_eq!(
        field(&record, &["session_name"]),
        &Value::Str("Session_7".to_string())
    );
    assert_eq!(field(&record, &["dimensions", "width"]), &Value::Int(1024));
    assert_eq!(field(&record, &["dimensions", "height"]), &Value::Int(900));
}

#[test]
fn test_scan_type_and_end_from_comment() {
    let record = assemble(
        Path::new("d.nsipro"),
        "<Comments>Standard scan completed 14-Jan-21 10:05:00 AM</Comments>",
    )
    .unwrap();
    assert_eq!(field(&record, &["scan_type"]), &Value::Str("Standard".to_string()));
    assert_eq!(
        field(&record, &["scan_type_category"]),
        &Value::Str("Standard".to_string())
    );
    assert_eq!(
        field(&record, &["acquisition_end"]),
        &Value::Timestamp(ts(2021, 1, 14, 10, 5, 0))
    );
}

#[test]
fn test_slice_thickness_estimate() {
    let text = "<NSI Reconstruction Project>\n<CT Project Configuration>\n\
                <Technique Configuration>\n<Setup>\n\
                <source to detector distance>500\n<source to table distance>300\n\
                </Setup>\n<Ug>\n<det pitch>2\n</Ug>\n</Technique Configuration>\n\
                </CT Project Configuration>\n</NSI Reconstruction Project>";
    let record = assemble(Path::new("e.nsipro"), text).unwrap();
    let thickness = field(&record, &["estimated_slicethickness"]).as_f64().unwrap();
    assert!((thickness - 1.2).abs() < 1e-12);

    let without_pitch = text.replace("<det pitch>2\n", "");
    let record = assemble(Path::new("e.nsipro"), &without_pitch).unwrap();
    assert!(field(&record, &["estimated_slicethickness"]).is_null());
}

#[test]
fn test_full_vortex_document() {
    let record = assemble(Path::new("/scans/vortex.nsipro"), VORTEX_SCAN).unwrap();

    assert_eq!(
        field(&record, &["nsipro_filepath"]),
        &Value::Str("/scans/vortex.nsipro".to_string())
    );
    assert_eq!(field(&record, &["acquisition_duration"]), &Value::Float(2730.0));
    assert_eq!(
        field(&record, &["session_name"]),
        &Value::Str("Maize_Session_04".to_string())
    );
    assert_eq!(field(&record, &["source_to_detector_distance"]), &Value::Float(500.0));
    assert_eq!(field(&record, &["dimensions", "width"]), &Value::Int(1024));
    assert_eq!(field(&record, &["dimensions", "height"]), &Value::Int(900));
    assert_eq!(field(&record, &["dimensions", "depth"]), &Value::Int(768));
    assert_eq!(field(&record, &["source", "voltage", "actual"]), &Value::Float(159.8));
    assert_eq!(field(&record, &["detector", "framerate"]), &Value::Float(12.5));
    assert_eq!(field(&record, &["calculated_Ug"]), &Value::Float(12.5));
    assert_eq!(field(&record, &["zoom_factor"]), &Value::Float(1.667));
    assert_eq!(field(&record, &["projections"]), &Value::Int(1800));
    assert_eq!(field(&record, &["defective_pixels"]), &Value::Int(37));
    assert_eq!(field(&record, &["filter"]), &Value::Str("0.5 mm Cu".to_string()));
}

#[test]
fn test_full_legacy_document() {
    let record = assemble(Path::new("legacy.nsipro"), LEGACY_HELICAL).unwrap();

    assert_eq!(
        field(&record, &["acquisition_begin"]),
        &Value::Timestamp(ts(2018, 3, 22, 8, 15, 0))
    );
    assert_eq!(
        field(&record, &["acquisition_end"]),
        &Value::Timestamp(ts(2018, 3, 22, 9, 5, 30))
    );
    assert_eq!(field(&record, &["acquisition_duration"]), &Value::Float(3030.0));
    assert_eq!(
        field(&record, &["scan_type_category"]),
        &Value::Str("Helical".to_string())
    );
    assert_eq!(field(&record, &["calculated_Ug"]), &Value::Float(0.08));
    assert!(field(&record, &["estimated_slicethickness"]).is_null());
    assert!(field(&record, &["dimensions"]).is_null());
    assert!(field(&record, &["source", "voltage", "actual"]).is_null());
    assert!(field(&record, &["filter"]).is_null());
}

#[test]
fn test_record_serializes_to_json() {
    let record = assemble(Path::new("vortex.nsipro"), VORTEX_SCAN).unwrap();
    let json: serde_json::Value = serde_json::to_value(&record).unwrap();

    let derived = &json["derived_fields"];
    assert_eq!(derived["acquisition_begin"], "2021-01-14T10:00:00");
    assert_eq!(derived["dimensions"]["xyz"], serde_json::json!([1024, 900, 768]));
    assert_eq!(derived["source"]["current"]["reported"], 62.0);
    assert!(derived["rotations"].is_number());

    let project = &json["NSI_Reconstruction_Project"];
    assert_eq!(project["CT_Project_Configuration"]["Part_name"], "ABC123");
    assert_eq!(
        project["Status"]["status"],
        serde_json::json!(["Detector ok", "37 defective pixels corrected"])
    );
}

#[test]
fn test_records_tabulate_over_column_union() {
    let vortex = assemble(Path::new("v.nsipro"), VORTEX_SCAN).unwrap();
    let legacy = assemble(Path::new("l.nsipro"), LEGACY_HELICAL).unwrap();

    let rows = vec![flatten_record(&vortex, "."), flatten_record(&legacy, ".")];
    let df = records_to_dataframe(&rows).unwrap();

    assert_eq!(df.height(), 2);
    let volume = df
        .column("NSI_Reconstruction_Project.Volume.resolution")
        .unwrap();
    assert_eq!(volume.null_count(), 1);
    assert!(df.column("derived_fields.session_name").is_ok());
}

#[test]
fn test_malformed_document_fails_with_path() {
    let err = assemble(Path::new("bad.nsipro"), "<Setup>\n<kV>160\n</Source>").unwrap_err();
    assert!(matches!(err, NsiproError::Parse { .. }));
    assert!(err.to_string().contains("bad.nsipro"));
}
