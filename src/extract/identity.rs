//! Identifiers and classification: session, part, software version and
//! scan technique.

use super::{first_present, text_values};
use crate::constants::{LEGACY_SCAN_CATEGORY, SCAN_CATEGORIES, STANDARD_SCAN_CATEGORY};
use crate::models::{ParseTree, Value};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Leading phrase of a legacy completion note: `<scan type> scan completed ...`
static SCAN_TYPE_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?P<scan_type>.*) scan completed .*$").expect("valid scan type pattern")
});

/// Scan technique as recorded, plus the technique family it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanType {
    pub name: String,
    pub category: String,
}

impl ScanType {
    fn classify(name: String, categories: &[&str]) -> Self {
        let category = categories
            .iter()
            .find(|candidate| name.contains(*candidate))
            .copied()
            .unwrap_or(STANDARD_SCAN_CATEGORY)
            .to_string();
        Self { name, category }
    }
}

/// NSI project folder name (the scan session)
///
/// Newer files use `Project_Folder`, older ones `Project_folder`. Only the
/// last path segment is kept, whatever the path separator.
pub fn session_name(tree: &ParseTree) -> Option<String> {
    let folder = first_present(&["Project_Folder", "Project_folder"], tree)?.scalar_text()?;
    let folder = folder.replace('\\', "/");
    folder
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Part name entered by the technician. Keeps its parsed type.
pub fn uid(tree: &ParseTree) -> Option<Value> {
    first_present(&["Part_name", "Part_Name"], tree).cloned()
}

pub fn acquisition_software_version(tree: &ParseTree) -> Option<Value> {
    first_present(&["Acquisition_Software"], tree).cloned()
}

/// Scan type and category.
///
/// `Scan_Type` is authoritative when present. Older software only wrote the
/// type into a completion comment, where `Helical` is also recognised.
/// Returns `None` when neither source exists.
pub fn scan_type(tree: &ParseTree) -> Option<ScanType> {
    if let Some(name) = first_present(&["Scan_Type"], tree).and_then(Value::scalar_text) {
        return Some(ScanType::classify(name, SCAN_CATEGORIES));
    }

    let from_comment = text_values("Comments", tree).into_iter().find_map(|comment| {
        SCAN_TYPE_COMMENT
            .captures(comment)
            .and_then(|caps| caps.name("scan_type"))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    });

    match from_comment {
        Some(name) => {
            let categories: Vec<&str> = SCAN_CATEGORIES
                .iter()
                .copied()
                .chain(std::iter::once(LEGACY_SCAN_CATEGORY))
                .collect();
            Some(ScanType::classify(name, &categories))
        }
        None => {
            debug!("No Scan_Type field or completion comment found");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures::{LEGACY_HELICAL, VORTEX_SCAN, parse};

    #[test]
    fn test_session_name_from_windows_path() {
        assert_eq!(
            session_name(&parse(VORTEX_SCAN)),
            Some("Maize_Session_04".to_string())
        );
    }

    #[test]
    fn test_session_name_legacy_key_with_trailing_separator() {
        assert_eq!(
            session_name(&parse(LEGACY_HELICAL)),
            Some("root_crowns".to_string())
        );
    }

    #[test]
    fn test_session_name_posix_path() {
        let tree = parse("<Project_Folder>/data/scans/session_9</Project_Folder>");
        assert_eq!(session_name(&tree), Some("session_9".to_string()));
        assert_eq!(session_name(&parse("<Other>1</Other>")), None);
    }

    #[test]
    fn test_uid_and_case_variant() {
        assert_eq!(uid(&parse(VORTEX_SCAN)), Some(Value::Str("ABC123".to_string())));
        assert_eq!(
            uid(&parse(LEGACY_HELICAL)),
            Some(Value::Str("RC-0042".to_string()))
        );
    }

    #[test]
    fn test_numeric_uid_keeps_type() {
        assert_eq!(uid(&parse("<Part_name>20417</Part_name>")), Some(Value::Int(20417)));
    }

    #[test]
    fn test_repeated_identity_tags_resolve_to_scalars() {
        let tree = parse(
            "<Project_Folder>D:\\scans\\Session_7</Project_Folder>\n\
             <Project_Folder>D:\\scans\\Session_7</Project_Folder>\n\
             <Part_name>A</Part_name>\n\
             <Part_name>A</Part_name>\n\
             <Acquisition_Software>3.2.1</Acquisition_Software>\n\
             <Acquisition_Software>3.2.1</Acquisition_Software>",
        );
        assert_eq!(session_name(&tree), Some("Session_7".to_string()));
        assert_eq!(uid(&tree), Some(Value::Str("A".to_string())));
        assert_eq!(
            acquisition_software_version(&tree),
            Some(Value::Str("3.2.1".to_string()))
        );
    }

    #[test]
    fn test_software_version() {
        assert_eq!(
            acquisition_software_version(&parse(VORTEX_SCAN)),
            Some(Value::Str("3.2.1".to_string()))
        );
    }

    #[test]
    fn test_explicit_scan_type() {
        let tree = parse("<Scan_Type>VorteX continuous</Scan_Type>");
        assert_eq!(
            scan_type(&tree),
            Some(ScanType {
                name: "VorteX continuous".to_string(),
                category: "VorteX".to_string(),
            })
        );
    }

    #[test]
    fn test_repeated_scan_type_tag() {
        let tree = parse(
            "<Scan_Type>VorteX continuous</Scan_Type>\n<Scan_Type>VorteX continuous</Scan_Type>",
        );
        let found = scan_type(&tree).unwrap();
        assert_eq!(found.name, "VorteX continuous");
        assert_eq!(found.category, "VorteX");
    }

    #[test]
    fn test_explicit_scan_type_without_technique_is_standard() {
        let tree = parse("<Scan_Type>Step and shoot</Scan_Type>");
        assert_eq!(scan_type(&tree).unwrap().category, "Standard");
    }

    #[test]
    fn test_helical_only_recognised_in_comments() {
        let tree = parse("<Scan_Type>Helical</Scan_Type>");
        assert_eq!(scan_type(&tree).unwrap().category, "Standard");

        let legacy = scan_type(&parse(LEGACY_HELICAL)).unwrap();
        assert_eq!(legacy.name, "Helical");
        assert_eq!(legacy.category, "Helical");
    }

    #[test]
    fn test_standard_scan_from_comment() {
        let tree = parse("<Comments>Standard scan completed 14-Jan-21 10:05:00 AM</Comments>");
        assert_eq!(
            scan_type(&tree),
            Some(ScanType {
                name: "Standard".to_string(),
                category: "Standard".to_string(),
            })
        );
    }

    #[test]
    fn test_mosaix_from_comment() {
        let tree = parse("<Comments>MosaiX 2x2 scan completed 14-Jan-21 10:05:00 AM</Comments>");
        assert_eq!(scan_type(&tree).unwrap().category, "MosaiX");
    }

    #[test]
    fn test_no_evidence_is_none() {
        assert_eq!(scan_type(&parse("<Comments>operator notes</Comments>")), None);
        assert_eq!(scan_type(&parse("<Part_name>A</Part_name>")), None);
    }
}
