//! Tabular export of assembled records.
//!
//! Each record becomes one row: nested keys are joined into column names
//! and every cell is rendered as text. A batch of rows becomes a polars
//! [`DataFrame`] over the union of their columns.

use crate::error::Result;
use crate::models::{ParseTree, Value};
use polars::prelude::{Column, DataFrame};
use std::collections::HashMap;

/// One flattened record: `(column, cell)` in document order
pub type Row = Vec<(String, Option<String>)>;

/// Flatten a record into a single row.
///
/// Nested trees contribute `parent<separator>child` columns. Sequences are
/// kept in one cell as a JSON array. Nulls become empty cells.
pub fn flatten_record(tree: &ParseTree, separator: &str) -> Row {
    let mut row = Row::new();
    flatten_into(tree, None, separator, &mut row);
    row
}

fn flatten_into(tree: &ParseTree, prefix: Option<&str>, separator: &str, row: &mut Row) {
    for (key, value) in tree.iter() {
        let column = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, separator, key),
            None => key.to_string(),
        };
        match value {
            Value::Tree(child) => flatten_into(child, Some(&column), separator, row),
            Value::Seq(_) => {
                let cell = serde_json::to_string(value).ok();
                row.push((column, cell));
            }
            other => row.push((column, other.scalar_text())),
        }
    }
}

/// Build a string-typed frame from flattened rows.
///
/// Columns appear in the order they are first seen; a row without a
/// column gets a null cell.
pub fn records_to_dataframe(rows: &[Row]) -> Result<DataFrame> {
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        for (name, _) in row {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }

    let lookups: Vec<HashMap<&str, Option<&str>>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|(name, cell)| (name.as_str(), cell.as_deref()))
                .collect()
        })
        .collect();

    let columns: Vec<Column> = names
        .iter()
        .map(|name| {
            let cells: Vec<Option<String>> = lookups
                .iter()
                .map(|row| row.get(name).copied().flatten().map(str::to_string))
                .collect();
            Column::new((*name).into(), cells)
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::build;

    #[test]
    fn test_nested_keys_joined_with_separator() {
        let tree = build("<a>\n<b>1</b>\n<c>\n<d>x</d>\n</c>\n</a>").unwrap();
        let row = flatten_record(&tree, ".");
        assert_eq!(
            row,
            vec![
                ("a.b".to_string(), Some("1".to_string())),
                ("a.c.d".to_string(), Some("x".to_string())),
            ]
        );

        let row = flatten_record(&tree, "/");
        assert_eq!(row[1].0, "a/c/d");
    }

    #[test]
    fn test_sequences_render_as_json_and_nulls_as_empty() {
        let mut tree = build("<c>one</c>\n<c>two</c>").unwrap();
        tree.insert("missing", Value::Null);
        let row = flatten_record(&tree, ".");
        assert_eq!(row[0], ("c".to_string(), Some(r#"["one","two"]"#.to_string())));
        assert_eq!(row[1], ("missing".to_string(), None));
    }

    #[test]
    fn test_column_union_keeps_first_seen_order() {
        let rows = vec![
            vec![
                ("a".to_string(), Some("1".to_string())),
                ("b".to_string(), Some("2".to_string())),
            ],
            vec![
                ("c".to_string(), Some("3".to_string())),
                ("a".to_string(), Some("4".to_string())),
            ],
        ];
        let df = records_to_dataframe(&rows).unwrap();

        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("b").unwrap().null_count(), 1);
        assert_eq!(df.column("c").unwrap().null_count(), 1);
    }

    #[test]
    fn test_no_rows_gives_empty_frame() {
        let df = records_to_dataframe(&[]).unwrap();
        assert_eq!(df.width(), 0);
        assert_eq!(df.height(), 0);
    }
}
