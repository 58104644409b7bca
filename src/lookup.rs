//! Schema-free key resolution over a parse tree.
//!
//! NSIPRO layouts drift between software versions, so a field can live at
//! any depth and may be reported more than once. [`lookup`] finds every
//! occurrence and reports how many distinct values it saw; each caller
//! decides what multiplicity means for its field.

use crate::models::{ParseTree, Value};
use tracing::{debug, warn};

/// Outcome of a deep key search
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    /// The key does not occur anywhere in the tree
    Missing,
    /// Every occurrence holds the same value
    Unique(&'a Value),
    /// Distinct values were found; all occurrences, in document order
    Ambiguous(Vec<&'a Value>),
}

impl<'a> Lookup<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }

    /// The value if it is unambiguous
    pub fn unique(&self) -> Option<&'a Value> {
        match self {
            Lookup::Unique(value) => Some(*value),
            _ => None,
        }
    }

    /// Short description for logs: the outcome and how many values it holds
    pub fn shape(&self) -> String {
        match self {
            Lookup::Missing => "missing".to_string(),
            Lookup::Unique(value) => format!("unique {}", value.kind()),
            Lookup::Ambiguous(values) => format!("ambiguous, {} values", values.len()),
        }
    }

    /// Every occurrence in document order (a unique value counts once)
    pub fn values(&self) -> Vec<&'a Value> {
        match self {
            Lookup::Missing => Vec::new(),
            Lookup::Unique(value) => vec![*value],
            Lookup::Ambiguous(values) => values.clone(),
        }
    }

    /// First occurrence in document order. Ambiguity is logged, not hidden.
    pub fn first(&self, key: &str) -> Option<&'a Value> {
        match self {
            Lookup::Missing => None,
            Lookup::Unique(value) => Some(*value),
            Lookup::Ambiguous(values) => {
                warn!(
                    "'{}' has {} conflicting values; using the first",
                    key,
                    values.len()
                );
                values.first().copied()
            }
        }
    }
}

/// Find every occurrence of `key` at any depth of `tree`.
///
/// The search is pre-order and also descends into sequences and into the
/// matched values themselves. Matches are de-duplicated by value equality
/// only to decide between [`Lookup::Unique`] and [`Lookup::Ambiguous`].
pub fn lookup<'a>(key: &str, tree: &'a ParseTree) -> Lookup<'a> {
    let mut matches = Vec::new();
    collect_matches(key, tree, &mut matches);

    let mut distinct: Vec<&Value> = Vec::new();
    for value in &matches {
        if !distinct.contains(value) {
            distinct.push(*value);
        }
    }

    let result = match distinct.as_slice() {
        [] => Lookup::Missing,
        [only] => Lookup::Unique(*only),
        _ => Lookup::Ambiguous(matches),
    };
    debug!("Lookup '{}': {}", key, result.shape());
    result
}

/// Try candidate key names in order; the first one present wins.
///
/// Used for case variants and renamed keys (`Part_name` / `Part_Name`).
pub fn lookup_any<'a>(keys: &[&str], tree: &'a ParseTree) -> Lookup<'a> {
    keys.iter()
        .map(|key| lookup(key, tree))
        .find(|found| !found.is_missing())
        .unwrap_or(Lookup::Missing)
}

/// Descend a fixed key path. Every intermediate step must be a subtree.
pub fn get_path<'a>(tree: &'a ParseTree, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut node = tree;
    for key in parents {
        node = node.get(key)?.as_tree()?;
    }
    node.get(last)
}

/// Every distinct key at every depth, in first-seen order
pub fn all_keys(tree: &ParseTree) -> Vec<&str> {
    let mut keys = Vec::new();
    collect_keys(tree, &mut keys);
    keys
}

fn collect_matches<'a>(key: &str, tree: &'a ParseTree, out: &mut Vec<&'a Value>) {
    for (k, value) in tree.iter() {
        if k == key {
            out.push(value);
        }
        collect_in_value(key, value, out);
    }
}

fn collect_in_value<'a>(key: &str, value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Tree(tree) => collect_matches(key, tree, out),
        Value::Seq(items) => {
            for item in items {
                collect_in_value(key, item, out);
            }
        }
        _ => {}
    }
}

fn collect_keys<'a>(tree: &'a ParseTree, keys: &mut Vec<&'a str>) {
    for (key, value) in tree.iter() {
        if !keys.contains(&key) {
            keys.push(key);
        }
        collect_keys_in_value(value, keys);
    }
}

fn collect_keys_in_value<'a>(value: &'a Value, keys: &mut Vec<&'a str>) {
    match value {
        Value::Tree(tree) => collect_keys(tree, keys),
        Value::Seq(items) => {
            for item in items {
                collect_keys_in_value(item, keys);
            }
        }
        _ => {}
    }
}
