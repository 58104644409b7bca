//! Repair of NSIPRO quasi-XML into well-formed markup.
//!
//! NSI software writes one tag per line, frequently omits closing tags for
//! scalar leaves, puts spaces inside tag names and leaves some tags bare when
//! they have no value. The rules below are applied in a fixed order; each
//! one assumes the previous ones already ran.

use crate::constants::NULL_VALUE_TAGS;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// A `(<number> pixels)` fragment that the scanner pushed onto its own line
static PIXELS_CONTINUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)[ \t]*\r?\n\s*(?P<fragment>\(\S+\s+pixels\))[ \t]*\r?$")
        .expect("valid continuation pattern")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]+>").expect("valid tag pattern"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// `<tag>value` with nothing after the value
static OPEN_TAG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<(?P<tag>[^/>][^>]*)>(?P<value>[^<]+)$").expect("valid open tag pattern")
});

static NULL_VALUE_TAG_LINE: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = NULL_VALUE_TAGS.iter().map(|t| regex::escape(t)).collect();
    Regex::new(&format!(r"^<(?P<tag>{})>$", alternatives.join("|")))
        .expect("valid null tag pattern")
});

/// Rewrite raw NSIPRO text into markup a standard XML parser accepts.
///
/// Never fails. Lines that match none of the repair rules are passed
/// through unchanged, so anything still malformed surfaces in the tree
/// builder.
pub fn normalize(text: &str) -> String {
    let folded = fold_continuation_lines(text);

    folded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let line = squeeze_tag_whitespace(line);
            let line = close_single_line_tag(&line);
            complete_null_value_tag(&line).into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn fold_continuation_lines(text: &str) -> Cow<'_, str> {
    PIXELS_CONTINUATION.replace_all(text, " ${fragment}")
}

/// `<Part name>` becomes `<Part_name>`
fn squeeze_tag_whitespace(line: &str) -> Cow<'_, str> {
    TAG.replace_all(line, |caps: &Captures| {
        WHITESPACE.replace_all(&caps[0], "_").into_owned()
    })
}

fn close_single_line_tag(line: &str) -> Cow<'_, str> {
    OPEN_TAG_LINE.replace(line, "<${tag}>${value}</${tag}>")
}

fn complete_null_value_tag(line: &str) -> Cow<'_, str> {
    NULL_VALUE_TAG_LINE.replace(line, "<${tag}></${tag}>")
}
