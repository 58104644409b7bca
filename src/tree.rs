//! Typed tree construction from repaired NSIPRO markup.
//!
//! Elements become nested [`ParseTree`]s, attributes are merged into their
//! element, and every text leaf is coerced to the narrowest scalar type it
//! fits (integer, float, boolean, timestamp, else string). Repeated tags are
//! first gathered into sequences; a final pass collapses the singletons.

use crate::constants::{DATETIME_FORMATS, TEXT_KEY};
use crate::error::{NsiproError, Result};
use crate::models::{ParseTree, Timestamp, Value};
use chrono::NaiveDateTime;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::trace;

/// Parse markup into a typed tree.
///
/// The markup may hold several top-level elements; the returned tree is the
/// implicit document root that contains all of them.
pub fn build(markup: &str) -> Result<ParseTree> {
    let raw = parse_markup(markup)?;
    Ok(flatten_singletons(raw))
}

/// Element under construction. Children are kept as lists until the
/// flattening pass decides which of them are really singletons.
#[derive(Debug)]
struct Node {
    name: String,
    children: Vec<(String, Vec<Value>)>,
    text: String,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Vec::new(),
            text: String::new(),
        }
    }

    fn from_start(start: &BytesStart) -> Result<Self> {
        let mut node = Node::new(decode_name(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| NsiproError::markup(format!("invalid attribute: {}", e)))?;
            let key = decode_name(attr.key.as_ref());
            let value = attr
                .unescape_value()
                .map_err(|e| NsiproError::markup(e.to_string()))?;
            node.push_child(key, coerce_scalar(value.trim()));
        }
        Ok(node)
    }

    fn push_child(&mut self, key: String, value: Value) {
        match self.children.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.children.push((key, vec![value])),
        }
    }

    fn into_tree(self) -> ParseTree {
        let text = self.text.trim().to_string();
        let mut tree: ParseTree = self
            .children
            .into_iter()
            .map(|(key, values)| (key, Value::Seq(values)))
            .collect();
        if !text.is_empty() {
            tree.insert(TEXT_KEY, coerce_scalar(&text));
        }
        tree
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() {
            coerce_scalar(self.text.trim())
        } else {
            Value::Tree(self.into_tree())
        }
    }
}

fn decode_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_markup(markup: &str) -> Result<ParseTree> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Node::new(String::new())];

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                stack.push(Node::from_start(e)?);
            }
            Event::Empty(ref e) => {
                let node = Node::from_start(e)?;
                attach(&mut stack, node)?;
            }
            Event::End(ref e) => {
                let name = decode_name(e.name().as_ref());
                if stack.len() < 2 {
                    return Err(NsiproError::markup(format!(
                        "closing tag </{}> without matching opening tag",
                        name
                    )));
                }
                let node = stack
                    .pop()
                    .ok_or_else(|| NsiproError::markup("element stack underflow"))?;
                if node.name != name {
                    return Err(NsiproError::markup(format!(
                        "expected </{}>, found </{}>",
                        node.name, name
                    )));
                }
                attach(&mut stack, node)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|e| NsiproError::markup(e.to_string()))?;
                current(&mut stack)?.text.push_str(&text);
            }
            Event::CData(e) => {
                let text = e.into_inner();
                current(&mut stack)?
                    .text
                    .push_str(&String::from_utf8_lossy(&text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let unclosed: Vec<&str> = stack[1..].iter().map(|n| n.name.as_str()).collect();
        return Err(NsiproError::markup(format!(
            "unclosed element(s) at end of document: <{}>",
            unclosed.join(">, <")
        )));
    }

    let root = stack
        .pop()
        .ok_or_else(|| NsiproError::markup("element stack underflow"))?;
    Ok(root.into_tree())
}

fn current(stack: &mut [Node]) -> Result<&mut Node> {
    stack
        .last_mut()
        .ok_or_else(|| NsiproError::markup("element stack underflow"))
}

fn attach(stack: &mut [Node], node: Node) -> Result<()> {
    let name = node.name.clone();
    let value = node.into_value();
    current(stack)?.push_child(name, value);
    Ok(())
}

/// Coerce a text leaf to the narrowest scalar it represents
pub fn coerce_scalar(text: &str) -> Value {
    if let Some(number) = parse_number(text) {
        return number;
    }
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Some(ts) = parse_timestamp(text) {
        return Value::Timestamp(ts);
    }
    Value::Str(text.to_string())
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Int(i));
    }
    // f64's parser also accepts "inf" and "NaN", which are words here
    if !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}

/// Try each known NSI datetime format in order; first match wins
pub fn parse_timestamp(text: &str) -> Option<Timestamp> {
    DATETIME_FORMATS.iter().find_map(|format| {
        let parsed = NaiveDateTime::parse_from_str(text, format).ok();
        if parsed.is_some() {
            trace!("Parsed '{}' as timestamp with format '{}'", text, format);
        }
        parsed
    })
}

/// Collapse every single-element sequence into its element.
///
/// Runs once per level: a collapsed value is not re-collapsed, but its own
/// children are visited. Keys are never touched.
pub fn flatten_singletons(tree: ParseTree) -> ParseTree {
    tree.into_iter()
        .map(|(key, value)| (key, flatten_value(value)))
        .collect()
}

fn flatten_value(value: Value) -> Value {
    match value {
        Value::Seq(items) => match <[Value; 1]>::try_from(items) {
            Ok([only]) => descend(only),
            Err(items) => descend(Value::Seq(items)),
        },
        other => descend(other),
    }
}

fn descend(value: Value) -> Value {
    match value {
        Value::Tree(tree) => Value::Tree(flatten_singletons(tree)),
        Value::Seq(items) => Value::Seq(items.into_iter().map(flatten_value).collect()),
        scalar => scalar,
    }
}
