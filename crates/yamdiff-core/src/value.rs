//! The labelled value tree shared by both diff engines
//!
//! Every node carries the 1-based line it started on in its source
//! text; mapping entries additionally remember the line of their key
//! token. Equality is structural and ignores all line information, and
//! mapping equality ignores entry order.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt::Write as _;

/// A value together with its source line
#[derive(Debug, Clone)]
pub struct Node {
    /// 1-based line of the node in its source text
    pub line: usize,
    pub value: Value,
}

/// A parsed YAML value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Node>),
    Map(Mapping),
}

/// A mapping value of a [`Mapping`] entry, with the line of its key token
#[derive(Debug, Clone)]
pub struct MapEntry {
    /// 1-based line of the key token
    pub key_line: usize,
    pub node: Node,
}

/// Insertion-ordered mapping
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: IndexMap<String, MapEntry>,
}

/// Coarse tag classes used for TYPE_CHANGED decisions
///
/// Int and Float share the number class: `1 -> 1.5` is a value change,
/// `1 -> "1"` is a type change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Null,
    Bool,
    Number,
    String,
    Sequence,
    Mapping,
}

impl Node {
    pub fn new(line: usize, value: Value) -> Self {
        Self { line, value }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .all(|(key, entry)| other.get(key) == Some(&entry.node))
    }
}

impl Mapping {
    pub fn insert(&mut self, key: String, key_line: usize, node: Node) {
        self.entries.insert(key, MapEntry { key_line, node });
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key).map(|e| &e.node)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key).map(|e| &mut e.node)
    }

    /// Remove an entry, preserving the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<MapEntry> {
        self.entries.shift_remove(key)
    }

    pub fn key_line(&self, key: &str) -> Option<usize> {
        self.entries.get(key).map(|e| e.key_line)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Value {
    /// Tag class for type-change classification
    pub fn tag(&self) -> TagClass {
        match self {
            Value::Null => TagClass::Null,
            Value::Bool(_) => TagClass::Bool,
            Value::Int(_) | Value::Float(_) => TagClass::Number,
            Value::Str(_) => TagClass::String,
            Value::Seq(_) => TagClass::Sequence,
            Value::Map(_) => TagClass::Mapping,
        }
    }

    /// Human-readable name of the tag class
    pub fn type_name(&self) -> &'static str {
        match self.tag() {
            TagClass::Null => "null",
            TagClass::Bool => "bool",
            TagClass::Number => "number",
            TagClass::String => "string",
            TagClass::Sequence => "sequence",
            TagClass::Mapping => "mapping",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Seq(_) | Value::Map(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Node]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Printed form of a scalar; `None` for containers
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::Seq(_) | Value::Map(_) => None,
        }
    }

    /// Canonical textual projection: the printed form for scalars, a
    /// stable JSON-like serialisation (insertion order) for containers.
    pub fn projection(&self) -> String {
        match self.scalar_text() {
            Some(text) => text,
            None => {
                let mut out = String::new();
                write_json_like(self, &mut out);
                out
            }
        }
    }

    /// Whether this value carries enough content to participate in
    /// similarity-based move matching. Scalars qualify when their
    /// printed form is non-empty after whitespace trim (`Null` never
    /// does); containers qualify when any descendant scalar does.
    pub fn has_move_content(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => true,
            Value::Str(s) => !s.trim().is_empty(),
            Value::Seq(items) => items.iter().any(|n| n.value.has_move_content()),
            Value::Map(map) => map.iter().any(|(_, e)| e.node.value.has_move_content()),
        }
    }
}

fn write_json_like(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => {
            let _ = write!(out, "{f}");
        }
        Value::Str(s) => {
            let _ = write!(out, "{s:?}");
        }
        Value::Seq(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_json_like(&item.value, out);
            }
            out.push(']');
        }
        Value::Map(map) => {
            out.push('{');
            for (i, (key, entry)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{key:?}: ");
                write_json_like(&entry.node.value, out);
            }
            out.push('}');
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Str(s) => serializer.serialize_str(s),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, entry) in map.iter() {
                    out.serialize_entry(key, &entry.node)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(value: Value) -> Node {
        Node::new(1, value)
    }

    fn map_of(pairs: &[(&str, Value)]) -> Value {
        let mut map = Mapping::default();
        for (k, v) in pairs {
            map.insert(k.to_string(), 1, node(v.clone()));
        }
        Value::Map(map)
    }

    #[test]
    fn test_equality_ignores_lines() {
        let a = Node::new(3, Value::Str("x".into()));
        let b = Node::new(17, Value::Str("x".into()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_mapping_equality_ignores_order() {
        let a = map_of(&[("x", Value::Int(1)), ("y", Value::Int(2))]);
        let b = map_of(&[("y", Value::Int(2)), ("x", Value::Int(1))]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_mapping_inequality_on_value() {
        let a = map_of(&[("x", Value::Int(1))]);
        let b = map_of(&[("x", Value::Int(2))]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_tag_classes() {
        assert_eq!(Value::Int(1).tag(), Value::Float(1.5).tag());
        assert_ne!(Value::Int(1).tag(), Value::Str("1".into()).tag());
        assert_eq!(Value::Null.type_name(), "null");
    }

    #[test]
    fn test_projection_scalars() {
        assert_eq!(Value::Str("web server".into()).projection(), "web server");
        assert_eq!(Value::Int(42).projection(), "42");
        assert_eq!(Value::Bool(true).projection(), "true");
        assert_eq!(Value::Null.projection(), "null");
    }

    #[test]
    fn test_projection_containers() {
        let value = map_of(&[
            ("name", Value::Str("web".into())),
            ("ports", Value::Seq(vec![node(Value::Int(80)), node(Value::Int(443))])),
        ]);
        assert_eq!(value.projection(), r#"{"name": "web", "ports": [80, 443]}"#);
    }

    #[test]
    fn test_move_content() {
        assert!(!Value::Null.has_move_content());
        assert!(!Value::Str("   ".into()).has_move_content());
        assert!(Value::Int(0).has_move_content());
        assert!(!map_of(&[("a", Value::Str(String::new()))]).has_move_content());
        assert!(map_of(&[("a", Value::Str("x".into()))]).has_move_content());
        assert!(!Value::Map(Mapping::default()).has_move_content());
    }

    #[test]
    fn test_serialize_preserves_order() {
        let value = map_of(&[("z", Value::Int(1)), ("a", Value::Int(2))]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"z":1,"a":2}"#);
    }
}
