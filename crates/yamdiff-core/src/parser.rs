//! Marked YAML parsing
//!
//! Builds the [`Node`] tree from a YAML text using the event parser, so
//! that every node and every mapping key keeps its 1-based source line.
//! Loading is safe: no tags are executed, aliases are resolved by
//! copying the anchored subtree.

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::{CoreError, Result};
use crate::value::{Mapping, Node, Value};

/// Parse a single YAML document into a labelled value tree.
///
/// Only the first document of a multi-document stream is loaded. An
/// empty input parses to `Null` on line 1.
pub fn parse(text: &str) -> Result<Node> {
    let mut builder = TreeBuilder::default();
    let mut parser = Parser::new_from_str(text);
    parser.load(&mut builder, false).map_err(|err| {
        let marker = *err.marker();
        CoreError::Parse {
            line: marker.line(),
            col: marker.col() + 1,
            message: err.to_string(),
        }
    })?;

    if let Some(err) = builder.error.take() {
        return Err(err);
    }

    Ok(builder
        .docs
        .into_iter()
        .next()
        .unwrap_or_else(|| Node::new(1, Value::Null)))
}

enum Frame {
    Seq {
        line: usize,
        aid: usize,
        items: Vec<Node>,
    },
    Map {
        line: usize,
        aid: usize,
        map: Mapping,
        pending_key: Option<(String, usize)>,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    docs: Vec<Node>,
    anchors: HashMap<usize, Node>,
    error: Option<CoreError>,
}

impl TreeBuilder {
    fn fail(&mut self, mark: Marker, message: &str) {
        if self.error.is_none() {
            self.error = Some(CoreError::Parse {
                line: mark.line(),
                col: mark.col() + 1,
                message: message.to_string(),
            });
        }
    }

    fn attach(&mut self, node: Node, mark: Marker) {
        match self.stack.last_mut() {
            None => self.docs.push(node),
            Some(Frame::Seq { items, .. }) => items.push(node),
            Some(Frame::Map {
                map, pending_key, ..
            }) => match pending_key.take() {
                None => match node.value.scalar_text() {
                    Some(key) => *pending_key = Some((key, mark.line())),
                    None => self.fail(mark, "non-scalar mapping keys are not supported"),
                },
                Some((key, key_line)) => map.insert(key, key_line, node),
            },
        }
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Scalar(text, style, aid, _) => {
                let node = Node::new(mark.line(), scalar_value(&text, style));
                if aid != 0 {
                    self.anchors.insert(aid, node.clone());
                }
                self.attach(node, mark);
            }
            Event::SequenceStart(aid, _) => self.stack.push(Frame::Seq {
                line: mark.line(),
                aid,
                items: Vec::new(),
            }),
            Event::SequenceEnd => {
                if let Some(Frame::Seq { line, aid, items }) = self.stack.pop() {
                    let node = Node::new(line, Value::Seq(items));
                    if aid != 0 {
                        self.anchors.insert(aid, node.clone());
                    }
                    self.attach(node, mark);
                }
            }
            Event::MappingStart(aid, _) => self.stack.push(Frame::Map {
                line: mark.line(),
                aid,
                map: Mapping::default(),
                pending_key: None,
            }),
            Event::MappingEnd => {
                if let Some(Frame::Map { line, aid, map, .. }) = self.stack.pop() {
                    let node = Node::new(line, Value::Map(map));
                    if aid != 0 {
                        self.anchors.insert(aid, node.clone());
                    }
                    self.attach(node, mark);
                }
            }
            Event::Alias(aid) => match self.anchors.get(&aid) {
                Some(anchored) => {
                    let node = anchored.clone();
                    self.attach(node, mark);
                }
                None => self.fail(mark, "alias references an unknown anchor"),
            },
            // Stream and document boundaries carry no tree content.
            _ => {}
        }
    }
}

/// Resolve the type of a scalar. Quoted and block scalars are always
/// strings; plain scalars go through the core-schema resolution.
fn scalar_value(text: &str, style: TScalarStyle) -> Value {
    if !matches!(style, TScalarStyle::Plain) {
        return Value::Str(text.to_string());
    }
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" => return Value::Bool(true),
        "false" | "False" | "FALSE" => return Value::Bool(false),
        ".inf" | "+.inf" | ".Inf" | "+.Inf" => return Value::Float(f64::INFINITY),
        "-.inf" | "-.Inf" => return Value::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Value::Float(f64::NAN),
        _ => {}
    }
    if let Some(hex) = text.strip_prefix("0x") {
        if let Ok(i) = i64::from_str_radix(hex, 16) {
            return Value::Int(i);
        }
    }
    if let Some(oct) = text.strip_prefix("0o") {
        if let Ok(i) = i64::from_str_radix(oct, 8) {
            return Value::Int(i);
        }
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Int(i);
    }
    if looks_numeric(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Str(text.to_string())
}

// Guards against Rust's float parser accepting words like "inf"/"nan".
fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '+' || c == '-' || c == '.')
        && text.chars().any(|c| c.is_ascii_digit())
}
