//! yamdiff Core - value model, parser, and document types
//!
//! This crate provides the foundations shared by the diff engines:
//! - `Node`/`Value`: the labelled value tree with per-node source lines
//! - `Path`: change locations inside a tree
//! - `parse`: marked YAML parsing
//! - `Document`/`Section` + `validate`: the legal document schema
//! - `IdentityRule`: sequence-item identity configuration

pub mod document;
pub mod error;
pub mod parser;
pub mod path;
pub mod rules;
pub mod value;

pub use document::{DocSource, DocType, DocVersion, Document, Section, validate};
pub use error::{CoreError, Result, ValidationErrorInfo};
pub use parser::parse;
pub use path::{Path, Step};
pub use rules::IdentityRule;
pub use value::{MapEntry, Mapping, Node, TagClass, Value};
