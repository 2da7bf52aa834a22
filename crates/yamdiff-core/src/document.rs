//! Legal document model and validation
//!
//! A legal document is a YAML mapping with a single `document` key whose
//! value carries the metadata fields and a tree of marker-labelled
//! sections. Validation is structural: every failure is reported with
//! the path of the offending field, and all failures are collected in
//! one pass. Sibling-marker uniqueness is a diff-engine precondition and
//! is checked there, not here.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::ValidationErrorInfo;
use crate::value::{Mapping, Node, Value};

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("id pattern is valid"));

/// Document category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Law,
    Regulation,
    Directive,
    Circular,
    Policy,
    Other,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Law => "law",
            DocType::Regulation => "regulation",
            DocType::Directive => "directive",
            DocType::Circular => "circular",
            DocType::Policy => "policy",
            DocType::Other => "other",
        }
    }

    fn from_str(text: &str) -> Option<Self> {
        match text {
            "law" => Some(DocType::Law),
            "regulation" => Some(DocType::Regulation),
            "directive" => Some(DocType::Directive),
            "circular" => Some(DocType::Circular),
            "policy" => Some(DocType::Policy),
            "other" => Some(DocType::Other),
            _ => None,
        }
    }
}

/// Document version descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocVersion {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Where the document text was fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocSource {
    pub url: String,
    pub fetched_at: String,
}

/// One marker-labelled section of a legal document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: String,
    pub marker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Section>,
    /// 1-based source line of the section mapping
    #[serde(skip)]
    pub line: usize,
}

/// A validated legal document
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub doc_type: DocType,
    pub language: String,
    pub version: DocVersion,
    pub source: DocSource,
    pub authors: Vec<String>,
    pub published_date: Option<String>,
    pub updated_date: Option<String>,
    pub sections: Vec<Section>,
    /// The parsed `document` mapping node, kept for metadata diffing
    /// and line attribution
    pub raw: Node,
}

impl Document {
    /// Total number of sections, children included
    pub fn section_count(&self) -> usize {
        fn count(sections: &[Section]) -> usize {
            sections.len() + sections.iter().map(|s| count(&s.children)).sum::<usize>()
        }
        count(&self.sections)
    }
}

/// Validate a parsed value as a legal document.
///
/// All schema failures are collected; an `Err` carries every issue
/// found, each with its field path.
pub fn validate(root: &Node) -> Result<Document, Vec<ValidationErrorInfo>> {
    let mut errors = Vec::new();

    let Some(root_map) = root.value.as_map() else {
        return Err(vec![ValidationErrorInfo::new(
            "document",
            "root must be a mapping with a 'document' key",
        )]);
    };
    let Some(doc_node) = root_map.get("document") else {
        return Err(vec![ValidationErrorInfo::new(
            "document",
            "missing required key 'document'",
        )]);
    };
    let Some(doc) = doc_node.value.as_map() else {
        return Err(vec![ValidationErrorInfo::new(
            "document",
            "'document' must be a mapping",
        )]);
    };

    let id = require_scalar(doc, "id", "document.id", &mut errors);
    if let Some(id) = &id {
        if !ID_PATTERN.is_match(id) {
            errors.push(ValidationErrorInfo::new(
                "document.id",
                "id must match [A-Za-z0-9_-]+",
            ));
        }
    }

    let title = require_scalar(doc, "title", "document.title", &mut errors);

    let doc_type = match require_scalar(doc, "type", "document.type", &mut errors) {
        Some(text) => match DocType::from_str(&text) {
            Some(t) => Some(t),
            None => {
                errors.push(ValidationErrorInfo::new(
                    "document.type",
                    format!(
                        "unknown type '{text}', expected one of: law, regulation, directive, circular, policy, other"
                    ),
                ));
                None
            }
        },
        None => None,
    };

    let language = match optional_scalar(doc, "language", "document.language", &mut errors) {
        Some(lang) if lang != "hebrew" => {
            errors.push(ValidationErrorInfo::new(
                "document.language",
                format!("unsupported language '{lang}', only 'hebrew' is supported"),
            ));
            lang
        }
        Some(lang) => lang,
        None => "hebrew".to_string(),
    };

    let version = validate_version(doc, &mut errors);
    let source = validate_source(doc, &mut errors);
    let authors = validate_authors(doc, &mut errors);
    let published_date = optional_scalar(doc, "published_date", "document.published_date", &mut errors);
    let updated_date = optional_scalar(doc, "updated_date", "document.updated_date", &mut errors);

    let sections = match doc.get("sections") {
        Some(node) => match node.value.as_seq() {
            Some(items) => validate_sections(items, "document.sections", &mut errors),
            None => {
                errors.push(ValidationErrorInfo::new(
                    "document.sections",
                    "'sections' must be a sequence",
                ));
                Vec::new()
            }
        },
        None => {
            errors.push(ValidationErrorInfo::new(
                "document.sections",
                "missing required key 'sections'",
            ));
            Vec::new()
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(Document {
        id: id.expect("validated"),
        title: title.expect("validated"),
        doc_type: doc_type.expect("validated"),
        language,
        version: version.expect("validated"),
        source: source.expect("validated"),
        authors,
        published_date,
        updated_date,
        sections,
        raw: doc_node.clone(),
    })
}

fn validate_version(doc: &Mapping, errors: &mut Vec<ValidationErrorInfo>) -> Option<DocVersion> {
    let Some(node) = doc.get("version") else {
        errors.push(ValidationErrorInfo::new(
            "document.version",
            "missing required key 'version'",
        ));
        return None;
    };
    let Some(map) = node.value.as_map() else {
        errors.push(ValidationErrorInfo::new(
            "document.version",
            "'version' must be a mapping",
        ));
        return None;
    };
    let number = require_scalar(map, "number", "document.version.number", errors)?;
    let description = optional_scalar(map, "description", "document.version.description", errors);
    Some(DocVersion {
        number,
        description,
    })
}

fn validate_source(doc: &Mapping, errors: &mut Vec<ValidationErrorInfo>) -> Option<DocSource> {
    let Some(node) = doc.get("source") else {
        errors.push(ValidationErrorInfo::new(
            "document.source",
            "missing required key 'source'",
        ));
        return None;
    };
    let Some(map) = node.value.as_map() else {
        errors.push(ValidationErrorInfo::new(
            "document.source",
            "'source' must be a mapping",
        ));
        return None;
    };
    let url = require_scalar(map, "url", "document.source.url", errors);
    let fetched_at = require_scalar(map, "fetched_at", "document.source.fetched_at", errors);
    Some(DocSource {
        url: url?,
        fetched_at: fetched_at?,
    })
}

fn validate_authors(doc: &Mapping, errors: &mut Vec<ValidationErrorInfo>) -> Vec<String> {
    let Some(node) = doc.get("authors") else {
        return Vec::new();
    };
    let Some(items) = node.value.as_seq() else {
        errors.push(ValidationErrorInfo::new(
            "document.authors",
            "'authors' must be a sequence of strings",
        ));
        return Vec::new();
    };
    let mut authors = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match item.value.scalar_text() {
            Some(text) => authors.push(text),
            None => errors.push(ValidationErrorInfo::new(
                format!("document.authors[{idx}]"),
                "author must be a string",
            )),
        }
    }
    authors
}

fn validate_sections(
    items: &[Node],
    path: &str,
    errors: &mut Vec<ValidationErrorInfo>,
) -> Vec<Section> {
    let mut sections = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{idx}]");
        let Some(map) = item.value.as_map() else {
            errors.push(ValidationErrorInfo::new(item_path, "section must be a mapping"));
            continue;
        };

        let id = require_scalar(map, "id", &format!("{item_path}.id"), errors);
        if let Some(id) = &id {
            if !ID_PATTERN.is_match(id) {
                errors.push(ValidationErrorInfo::new(
                    format!("{item_path}.id"),
                    "id must match [A-Za-z0-9_-]+",
                ));
            }
        }

        let marker = require_scalar(map, "marker", &format!("{item_path}.marker"), errors);
        if let Some(marker) = &marker {
            if marker.is_empty() {
                errors.push(ValidationErrorInfo::new(
                    format!("{item_path}.marker"),
                    "marker must not be empty",
                ));
            }
        }

        let title = optional_scalar(map, "title", &format!("{item_path}.title"), errors);
        let content = optional_scalar(map, "content", &format!("{item_path}.content"), errors);

        let children = match map.get("children") {
            Some(node) => match node.value.as_seq() {
                Some(children) => {
                    validate_sections(children, &format!("{item_path}.children"), errors)
                }
                None => {
                    errors.push(ValidationErrorInfo::new(
                        format!("{item_path}.children"),
                        "'children' must be a sequence",
                    ));
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let (Some(id), Some(marker)) = (id, marker) else {
            continue;
        };
        sections.push(Section {
            id,
            marker,
            title,
            content,
            children,
            line: item.line,
        });
    }
    sections
}

fn require_scalar(
    map: &Mapping,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorInfo>,
) -> Option<String> {
    match map.get(key) {
        Some(node) => match node.value.scalar_text() {
            Some(text) => Some(text),
            None => {
                errors.push(ValidationErrorInfo::new(
                    path,
                    format!("'{key}' must be a scalar, found {}", node.value.type_name()),
                ));
                None
            }
        },
        None => {
            errors.push(ValidationErrorInfo::new(
                path,
                format!("missing required key '{key}'"),
            ));
            None
        }
    }
}

fn optional_scalar(
    map: &Mapping,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorInfo>,
) -> Option<String> {
    let node = map.get(key)?;
    if matches!(node.value, Value::Null) {
        return None;
    }
    match node.value.scalar_text() {
        Some(text) => Some(text),
        None => {
            errors.push(ValidationErrorInfo::new(
                path,
                format!("'{key}' must be a scalar, found {}", node.value.type_name()),
            ));
            None
        }
    }
}
