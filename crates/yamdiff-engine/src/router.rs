//! Mode routing
//!
//! Decides which engine a pair of documents goes to. An explicit mode
//! always wins; `auto` sniffs the root shape of both documents for the
//! legal-document layout.

use serde::Serialize;
use std::str::FromStr;
use yamdiff_core::{Node, Value};

/// Requested diff mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Auto,
    General,
    LegalDocument,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Mode::Auto),
            "general" => Ok(Mode::General),
            "legal_document" => Ok(Mode::LegalDocument),
            other => Err(format!(
                "unknown mode '{other}' (expected auto, general, or legal_document)"
            )),
        }
    }
}

/// The engine a pair of inputs was routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Generic,
    LegalDocument,
}

/// Dispatch a pair of parsed documents. Routing never emits changes.
pub fn route(old: &Node, new: &Node, hint: Mode) -> Route {
    match hint {
        Mode::General => Route::Generic,
        Mode::LegalDocument => Route::LegalDocument,
        Mode::Auto => {
            if looks_like_legal_document(old) && looks_like_legal_document(new) {
                Route::LegalDocument
            } else {
                Route::Generic
            }
        }
    }
}

/// A root counts as a legal document when it is a mapping whose first
/// key is `document`, mapping to a mapping with a `sections` sequence
/// whose every element carries a non-empty scalar `marker`.
fn looks_like_legal_document(root: &Node) -> bool {
    let Some(root_map) = root.value.as_map() else {
        return false;
    };
    if root_map.keys().next() != Some("document") {
        return false;
    }
    let Some(doc) = root_map.get("document").and_then(|n| n.value.as_map()) else {
        return false;
    };
    let Some(sections) = doc.get("sections").and_then(|n| n.value.as_seq()) else {
        return false;
    };
    sections.iter().all(|section| {
        section
            .value
            .as_map()
            .and_then(|m| m.get("marker"))
            .is_some_and(|marker| {
                !matches!(marker.value, Value::Null)
                    && marker
                        .value
                        .scalar_text()
                        .is_some_and(|text| !text.is_empty())
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamdiff_core::parse;

    const LEGAL: &str = "document:\n  id: d1\n  sections:\n    - id: s1\n      marker: \"1\"\n";
    const GENERAL: &str = "database:\n  host: db\n";

    fn node(text: &str) -> Node {
        parse(text).unwrap()
    }

    #[test]
    fn test_explicit_mode_wins() {
        let legal = node(LEGAL);
        let plain = node(GENERAL);
        assert_eq!(route(&legal, &legal, Mode::General), Route::Generic);
        assert_eq!(route(&plain, &plain, Mode::LegalDocument), Route::LegalDocument);
    }

    #[test]
    fn test_auto_detects_legal_shape() {
        let legal = node(LEGAL);
        assert_eq!(route(&legal, &legal, Mode::Auto), Route::LegalDocument);
    }

    #[test]
    fn test_auto_requires_both_sides() {
        let legal = node(LEGAL);
        let plain = node(GENERAL);
        assert_eq!(route(&legal, &plain, Mode::Auto), Route::Generic);
    }

    #[test]
    fn test_auto_requires_document_as_first_key() {
        let shifted = node("extra: 1\ndocument:\n  sections: []\n");
        assert_eq!(route(&shifted, &shifted, Mode::Auto), Route::Generic);
    }

    #[test]
    fn test_auto_rejects_sections_without_markers() {
        let bad = node("document:\n  sections:\n    - id: s1\n");
        assert_eq!(route(&bad, &bad, Mode::Auto), Route::Generic);
        let empty_marker = node("document:\n  sections:\n    - marker: \"\"\n");
        assert_eq!(route(&empty_marker, &empty_marker, Mode::Auto), Route::Generic);
    }

    #[test]
    fn test_auto_accepts_empty_sections() {
        let empty = node("document:\n  sections: []\n");
        assert_eq!(route(&empty, &empty, Mode::Auto), Route::LegalDocument);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("auto".parse::<Mode>().unwrap(), Mode::Auto);
        assert_eq!("legal_document".parse::<Mode>().unwrap(), Mode::LegalDocument);
        assert!("markdown".parse::<Mode>().is_err());
    }
}
