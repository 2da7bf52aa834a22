//! yamdiff Engine - structural diffing for YAML documents
//!
//! This crate provides the two diff engines and everything around them:
//! - `diff`: parse, route, and diff two YAML texts
//! - `validate`: parse and validate a legal document
//! - `format`: render a report as text, JSON, or YAML
//!
//! The generic engine handles arbitrary trees; the marker engine
//! handles legal documents with stable section markers. Routing between
//! them is automatic unless a mode is forced.

pub mod error;
pub mod format;
pub mod generic;
pub mod identity;
pub mod lines;
pub mod marker;
pub mod router;
pub mod similarity;

use serde::Serialize;
use tracing::debug;
use yamdiff_core::{CoreError, Document, IdentityRule};

pub use error::{EngineError, Result};
pub use format::{FormatFilters, FormatStyle, format};
pub use generic::{GenericChange, GenericChangeKind, diff_generic};
pub use identity::{IdentityKey, identify};
pub use marker::{SectionChange, SectionChangeKind, diff_documents};
pub use router::{Mode, Route, route};
pub use similarity::{similarity, text_similarity};

/// The outcome of one diff invocation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DiffReport {
    General { changes: Vec<GenericChange> },
    LegalDocument { changes: Vec<SectionChange> },
}

impl DiffReport {
    pub fn len(&self) -> usize {
        match self {
            DiffReport::General { changes } => changes.len(),
            DiffReport::LegalDocument { changes } => changes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any non-UNCHANGED change was found
    pub fn has_changes(&self) -> bool {
        match self {
            DiffReport::General { changes } => changes
                .iter()
                .any(|c| c.kind != GenericChangeKind::Unchanged),
            DiffReport::LegalDocument { changes } => changes
                .iter()
                .any(|c| c.kind != SectionChangeKind::Unchanged),
        }
    }

    /// Per-kind counts, e.g. `2 KEY_ADDED, 1 KEY_RENAMED`
    pub fn summary(&self) -> String {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        let mut bump = |name: &'static str| {
            match counts.iter_mut().find(|(n, _)| *n == name) {
                Some((_, count)) => *count += 1,
                None => counts.push((name, 1)),
            }
        };
        match self {
            DiffReport::General { changes } => {
                for change in changes {
                    if change.kind != GenericChangeKind::Unchanged {
                        bump(change.kind.as_str());
                    }
                }
            }
            DiffReport::LegalDocument { changes } => {
                for change in changes {
                    if change.kind != SectionChangeKind::Unchanged {
                        bump(change.kind.as_str());
                    }
                }
            }
        }
        if counts.is_empty() {
            return "no changes".to_string();
        }
        counts
            .iter()
            .map(|(name, count)| format!("{count} {name}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Diff two YAML texts.
///
/// Parses both inputs, routes them by `mode`, and runs the matching
/// engine. Identity rules only affect the generic engine. Errors are
/// the single outcome of a failed call; no partial diff is returned.
pub fn diff(
    old_text: &str,
    new_text: &str,
    mode: Mode,
    rules: &[IdentityRule],
) -> Result<DiffReport> {
    let old = yamdiff_core::parse(old_text).map_err(EngineError::Core)?;
    let new = yamdiff_core::parse(new_text).map_err(EngineError::Core)?;

    match route(&old, &new, mode) {
        Route::Generic => {
            debug!("routing to the generic engine");
            Ok(DiffReport::General {
                changes: diff_generic(&old, &new, rules),
            })
        }
        Route::LegalDocument => {
            debug!("routing to the marker engine");
            let old_doc = yamdiff_core::validate(&old)
                .map_err(|errors| CoreError::Validation { errors })?;
            let new_doc = yamdiff_core::validate(&new)
                .map_err(|errors| CoreError::Validation { errors })?;
            Ok(DiffReport::LegalDocument {
                changes: diff_documents(&old_doc, &new_doc)?,
            })
        }
    }
}

/// Parse and validate a single legal document.
pub fn validate(text: &str) -> Result<Document> {
    let root = yamdiff_core::parse(text).map_err(EngineError::Core)?;
    yamdiff_core::validate(&root)
        .map_err(|errors| EngineError::Core(CoreError::Validation { errors }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_routes_general() {
        let report = diff("a: 1\n", "a: 2\n", Mode::Auto, &[]).unwrap();
        assert!(matches!(report, DiffReport::General { .. }));
        assert!(report.has_changes());
    }

    #[test]
    fn test_diff_parse_error() {
        let err = diff("a: [1,\n", "a: 1\n", Mode::Auto, &[]).unwrap_err();
        assert!(matches!(err, EngineError::Core(CoreError::Parse { .. })));
    }

    #[test]
    fn test_diff_legal_mode_validates() {
        let bad = "document:\n  id: d1\n  sections: []\n";
        let err = diff(bad, bad, Mode::LegalDocument, &[]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn test_summary() {
        let report = diff("a: 1\ngone: x\n", "a: 2\nfresh: y\n", Mode::Auto, &[]).unwrap();
        let summary = report.summary();
        assert!(summary.contains("1 VALUE_CHANGED"));
        assert!(summary.contains("1 KEY_REMOVED"));
        assert!(summary.contains("1 KEY_ADDED"));
    }

    #[test]
    fn test_empty_diff_summary() {
        let report = diff("a: 1\n", "a: 1\n", Mode::Auto, &[]).unwrap();
        assert!(!report.has_changes());
        assert_eq!(report.summary(), "no changes");
    }
}
