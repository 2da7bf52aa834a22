//! Report formatters
//!
//! Renders a [`DiffReport`](crate::DiffReport) as plain text, JSON, or
//! YAML. Filtering happens here so every style sees the same subset:
//! UNCHANGED records are dropped unless asked for, and the output can
//! be restricted to a set of change kinds.

use std::fmt::Write as _;
use std::str::FromStr;

use yamdiff_core::Node;

use crate::DiffReport;
use crate::error::EngineError;
use crate::generic::{GenericChange, GenericChangeKind};
use crate::marker::{SectionChange, SectionChangeKind};

/// Output style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStyle {
    Json,
    Text,
    Yaml,
}

impl FromStr for FormatStyle {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(FormatStyle::Json),
            "text" => Ok(FormatStyle::Text),
            "yaml" => Ok(FormatStyle::Yaml),
            other => Err(EngineError::UnsupportedStyle {
                style: other.to_string(),
            }),
        }
    }
}

/// What to keep in the formatted output
#[derive(Debug, Clone, Default)]
pub struct FormatFilters {
    /// Keep UNCHANGED records
    pub include_unchanged: bool,
    /// When set, keep only these kinds (names like `KEY_RENAMED`)
    pub kinds: Option<Vec<String>>,
}

impl FormatFilters {
    /// Whether a change of this kind survives the filters
    pub fn keeps(&self, kind_name: &str) -> bool {
        if !self.include_unchanged && kind_name == "UNCHANGED" {
            return false;
        }
        match &self.kinds {
            Some(kinds) => kinds.iter().any(|k| k == kind_name),
            None => true,
        }
    }
}

/// Render a report in the requested style.
pub fn format(report: &DiffReport, style: FormatStyle, filters: &FormatFilters) -> String {
    let filtered = filter_report(report, filters);
    match style {
        FormatStyle::Json => serde_json::to_string_pretty(&filtered).unwrap_or_default(),
        FormatStyle::Yaml => serde_yaml::to_string(&filtered).unwrap_or_default(),
        FormatStyle::Text => render_text(&filtered),
    }
}

fn filter_report(report: &DiffReport, filters: &FormatFilters) -> DiffReport {
    match report {
        DiffReport::General { changes } => DiffReport::General {
            changes: changes
                .iter()
                .filter(|c| filters.keeps(c.kind.as_str()))
                .cloned()
                .collect(),
        },
        DiffReport::LegalDocument { changes } => DiffReport::LegalDocument {
            changes: changes
                .iter()
                .filter(|c| filters.keeps(c.kind.as_str()))
                .cloned()
                .collect(),
        },
    }
}

fn render_text(report: &DiffReport) -> String {
    let mut out = String::new();
    match report {
        DiffReport::General { changes } => {
            for change in changes {
                render_generic_line(change, &mut out);
            }
        }
        DiffReport::LegalDocument { changes } => {
            for change in changes {
                render_section_line(change, &mut out);
            }
        }
    }
    out
}

fn render_generic_line(change: &GenericChange, out: &mut String) {
    match change.kind {
        GenericChangeKind::KeyMoved | GenericChangeKind::ItemMoved => {
            let old_path = change
                .old_path
                .as_ref()
                .map_or_else(|| change.path.to_string(), ToString::to_string);
            let new_path = change
                .new_path
                .as_ref()
                .map_or_else(|| change.path.to_string(), ToString::to_string);
            let _ = write!(out, "{} {old_path} -> {new_path}", change.kind.as_str());
        }
        GenericChangeKind::ValueChanged => {
            let _ = write!(
                out,
                "{} {}: {} -> {}",
                change.kind.as_str(),
                change.path,
                snippet(change.old_value.as_ref()),
                snippet(change.new_value.as_ref())
            );
        }
        GenericChangeKind::TypeChanged => {
            let old_type = change
                .old_value
                .as_ref()
                .map_or("?", |n| n.value.type_name());
            let new_type = change
                .new_value
                .as_ref()
                .map_or("?", |n| n.value.type_name());
            let _ = write!(
                out,
                "{} {}: {old_type} -> {new_type}",
                change.kind.as_str(),
                change.path
            );
        }
        GenericChangeKind::KeyRenamed => {
            let _ = write!(
                out,
                "{} {}: {} -> {}",
                change.kind.as_str(),
                change.path,
                change.old_key.as_deref().unwrap_or("?"),
                change.new_key.as_deref().unwrap_or("?")
            );
        }
        GenericChangeKind::KeyAdded | GenericChangeKind::ItemAdded => {
            let _ = write!(
                out,
                "{} {}: {}",
                change.kind.as_str(),
                change.path,
                snippet(change.new_value.as_ref())
            );
        }
        GenericChangeKind::KeyRemoved | GenericChangeKind::ItemRemoved => {
            let _ = write!(
                out,
                "{} {}: {}",
                change.kind.as_str(),
                change.path,
                snippet(change.old_value.as_ref())
            );
        }
        GenericChangeKind::ItemChanged | GenericChangeKind::Unchanged => {
            let _ = write!(out, "{} {}", change.kind.as_str(), change.path);
        }
    }
    if let (Some(old_line), Some(new_line)) = (change.old_line, change.new_line) {
        let _ = write!(out, "  (line {old_line} -> {new_line})");
    } else if let Some(line) = change.old_line.or(change.new_line) {
        let _ = write!(out, "  (line {line})");
    }
    out.push('\n');
}

fn render_section_line(change: &SectionChange, out: &mut String) {
    let location = change
        .new_marker_path
        .as_ref()
        .or(change.old_marker_path.as_ref())
        .map_or_else(|| change.marker.clone(), |p| p.join("/"));
    let _ = write!(out, "{} {}", change.kind.as_str(), location);

    match change.kind {
        SectionChangeKind::SectionMoved => {
            if let (Some(old_path), Some(new_path)) =
                (&change.old_marker_path, &change.new_marker_path)
            {
                let _ = write!(out, " (from {} to {})", old_path.join("/"), new_path.join("/"));
            }
        }
        SectionChangeKind::TitleChanged => {
            let _ = write!(
                out,
                ": {} -> {}",
                change.old_title.as_deref().unwrap_or("-"),
                change.new_title.as_deref().unwrap_or("-")
            );
        }
        SectionChangeKind::ContentChanged if change.marker != crate::marker::METADATA_MARKER => {}
        SectionChangeKind::ContentChanged => {
            let _ = write!(
                out,
                ": {} -> {}",
                change.old_content.as_deref().unwrap_or("-"),
                change.new_content.as_deref().unwrap_or("-")
            );
        }
        _ => {}
    }
    if change.marker != crate::marker::METADATA_MARKER {
        let _ = write!(out, " [section {}]", change.section_id);
    }
    if let (Some(old_line), Some(new_line)) = (change.old_line, change.new_line) {
        let _ = write!(out, "  (line {old_line} -> {new_line})");
    } else if let Some(line) = change.old_line.or(change.new_line) {
        let _ = write!(out, "  (line {line})");
    }
    out.push('\n');
}

const SNIPPET_LIMIT: usize = 64;

fn snippet(node: Option<&Node>) -> String {
    let Some(node) = node else {
        return "-".to_string();
    };
    let mut text = node.value.projection();
    if text.chars().count() > SNIPPET_LIMIT {
        text = text.chars().take(SNIPPET_LIMIT).collect::<String>() + "…";
    }
    if node.value.as_str().is_some() {
        format!("{text:?}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Mode, diff};

    fn report(old: &str, new: &str) -> DiffReport {
        diff(old, new, Mode::Auto, &[]).unwrap()
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("json".parse::<FormatStyle>().unwrap(), FormatStyle::Json);
        assert_eq!("yaml".parse::<FormatStyle>().unwrap(), FormatStyle::Yaml);
        let err = "xml".parse::<FormatStyle>().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedStyle { .. }));
    }

    #[test]
    fn test_text_output() {
        let report = report("a: 1\nb: 2\n", "a: 1\nb: 3\n");
        let text = format(&report, FormatStyle::Text, &FormatFilters::default());
        assert_eq!(text, "VALUE_CHANGED $.b: 2 -> 3  (line 2 -> 2)\n");
    }

    #[test]
    fn test_text_rename_line() {
        let report = report("database:\n  host: db\n", "database:\n  hostname: db\n");
        let text = format(&report, FormatStyle::Text, &FormatFilters::default());
        assert_eq!(text, "KEY_RENAMED $.database.hostname: host -> hostname  (line 2 -> 2)\n");
    }

    #[test]
    fn test_json_output_is_parseable() {
        let report = report("a: 1\n", "a: 2\n");
        let json = format(&report, FormatStyle::Json, &FormatFilters::default());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "general");
        assert_eq!(value["changes"][0]["kind"], "VALUE_CHANGED");
        assert_eq!(value["changes"][0]["path"], "$.a");
        assert_eq!(value["changes"][0]["old_value"], 1);
    }

    #[test]
    fn test_yaml_output_includes_mode() {
        let report = report("a: 1\n", "a: 2\n");
        let yaml = format(&report, FormatStyle::Yaml, &FormatFilters::default());
        assert!(yaml.contains("mode: general"));
        assert!(yaml.contains("kind: VALUE_CHANGED"));
    }

    #[test]
    fn test_unchanged_filtered_by_default() {
        let report = report("a: 1\nb: 2\n", "a: 1\nb: 3\n");
        let text = format(&report, FormatStyle::Text, &FormatFilters::default());
        assert!(!text.contains("UNCHANGED"));

        let all = FormatFilters {
            include_unchanged: true,
            ..Default::default()
        };
        let text = format(&report, FormatStyle::Text, &all);
        assert!(text.contains("UNCHANGED $.a"));
    }

    #[test]
    fn test_kind_filter() {
        let report = report("a: 1\ngone: x\n", "a: 2\nfresh: y\n");
        let filters = FormatFilters {
            include_unchanged: false,
            kinds: Some(vec!["KEY_ADDED".to_string()]),
        };
        let text = format(&report, FormatStyle::Text, &filters);
        assert!(text.contains("KEY_ADDED"));
        assert!(!text.contains("VALUE_CHANGED"));
        assert!(!text.contains("KEY_REMOVED"));
    }
}
