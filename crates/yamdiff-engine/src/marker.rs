//! Marker-based diff for legal documents
//!
//! Sections are addressed by their marker path (the markers from the
//! document root down). Equal marker paths are exact matches and are
//! compared field by field; leftovers go through content-similarity
//! move detection before falling out as plain additions and removals.
//! Document metadata is diffed as a flat list of scalar leaves under
//! the reserved `__metadata__` marker.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;
use yamdiff_core::{Document, Node, Section};

use crate::error::{EngineError, Result};
use crate::lines::section_yaml;
use crate::similarity::text_similarity;

/// Minimum content similarity for pairing two sections into a move
pub const SECTION_MOVE_THRESHOLD: f64 = 0.95;

/// Marker reserved for document-metadata change records
pub const METADATA_MARKER: &str = "__metadata__";

/// Metadata leaves walked by the metadata diff, as paths under the
/// `document` mapping
const METADATA_FIELDS: &[&[&str]] = &[
    &["version", "number"],
    &["version", "description"],
    &["source", "url"],
    &["source", "fetched_at"],
    &["authors"],
    &["published_date"],
    &["updated_date"],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionChangeKind {
    SectionAdded,
    SectionRemoved,
    ContentChanged,
    TitleChanged,
    SectionMoved,
    Unchanged,
}

impl SectionChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionChangeKind::SectionAdded => "SECTION_ADDED",
            SectionChangeKind::SectionRemoved => "SECTION_REMOVED",
            SectionChangeKind::ContentChanged => "CONTENT_CHANGED",
            SectionChangeKind::TitleChanged => "TITLE_CHANGED",
            SectionChangeKind::SectionMoved => "SECTION_MOVED",
            SectionChangeKind::Unchanged => "UNCHANGED",
        }
    }
}

/// One change record emitted by the marker engine
#[derive(Debug, Clone, Serialize)]
pub struct SectionChange {
    /// Opaque identifier, fresh per diff invocation
    pub id: String,
    pub section_id: String,
    pub kind: SectionChangeKind,
    pub marker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_marker_path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_marker_path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_id_path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_id_path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_section_yaml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_section_yaml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<usize>,
}

fn change(kind: SectionChangeKind, section_id: &str, marker: &str) -> SectionChange {
    SectionChange {
        id: Uuid::new_v4().to_string(),
        section_id: section_id.to_string(),
        kind,
        marker: marker.to_string(),
        old_marker_path: None,
        new_marker_path: None,
        old_id_path: None,
        new_id_path: None,
        old_title: None,
        new_title: None,
        old_content: None,
        new_content: None,
        old_section_yaml: None,
        new_section_yaml: None,
        old_line: None,
        new_line: None,
    }
}

/// One indexed section with its address in the document
struct Entry<'a> {
    section: &'a Section,
    marker_path: Vec<String>,
    id_path: Vec<String>,
}

/// Pre-order index of a document's sections keyed by marker path
struct SectionIndex<'a> {
    entries: Vec<Entry<'a>>,
}

impl<'a> SectionIndex<'a> {
    fn build(doc: &'a Document) -> Result<Self> {
        let mut entries = Vec::new();
        index_sections(&doc.sections, &[], &[], &mut entries)?;
        Ok(Self { entries })
    }

    fn position(&self, marker_path: &[String]) -> Option<usize> {
        self.entries.iter().position(|e| e.marker_path == marker_path)
    }
}

fn index_sections<'a>(
    sections: &'a [Section],
    marker_prefix: &[String],
    id_prefix: &[String],
    out: &mut Vec<Entry<'a>>,
) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for section in sections {
        if !seen.insert(section.marker.as_str()) {
            return Err(EngineError::DuplicateMarker {
                parent_path: display_marker_path(marker_prefix),
                marker: section.marker.clone(),
            });
        }
    }
    for section in sections {
        let mut marker_path = marker_prefix.to_vec();
        marker_path.push(section.marker.clone());
        let mut id_path = id_prefix.to_vec();
        id_path.push(section.id.clone());
        out.push(Entry {
            section,
            marker_path: marker_path.clone(),
            id_path: id_path.clone(),
        });
        index_sections(&section.children, &marker_path, &id_path, out)?;
    }
    Ok(())
}

fn display_marker_path(path: &[String]) -> String {
    if path.is_empty() {
        "$".to_string()
    } else {
        path.join("/")
    }
}

/// Diff two validated legal documents.
///
/// Fails with [`EngineError::DuplicateMarker`] when either document has
/// two sibling sections sharing a marker; no changes are emitted in
/// that case.
pub fn diff_documents(old: &Document, new: &Document) -> Result<Vec<SectionChange>> {
    let old_index = SectionIndex::build(old)?;
    let new_index = SectionIndex::build(new)?;

    let mut changes = Vec::new();
    let mut new_taken = vec![false; new_index.entries.len()];
    let mut old_unmatched = Vec::new();

    // Exact matches: equal marker paths
    for old_entry in &old_index.entries {
        match new_index.position(&old_entry.marker_path) {
            Some(pos) => {
                new_taken[pos] = true;
                let new_entry = &new_index.entries[pos];
                compare_exact(old_entry, new_entry, &mut changes);
            }
            None => old_unmatched.push(old_entry),
        }
    }
    let new_unmatched: Vec<&Entry> = new_index
        .entries
        .iter()
        .enumerate()
        .filter(|(pos, _)| !new_taken[*pos])
        .map(|(_, e)| e)
        .collect();

    // Move detection by content similarity, one-to-one greedy
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for (oi, old_entry) in old_unmatched.iter().enumerate() {
        let old_content = old_entry.section.content.as_deref().unwrap_or("");
        if old_content.trim().is_empty() {
            // Parent-only sections would pair on title tokens alone
            continue;
        }
        for (ni, new_entry) in new_unmatched.iter().enumerate() {
            let new_content = new_entry.section.content.as_deref().unwrap_or("");
            let sim = text_similarity(old_content, new_content);
            if sim >= SECTION_MOVE_THRESHOLD {
                pairs.push((oi, ni, sim));
            }
        }
    }
    pairs.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
            .then_with(|| a.1.cmp(&b.1))
    });

    let mut old_moved = vec![false; old_unmatched.len()];
    let mut new_moved = vec![false; new_unmatched.len()];
    for (oi, ni, _) in pairs {
        if old_moved[oi] || new_moved[ni] {
            continue;
        }
        old_moved[oi] = true;
        new_moved[ni] = true;
        emit_move(old_unmatched[oi], new_unmatched[ni], &mut changes);
    }

    // Residuals
    for (oi, old_entry) in old_unmatched.iter().enumerate() {
        if old_moved[oi] {
            continue;
        }
        let section = old_entry.section;
        let mut c = change(SectionChangeKind::SectionRemoved, &section.id, &section.marker);
        c.old_marker_path = Some(old_entry.marker_path.clone());
        c.old_id_path = Some(old_entry.id_path.clone());
        c.old_title = section.title.clone();
        c.old_content = section.content.clone();
        c.old_section_yaml = Some(section_yaml(section));
        c.old_line = Some(section.line);
        changes.push(c);
    }
    for (ni, new_entry) in new_unmatched.iter().enumerate() {
        if new_moved[ni] {
            continue;
        }
        let section = new_entry.section;
        let mut c = change(SectionChangeKind::SectionAdded, &section.id, &section.marker);
        c.new_marker_path = Some(new_entry.marker_path.clone());
        c.new_id_path = Some(new_entry.id_path.clone());
        c.new_title = section.title.clone();
        c.new_content = section.content.clone();
        c.new_section_yaml = Some(section_yaml(section));
        c.new_line = Some(section.line);
        changes.push(c);
    }

    diff_metadata(old, new, &mut changes);

    debug!(changes = changes.len(), "document diff complete");
    Ok(changes)
}

fn compare_exact(old_entry: &Entry, new_entry: &Entry, changes: &mut Vec<SectionChange>) {
    let old_section = old_entry.section;
    let new_section = new_entry.section;
    let title_differs = old_section.title != new_section.title;
    let content_differs = old_section.content != new_section.content;

    if !title_differs && !content_differs {
        let mut c = change(SectionChangeKind::Unchanged, &new_section.id, &new_section.marker);
        c.old_marker_path = Some(old_entry.marker_path.clone());
        c.new_marker_path = Some(new_entry.marker_path.clone());
        c.old_id_path = Some(old_entry.id_path.clone());
        c.new_id_path = Some(new_entry.id_path.clone());
        c.old_line = Some(old_section.line);
        c.new_line = Some(new_section.line);
        changes.push(c);
        return;
    }

    if content_differs {
        let mut c = change(SectionChangeKind::ContentChanged, &new_section.id, &new_section.marker);
        c.old_marker_path = Some(old_entry.marker_path.clone());
        c.new_marker_path = Some(new_entry.marker_path.clone());
        c.old_id_path = Some(old_entry.id_path.clone());
        c.new_id_path = Some(new_entry.id_path.clone());
        c.old_content = old_section.content.clone();
        c.new_content = new_section.content.clone();
        c.old_section_yaml = Some(section_yaml(old_section));
        c.new_section_yaml = Some(section_yaml(new_section));
        c.old_line = Some(old_section.line);
        c.new_line = Some(new_section.line);
        changes.push(c);
    }
    if title_differs {
        let mut c = change(SectionChangeKind::TitleChanged, &new_section.id, &new_section.marker);
        c.old_marker_path = Some(old_entry.marker_path.clone());
        c.new_marker_path = Some(new_entry.marker_path.clone());
        c.old_id_path = Some(old_entry.id_path.clone());
        c.new_id_path = Some(new_entry.id_path.clone());
        c.old_title = old_section.title.clone();
        c.new_title = new_section.title.clone();
        c.old_section_yaml = Some(section_yaml(old_section));
        c.new_section_yaml = Some(section_yaml(new_section));
        c.old_line = Some(old_section.line);
        c.new_line = Some(new_section.line);
        changes.push(c);
    }
}

fn emit_move(old_entry: &Entry, new_entry: &Entry, changes: &mut Vec<SectionChange>) {
    let old_section = old_entry.section;
    let new_section = new_entry.section;

    let mut c = change(SectionChangeKind::SectionMoved, &new_section.id, &new_section.marker);
    c.old_marker_path = Some(old_entry.marker_path.clone());
    c.new_marker_path = Some(new_entry.marker_path.clone());
    c.old_id_path = Some(old_entry.id_path.clone());
    c.new_id_path = Some(new_entry.id_path.clone());
    c.old_section_yaml = Some(section_yaml(old_section));
    c.new_section_yaml = Some(section_yaml(new_section));
    c.old_line = Some(old_section.line);
    c.new_line = Some(new_section.line);
    changes.push(c);

    if old_section.title != new_section.title {
        let mut c = change(SectionChangeKind::TitleChanged, &new_section.id, &new_section.marker);
        c.old_marker_path = Some(old_entry.marker_path.clone());
        c.new_marker_path = Some(new_entry.marker_path.clone());
        c.old_id_path = Some(old_entry.id_path.clone());
        c.new_id_path = Some(new_entry.id_path.clone());
        c.old_title = old_section.title.clone();
        c.new_title = new_section.title.clone();
        c.old_line = Some(old_section.line);
        c.new_line = Some(new_section.line);
        changes.push(c);
    }
    if old_section.content != new_section.content {
        let mut c = change(SectionChangeKind::ContentChanged, &new_section.id, &new_section.marker);
        c.old_marker_path = Some(old_entry.marker_path.clone());
        c.new_marker_path = Some(new_entry.marker_path.clone());
        c.old_id_path = Some(old_entry.id_path.clone());
        c.new_id_path = Some(new_entry.id_path.clone());
        c.old_content = old_section.content.clone();
        c.new_content = new_section.content.clone();
        c.old_line = Some(old_section.line);
        c.new_line = Some(new_section.line);
        changes.push(c);
    }
}

fn diff_metadata(old: &Document, new: &Document, changes: &mut Vec<SectionChange>) {
    for field in METADATA_FIELDS {
        let old_node = lookup(&old.raw, field);
        let new_node = lookup(&new.raw, field);
        let old_text = old_node.map(|n| n.value.projection());
        let new_text = new_node.map(|n| n.value.projection());
        if old_text == new_text {
            continue;
        }

        let mut marker_path = vec![METADATA_MARKER.to_string()];
        marker_path.extend(field.iter().map(|s| s.to_string()));

        let mut c = change(SectionChangeKind::ContentChanged, METADATA_MARKER, METADATA_MARKER);
        if old_node.is_some() {
            c.old_marker_path = Some(marker_path.clone());
        }
        if new_node.is_some() {
            c.new_marker_path = Some(marker_path.clone());
        }
        c.old_content = old_text;
        c.new_content = new_text;
        c.old_line = old_node.map(|n| n.line);
        c.new_line = new_node.map(|n| n.line);
        changes.push(c);
    }
}

fn lookup<'a>(node: &'a Node, path: &[&str]) -> Option<&'a Node> {
    let mut current = node;
    for key in path {
        current = current.value.as_map()?.get(key)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamdiff_core::{parse, validate};

    fn document(yaml: &str) -> Document {
        validate(&parse(yaml).unwrap()).unwrap()
    }

    fn doc_with_sections(sections: &str) -> Document {
        document(&format!(
            r#"
document:
  id: doc-1
  title: Test Law
  type: law
  version:
    number: 1
  source:
    url: https://example.org/law
    fetched_at: "2024-01-01"
  sections:
{sections}"#
        ))
    }

    fn non_unchanged(changes: &[SectionChange]) -> Vec<&SectionChange> {
        changes
            .iter()
            .filter(|c| c.kind != SectionChangeKind::Unchanged)
            .collect()
    }

    #[test]
    fn test_identical_documents_only_unchanged() {
        let sections = "    - id: s1\n      marker: \"1\"\n      content: Alpha.\n";
        let old = doc_with_sections(sections);
        let new = doc_with_sections(sections);
        let changes = diff_documents(&old, &new).unwrap();
        assert!(non_unchanged(&changes).is_empty());
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_content_and_title_both_reported() {
        let old = doc_with_sections(
            "    - id: s1\n      marker: \"1\"\n      title: Old Title\n      content: Old body.\n",
        );
        let new = doc_with_sections(
            "    - id: s1\n      marker: \"1\"\n      title: New Title\n      content: New body.\n",
        );
        let changes = diff_documents(&old, &new).unwrap();
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 2);
        assert_eq!(real[0].kind, SectionChangeKind::ContentChanged);
        assert_eq!(real[0].old_content.as_deref(), Some("Old body."));
        assert_eq!(real[1].kind, SectionChangeKind::TitleChanged);
        assert_eq!(real[1].new_title.as_deref(), Some("New Title"));
    }

    #[test]
    fn test_section_move_with_title_edit() {
        // Spec scenario: same content under a different parent with an
        // edited title yields SECTION_MOVED + TITLE_CHANGED, no
        // CONTENT_CHANGED.
        let old = doc_with_sections(concat!(
            "    - id: p1\n      marker: \"1\"\n      children:\n",
            "        - id: s1\n          marker: \"2\"\n          title: T\n          content: X\n",
            "    - id: p2\n      marker: \"9\"\n      content: Stable.\n",
        ));
        let new = doc_with_sections(concat!(
            "    - id: p3\n      marker: \"3\"\n      children:\n",
            "        - id: s1\n          marker: \"2\"\n          title: \"T'\"\n          content: X\n",
            "    - id: p2\n      marker: \"9\"\n      content: Stable.\n",
        ));
        let changes = diff_documents(&old, &new).unwrap();
        let moved: Vec<_> = changes
            .iter()
            .filter(|c| c.kind == SectionChangeKind::SectionMoved)
            .collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].old_marker_path.as_deref(), Some(&["1".to_string(), "2".to_string()][..]));
        assert_eq!(moved[0].new_marker_path.as_deref(), Some(&["3".to_string(), "2".to_string()][..]));
        let titles: Vec<_> = changes
            .iter()
            .filter(|c| c.kind == SectionChangeKind::TitleChanged && c.section_id == "s1")
            .collect();
        assert_eq!(titles.len(), 1);
        assert!(!changes.iter().any(|c| {
            c.kind == SectionChangeKind::ContentChanged && c.section_id == "s1"
        }));
    }

    #[test]
    fn test_duplicate_sibling_marker_fails() {
        let old = doc_with_sections(concat!(
            "    - id: s1\n      marker: \"1\"\n      content: A.\n",
            "    - id: s2\n      marker: \"1\"\n      content: B.\n",
        ));
        let new = doc_with_sections("    - id: s1\n      marker: \"1\"\n      content: A.\n");
        let err = diff_documents(&old, &new).unwrap_err();
        match err {
            EngineError::DuplicateMarker { parent_path, marker } => {
                assert_eq!(parent_path, "$");
                assert_eq!(marker, "1");
            }
            other => panic!("expected duplicate marker, got {other}"),
        }
    }

    #[test]
    fn test_added_and_removed_sections() {
        let old = doc_with_sections("    - id: s1\n      marker: \"1\"\n      content: Gone text.\n");
        let new = doc_with_sections("    - id: s2\n      marker: \"2\"\n      content: Completely different words.\n");
        let changes = diff_documents(&old, &new).unwrap();
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 2);
        assert_eq!(real[0].kind, SectionChangeKind::SectionRemoved);
        assert!(real[0].old_section_yaml.as_deref().unwrap().contains("Gone text."));
        assert_eq!(real[1].kind, SectionChangeKind::SectionAdded);
        assert_eq!(real[1].new_line, Some(new.sections[0].line));
    }

    #[test]
    fn test_empty_content_sections_never_move() {
        // Parent-only sections sharing a title must not pair up as a
        // move on title tokens alone.
        let old = doc_with_sections(concat!(
            "    - id: p1\n      marker: \"1\"\n      title: Chapter\n      children:\n",
            "        - id: s1\n          marker: \"a\"\n          content: Unique old words here.\n",
        ));
        let new = doc_with_sections(concat!(
            "    - id: p2\n      marker: \"2\"\n      title: Chapter\n      children:\n",
            "        - id: s2\n          marker: \"b\"\n          content: Entirely fresh wording instead.\n",
        ));
        let changes = diff_documents(&old, &new).unwrap();
        assert!(!changes.iter().any(|c| c.kind == SectionChangeKind::SectionMoved));
    }

    #[test]
    fn test_metadata_changes() {
        let old = doc_with_sections("    - id: s1\n      marker: \"1\"\n      content: A.\n");
        let mut new_yaml = String::from(
            r#"
document:
  id: doc-1
  title: Test Law
  type: law
  version:
    number: 2
    description: amended
  source:
    url: https://example.org/law
    fetched_at: "2024-01-01"
  sections:
"#,
        );
        new_yaml.push_str("    - id: s1\n      marker: \"1\"\n      content: A.\n");
        let new = document(&new_yaml);

        let changes = diff_documents(&old, &new).unwrap();
        let meta: Vec<_> = changes
            .iter()
            .filter(|c| c.marker == METADATA_MARKER)
            .collect();
        assert_eq!(meta.len(), 2);
        assert_eq!(
            meta[0].new_marker_path.as_deref(),
            Some(&["__metadata__".to_string(), "version".to_string(), "number".to_string()][..])
        );
        assert_eq!(meta[0].old_content.as_deref(), Some("1"));
        assert_eq!(meta[0].new_content.as_deref(), Some("2"));
        assert_eq!(meta[1].kind, SectionChangeKind::ContentChanged);
        assert!(meta[1].old_content.is_none());
        assert_eq!(meta[1].new_content.as_deref(), Some("amended"));
    }

    #[test]
    fn test_nested_duplicate_marker_reports_parent() {
        let old = doc_with_sections(concat!(
            "    - id: p1\n      marker: \"1\"\n      children:\n",
            "        - id: a\n          marker: \"x\"\n",
            "        - id: b\n          marker: \"x\"\n",
        ));
        let new = doc_with_sections("    - id: s1\n      marker: \"1\"\n");
        let err = diff_documents(&old, &new).unwrap_err();
        match err {
            EngineError::DuplicateMarker { parent_path, marker } => {
                assert_eq!(parent_path, "1");
                assert_eq!(marker, "x");
            }
            other => panic!("expected duplicate marker, got {other}"),
        }
    }
}
