//! Line attribution helpers and section text extraction
//!
//! Generic-mode changes pick their lines up directly from the nodes
//! they are built from; this module holds the shared helpers: resolving
//! a path back to a source line, and re-serialising a section subtree
//! for display in marker mode.

use yamdiff_core::{Node, Path, Section, Step, Value};

/// Resolve the source line a path refers to.
///
/// For a path ending in a mapping field this is the line of the key
/// token; otherwise the line of the node itself.
pub fn line_at(root: &Node, path: &Path) -> Option<usize> {
    let mut node = root;
    let steps = path.steps();
    for (idx, step) in steps.iter().enumerate() {
        match (&node.value, step) {
            (Value::Map(map), Step::Field(name)) => {
                if idx == steps.len() - 1 {
                    return map.key_line(name);
                }
                node = map.get(name)?;
            }
            (Value::Seq(items), Step::Index(i)) => {
                node = items.get(*i)?;
            }
            _ => return None,
        }
    }
    Some(node.line)
}

/// Re-serialise a section subtree as canonical YAML: two-space
/// indentation, insertion order preserved. The text is for display, not
/// a byte-exact reproduction of the source; its first line corresponds
/// to the section's source line.
pub fn section_yaml(section: &Section) -> String {
    serde_yaml::to_string(section).unwrap_or_default()
}
