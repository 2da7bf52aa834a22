//! Generic three-phase tree diff
//!
//! Phase 1 walks both trees in lockstep, emitting local changes and
//! recording unmatched keys and sequence items as candidates. Phase 2
//! pairs removed/added keys under the same parent into renames. Phase 3
//! pools the remaining candidates across the whole tree and pairs them
//! into moves; whatever is left becomes plain additions and removals.
//!
//! Sequences go through a four-phase matcher: identity keys, greedy
//! similarity at 0.90, greedy similarity at 0.70, positional structural
//! equality. The cascade keeps a 75%-similar pair from stealing a match
//! from a 95%-similar pair that would otherwise form later.

use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;
use uuid::Uuid;
use yamdiff_core::{IdentityRule, Mapping, Node, Path, Step, Value};

use crate::identity::{IdentityKey, identify};
use crate::similarity::similarity;

/// Minimum similarity for pairing a removed and an added key into a
/// rename under one parent
pub const RENAME_THRESHOLD: f64 = 0.90;
/// Minimum similarity for pairing same-named keys into a global move
pub const KEY_MOVE_THRESHOLD: f64 = 0.90;
/// Minimum content similarity for a global item move without identity
pub const ITEM_MOVE_THRESHOLD: f64 = 0.95;
/// First, high-confidence array matching pass
pub const HIGH_SIMILARITY: f64 = 0.90;
/// Second array matching pass
pub const LOW_SIMILARITY: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenericChangeKind {
    ValueChanged,
    TypeChanged,
    KeyAdded,
    KeyRemoved,
    KeyRenamed,
    KeyMoved,
    ItemAdded,
    ItemRemoved,
    ItemChanged,
    ItemMoved,
    Unchanged,
}

impl GenericChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenericChangeKind::ValueChanged => "VALUE_CHANGED",
            GenericChangeKind::TypeChanged => "TYPE_CHANGED",
            GenericChangeKind::KeyAdded => "KEY_ADDED",
            GenericChangeKind::KeyRemoved => "KEY_REMOVED",
            GenericChangeKind::KeyRenamed => "KEY_RENAMED",
            GenericChangeKind::KeyMoved => "KEY_MOVED",
            GenericChangeKind::ItemAdded => "ITEM_ADDED",
            GenericChangeKind::ItemRemoved => "ITEM_REMOVED",
            GenericChangeKind::ItemChanged => "ITEM_CHANGED",
            GenericChangeKind::ItemMoved => "ITEM_MOVED",
            GenericChangeKind::Unchanged => "UNCHANGED",
        }
    }
}

/// One change record emitted by the generic engine
#[derive(Debug, Clone, Serialize)]
pub struct GenericChange {
    /// Opaque identifier, fresh per diff invocation
    pub id: String,
    pub kind: GenericChangeKind,
    pub path: Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_path: Option<Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line: Option<usize>,
}

fn change(kind: GenericChangeKind, path: Path) -> GenericChange {
    GenericChange {
        id: Uuid::new_v4().to_string(),
        kind,
        path,
        old_path: None,
        new_path: None,
        old_key: None,
        new_key: None,
        old_value: None,
        new_value: None,
        old_line: None,
        new_line: None,
    }
}

/// Diff two value trees.
pub fn diff_generic(old: &Node, new: &Node, rules: &[IdentityRule]) -> Vec<GenericChange> {
    let mut engine = GenericDiffEngine::new(rules);
    engine.walk(old, new, Path::root(), Path::root());
    engine.finish()
}

struct KeyCandidate {
    key: String,
    key_line: usize,
    path: Path,
    node: Node,
    retired: bool,
}

struct KeyGroup {
    new_parent: Path,
    removed: Vec<KeyCandidate>,
    added: Vec<KeyCandidate>,
}

struct ItemCandidate {
    path: Path,
    node: Node,
    identity: Option<IdentityKey>,
    retired: bool,
}

/// One side of the global move pool
struct PoolEntry {
    /// Key name for key candidates, `None` for sequence items
    key: Option<String>,
    path: Path,
    node: Node,
    line: usize,
    identity: Option<IdentityKey>,
    origin: Origin,
}

/// Which phase-1 candidate a pool entry was flattened out of
enum Origin {
    Key { group: usize, idx: usize },
    Item { idx: usize },
}

fn related(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Collect every mapping key in a subtree, depth-first
fn nested_keys(node: &Node, base: &Path, out: &mut Vec<(String, usize, Path, Node)>) {
    match &node.value {
        Value::Map(map) => {
            for (key, entry) in map.iter() {
                let path = base.field(key);
                out.push((key.to_string(), entry.key_line, path.clone(), entry.node.clone()));
                nested_keys(&entry.node, &path, out);
            }
        }
        Value::Seq(items) => {
            for (idx, item) in items.iter().enumerate() {
                nested_keys(item, &base.index(idx), out);
            }
        }
        _ => {}
    }
}

/// Remove the subtree at a relative path from a candidate snapshot.
/// Sequence positions are blanked rather than removed so sibling paths
/// stay valid.
fn remove_at(node: &mut Node, steps: &[Step]) {
    let Some(step) = steps.first() else { return };
    match (&mut node.value, step) {
        (Value::Map(map), Step::Field(name)) => {
            if steps.len() == 1 {
                map.remove(name);
            } else if let Some(child) = map.get_mut(name) {
                remove_at(child, &steps[1..]);
            }
        }
        (Value::Seq(items), Step::Index(idx)) => {
            if let Some(child) = items.get_mut(*idx) {
                if steps.len() == 1 {
                    child.value = Value::Null;
                } else {
                    remove_at(child, &steps[1..]);
                }
            }
        }
        _ => {}
    }
}

struct GenericDiffEngine<'a> {
    rules: &'a [IdentityRule],
    changes: Vec<GenericChange>,
    key_groups: Vec<KeyGroup>,
    removed_items: Vec<ItemCandidate>,
    added_items: Vec<ItemCandidate>,
    /// Total candidates recorded so far; used to decide ITEM_CHANGED
    /// wrappers before phases 2 and 3 resolve the candidates
    candidate_count: usize,
}

impl<'a> GenericDiffEngine<'a> {
    fn new(rules: &'a [IdentityRule]) -> Self {
        Self {
            rules,
            changes: Vec::new(),
            key_groups: Vec::new(),
            removed_items: Vec::new(),
            added_items: Vec::new(),
            candidate_count: 0,
        }
    }

    // ------------------------------------------------------------------
    // Phase 1: recursive local diff
    // ------------------------------------------------------------------

    fn walk(&mut self, old: &Node, new: &Node, old_path: Path, new_path: Path) {
        if old.value.tag() != new.value.tag() {
            let mut c = change(GenericChangeKind::TypeChanged, new_path.clone());
            c.old_path = Some(old_path);
            c.new_path = Some(new_path);
            c.old_value = Some(old.clone());
            c.new_value = Some(new.clone());
            c.old_line = Some(old.line);
            c.new_line = Some(new.line);
            self.changes.push(c);
            return;
        }

        match (&old.value, &new.value) {
            (Value::Map(old_map), Value::Map(new_map)) => {
                self.walk_map(old_map, new_map, old_path, new_path);
            }
            (Value::Seq(old_items), Value::Seq(new_items)) => {
                self.walk_seq(old_items, new_items, old_path, new_path);
            }
            _ => {
                let kind = if old.value == new.value {
                    GenericChangeKind::Unchanged
                } else {
                    GenericChangeKind::ValueChanged
                };
                let mut c = change(kind, new_path.clone());
                c.old_path = Some(old_path);
                c.new_path = Some(new_path);
                c.old_value = Some(old.clone());
                c.new_value = Some(new.clone());
                c.old_line = Some(old.line);
                c.new_line = Some(new.line);
                self.changes.push(c);
            }
        }
    }

    fn walk_map(&mut self, old: &Mapping, new: &Mapping, old_path: Path, new_path: Path) {
        if old.is_empty() && new.is_empty() {
            let mut c = change(GenericChangeKind::Unchanged, new_path.clone());
            c.old_path = Some(old_path);
            c.new_path = Some(new_path);
            self.changes.push(c);
            return;
        }

        // Rename groups are ordered by first visit of their parent.
        let group_idx = self.key_groups.len();
        self.key_groups.push(KeyGroup {
            new_parent: new_path.clone(),
            removed: Vec::new(),
            added: Vec::new(),
        });

        for (key, entry) in old.iter() {
            match new.get(key) {
                Some(new_node) => {
                    self.walk(
                        &entry.node,
                        new_node,
                        old_path.field(key),
                        new_path.field(key),
                    );
                }
                None => {
                    self.key_groups[group_idx].removed.push(KeyCandidate {
                        key: key.to_string(),
                        key_line: entry.key_line,
                        path: old_path.field(key),
                        node: entry.node.clone(),
                        retired: false,
                    });
                    self.candidate_count += 1;
                }
            }
        }
        for (key, entry) in new.iter() {
            if !old.contains_key(key) {
                self.key_groups[group_idx].added.push(KeyCandidate {
                    key: key.to_string(),
                    key_line: entry.key_line,
                    path: new_path.field(key),
                    node: entry.node.clone(),
                    retired: false,
                });
                self.candidate_count += 1;
            }
        }
    }

    // ------------------------------------------------------------------
    // Four-phase array matcher
    // ------------------------------------------------------------------

    fn walk_seq(&mut self, old_items: &[Node], new_items: &[Node], old_path: Path, new_path: Path) {
        if old_items.is_empty() && new_items.is_empty() {
            let mut c = change(GenericChangeKind::Unchanged, new_path.clone());
            c.old_path = Some(old_path);
            c.new_path = Some(new_path);
            self.changes.push(c);
            return;
        }

        let array_name = new_path.last_field().map(str::to_owned);
        let old_ids = identify(array_name.as_deref(), old_items, self.rules);
        let new_ids = identify(array_name.as_deref(), new_items, self.rules);

        let mut old_matched = vec![false; old_items.len()];
        let mut new_matched = vec![false; new_items.len()];

        // 1. Identity match
        for i in 0..old_items.len() {
            let Some(key) = &old_ids[i] else { continue };
            let hit = (0..new_items.len())
                .find(|&j| !new_matched[j] && new_ids[j].as_ref() == Some(key));
            if let Some(j) = hit {
                old_matched[i] = true;
                new_matched[j] = true;
                self.recurse_item(old_items, new_items, i, j, &old_path, &new_path);
            }
        }

        // 2. + 3. Similarity cascade among the rest
        let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
        for i in 0..old_items.len() {
            if old_matched[i] {
                continue;
            }
            for j in 0..new_items.len() {
                if new_matched[j] {
                    continue;
                }
                let sim = similarity(&old_items[i], &new_items[j]);
                if sim >= LOW_SIMILARITY {
                    pairs.push((i, j, sim));
                }
            }
        }
        pairs.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| a.1.cmp(&b.1))
        });
        for threshold in [HIGH_SIMILARITY, LOW_SIMILARITY] {
            for &(i, j, sim) in &pairs {
                if sim >= threshold && !old_matched[i] && !new_matched[j] {
                    old_matched[i] = true;
                    new_matched[j] = true;
                    self.recurse_item(old_items, new_items, i, j, &old_path, &new_path);
                }
            }
        }

        // 4. Positional equality
        for i in 0..old_items.len().min(new_items.len()) {
            if !old_matched[i] && !new_matched[i] && old_items[i] == new_items[i] {
                old_matched[i] = true;
                new_matched[i] = true;
                let mut c = change(GenericChangeKind::Unchanged, new_path.index(i));
                c.old_path = Some(old_path.index(i));
                c.new_path = Some(new_path.index(i));
                c.old_value = Some(old_items[i].clone());
                c.new_value = Some(new_items[i].clone());
                c.old_line = Some(old_items[i].line);
                c.new_line = Some(new_items[i].line);
                self.changes.push(c);
            }
        }

        // 5. Residuals feed the global move pool
        for (i, item) in old_items.iter().enumerate() {
            if !old_matched[i] {
                self.removed_items.push(ItemCandidate {
                    path: old_path.index(i),
                    node: item.clone(),
                    identity: old_ids[i].clone(),
                    retired: false,
                });
                self.candidate_count += 1;
            }
        }
        for (j, item) in new_items.iter().enumerate() {
            if !new_matched[j] {
                self.added_items.push(ItemCandidate {
                    path: new_path.index(j),
                    node: item.clone(),
                    identity: new_ids[j].clone(),
                    retired: false,
                });
                self.candidate_count += 1;
            }
        }
    }

    fn recurse_item(
        &mut self,
        old_items: &[Node],
        new_items: &[Node],
        i: usize,
        j: usize,
        old_path: &Path,
        new_path: &Path,
    ) {
        let item_path = new_path.index(j);
        let insert_at = self.changes.len();
        let candidates_before = self.candidate_count;

        self.walk(&old_items[i], &new_items[j], old_path.index(i), item_path.clone());

        let emitted_change = self.changes[insert_at..]
            .iter()
            .any(|c| c.kind != GenericChangeKind::Unchanged);
        let recorded_candidate = self.candidate_count > candidates_before;
        // A record at the item path itself (scalar VALUE_CHANGED or a
        // TYPE_CHANGED) already accounts for the item.
        let covered_at_item = self.changes[insert_at..]
            .iter()
            .any(|c| c.kind != GenericChangeKind::Unchanged && c.path == item_path);

        if (emitted_change || recorded_candidate) && !covered_at_item {
            let mut c = change(GenericChangeKind::ItemChanged, item_path);
            c.old_path = Some(old_path.index(i));
            c.new_path = Some(new_path.index(j));
            c.old_value = Some(old_items[i].clone());
            c.new_value = Some(new_items[j].clone());
            c.old_line = Some(old_items[i].line);
            c.new_line = Some(new_items[j].line);
            self.changes.insert(insert_at, c);
        }
    }

    // ------------------------------------------------------------------
    // Phases 2 and 3
    // ------------------------------------------------------------------

    fn finish(mut self) -> Vec<GenericChange> {
        self.detect_renames();
        self.detect_moves();
        self.emit_residuals();
        debug!(changes = self.changes.len(), "generic diff complete");
        self.changes
    }

    fn detect_renames(&mut self) {
        for group_idx in 0..self.key_groups.len() {
            let group = &self.key_groups[group_idx];
            if group.removed.is_empty() || group.added.is_empty() {
                continue;
            }

            let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
            for (ri, removed) in group.removed.iter().enumerate() {
                for (ai, added) in group.added.iter().enumerate() {
                    if removed.key == added.key {
                        continue;
                    }
                    let sim = similarity(&removed.node, &added.node);
                    if sim >= RENAME_THRESHOLD {
                        pairs.push((ri, ai, sim));
                    }
                }
            }
            pairs.sort_by(|a, b| {
                b.2.partial_cmp(&a.2)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.0.cmp(&b.0))
                    .then_with(|| a.1.cmp(&b.1))
            });

            for (ri, ai, _) in pairs {
                let group = &self.key_groups[group_idx];
                if group.removed[ri].retired || group.added[ai].retired {
                    continue;
                }
                let record = {
                    let removed = &group.removed[ri];
                    let added = &group.added[ai];
                    let mut c =
                        change(GenericChangeKind::KeyRenamed, group.new_parent.field(&added.key));
                    c.old_path = Some(removed.path.clone());
                    c.new_path = Some(added.path.clone());
                    c.old_key = Some(removed.key.clone());
                    c.new_key = Some(added.key.clone());
                    c.old_value = Some(removed.node.clone());
                    c.new_value = Some(added.node.clone());
                    c.old_line = Some(removed.key_line);
                    c.new_line = Some(added.key_line);
                    c
                };
                let group = &mut self.key_groups[group_idx];
                group.removed[ri].retired = true;
                group.added[ai].retired = true;
                self.changes.push(record);
            }
        }
    }

    fn detect_moves(&mut self) {
        let removed_pool = self.build_pool(true);
        let added_pool = self.build_pool(false);

        let mut pairs: Vec<(usize, usize, f64, usize, String, String)> = Vec::new();
        for (ri, removed) in removed_pool.iter().enumerate() {
            for (ai, added) in added_pool.iter().enumerate() {
                if removed.path == added.path {
                    continue;
                }
                let eligible = match (&removed.key, &added.key) {
                    (Some(removed_key), Some(added_key)) => {
                        removed_key == added_key
                            && similarity(&removed.node, &added.node) >= KEY_MOVE_THRESHOLD
                    }
                    (None, None) => match (&removed.identity, &added.identity) {
                        (Some(a), Some(b)) => a == b,
                        _ => {
                            removed.node.value.has_move_content()
                                && added.node.value.has_move_content()
                                && similarity(&removed.node, &added.node) >= ITEM_MOVE_THRESHOLD
                        }
                    },
                    _ => false,
                };
                if eligible {
                    pairs.push((
                        ri,
                        ai,
                        similarity(&removed.node, &added.node),
                        removed.path.depth(),
                        removed.path.to_string(),
                        added.path.to_string(),
                    ));
                }
            }
        }

        // Greedy: descending similarity, shallower old path first, then
        // lexicographic path order.
        pairs.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.3.cmp(&b.3))
                .then_with(|| a.4.cmp(&b.4))
                .then_with(|| a.5.cmp(&b.5))
        });

        // Paths already consumed by a move, per side. A candidate that
        // is an ancestor or descendant of a consumed path must not pair
        // again; that would double-report the overlapping subtree.
        let mut taken_old: Vec<Path> = Vec::new();
        let mut taken_new: Vec<Path> = Vec::new();

        for (ri, ai, _, _, _, _) in pairs {
            let removed = &removed_pool[ri];
            let added = &added_pool[ai];
            if taken_old.iter().any(|p| related(p, &removed.path))
                || taken_new.iter().any(|p| related(p, &added.path))
            {
                continue;
            }
            taken_old.push(removed.path.clone());
            taken_new.push(added.path.clone());

            let kind = if removed.key.is_some() {
                GenericChangeKind::KeyMoved
            } else {
                GenericChangeKind::ItemMoved
            };
            let mut c = change(kind, added.path.clone());
            c.old_path = Some(removed.path.clone());
            c.new_path = Some(added.path.clone());
            c.old_key = removed.key.clone();
            c.new_key = added.key.clone();
            c.old_value = Some(removed.node.clone());
            c.new_value = Some(added.node.clone());
            c.old_line = Some(removed.line);
            c.new_line = Some(added.line);
            self.changes.push(c);

            self.settle_origin(&removed_pool[ri], true);
            self.settle_origin(&added_pool[ai], false);
        }
    }

    /// Flatten the surviving candidates of one side into a move pool.
    /// Key candidates contribute their whole subtree: a key nested in a
    /// removed mapping can reappear anywhere in the new document.
    fn build_pool(&self, removed_side: bool) -> Vec<PoolEntry> {
        let mut pool = Vec::new();
        for (g, group) in self.key_groups.iter().enumerate() {
            let candidates = if removed_side { &group.removed } else { &group.added };
            for (i, candidate) in candidates.iter().enumerate() {
                if candidate.retired {
                    continue;
                }
                pool.push(PoolEntry {
                    key: Some(candidate.key.clone()),
                    path: candidate.path.clone(),
                    node: candidate.node.clone(),
                    line: candidate.key_line,
                    identity: None,
                    origin: Origin::Key { group: g, idx: i },
                });
                let mut nested = Vec::new();
                nested_keys(&candidate.node, &candidate.path, &mut nested);
                for (key, key_line, path, node) in nested {
                    pool.push(PoolEntry {
                        key: Some(key),
                        path,
                        node,
                        line: key_line,
                        identity: None,
                        origin: Origin::Key { group: g, idx: i },
                    });
                }
            }
        }
        let items = if removed_side { &self.removed_items } else { &self.added_items };
        for (i, candidate) in items.iter().enumerate() {
            if candidate.retired {
                continue;
            }
            pool.push(PoolEntry {
                key: None,
                path: candidate.path.clone(),
                node: candidate.node.clone(),
                line: candidate.node.line,
                identity: candidate.identity.clone(),
                origin: Origin::Item { idx: i },
            });
        }
        pool
    }

    /// Retire the primary candidate an entry belongs to. When only part
    /// of a subtree moved away, the primary still emits its residual
    /// unless nothing of substance is left behind.
    fn settle_origin(&mut self, entry: &PoolEntry, removed_side: bool) {
        match entry.origin {
            Origin::Item { idx } => {
                if removed_side {
                    self.removed_items[idx].retired = true;
                } else {
                    self.added_items[idx].retired = true;
                }
            }
            Origin::Key { group, idx } => {
                let candidate = if removed_side {
                    &mut self.key_groups[group].removed[idx]
                } else {
                    &mut self.key_groups[group].added[idx]
                };
                if entry.path == candidate.path {
                    candidate.retired = true;
                    return;
                }
                let Some(relative) = entry.path.strip_prefix(&candidate.path) else {
                    return;
                };
                remove_at(&mut candidate.node, relative);
                if !candidate.node.value.has_move_content() {
                    candidate.retired = true;
                }
            }
        }
    }

    fn emit_residuals(&mut self) {
        let mut removals = Vec::new();
        let mut additions = Vec::new();

        for group in &self.key_groups {
            for removed in group.removed.iter().filter(|c| !c.retired) {
                let mut c = change(GenericChangeKind::KeyRemoved, removed.path.clone());
                c.old_path = Some(removed.path.clone());
                c.old_key = Some(removed.key.clone());
                c.old_value = Some(removed.node.clone());
                c.old_line = Some(removed.key_line);
                removals.push(c);
            }
            for added in group.added.iter().filter(|c| !c.retired) {
                let mut c = change(GenericChangeKind::KeyAdded, added.path.clone());
                c.new_path = Some(added.path.clone());
                c.new_key = Some(added.key.clone());
                c.new_value = Some(added.node.clone());
                c.new_line = Some(added.key_line);
                additions.push(c);
            }
        }
        for removed in self.removed_items.iter().filter(|c| !c.retired) {
            let mut c = change(GenericChangeKind::ItemRemoved, removed.path.clone());
            c.old_path = Some(removed.path.clone());
            c.old_value = Some(removed.node.clone());
            c.old_line = Some(removed.node.line);
            removals.push(c);
        }
        for added in self.added_items.iter().filter(|c| !c.retired) {
            let mut c = change(GenericChangeKind::ItemAdded, added.path.clone());
            c.new_path = Some(added.path.clone());
            c.new_value = Some(added.node.clone());
            c.new_line = Some(added.node.line);
            additions.push(c);
        }

        self.changes.extend(removals);
        self.changes.extend(additions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamdiff_core::parse;

    fn diff(old: &str, new: &str) -> Vec<GenericChange> {
        diff_with_rules(old, new, &[])
    }

    fn diff_with_rules(old: &str, new: &str, rules: &[IdentityRule]) -> Vec<GenericChange> {
        let old = parse(old).unwrap();
        let new = parse(new).unwrap();
        diff_generic(&old, &new, rules)
    }

    fn non_unchanged(changes: &[GenericChange]) -> Vec<&GenericChange> {
        changes
            .iter()
            .filter(|c| c.kind != GenericChangeKind::Unchanged)
            .collect()
    }

    #[test]
    fn test_identical_documents_only_unchanged() {
        let text = "a: 1\nb:\n  c: [1, 2]\n";
        let changes = diff(text, text);
        assert!(non_unchanged(&changes).is_empty());
        assert!(!changes.is_empty());
    }

    #[test]
    fn test_value_changed_with_lines() {
        let changes = diff("a: 1\nb: 2\n", "a: 1\nb: 3\n");
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].kind, GenericChangeKind::ValueChanged);
        assert_eq!(real[0].path.to_string(), "$.b");
        assert_eq!(real[0].old_line, Some(2));
        assert_eq!(real[0].new_line, Some(2));
    }

    #[test]
    fn test_type_changed_stops_descent() {
        let changes = diff("a:\n  b: 1\n", "a: scalar\n");
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].kind, GenericChangeKind::TypeChanged);
        assert_eq!(real[0].path.to_string(), "$.a");
    }

    #[test]
    fn test_int_to_float_is_value_change() {
        let changes = diff("a: 1\n", "a: 1.5\n");
        assert_eq!(non_unchanged(&changes)[0].kind, GenericChangeKind::ValueChanged);
    }

    #[test]
    fn test_int_to_string_is_type_change() {
        let changes = diff("a: 1\n", "a: \"1\"\n");
        assert_eq!(non_unchanged(&changes)[0].kind, GenericChangeKind::TypeChanged);
    }

    #[test]
    fn test_key_added_and_removed() {
        let changes = diff("a: 1\ngone: x\n", "a: 1\nfresh: y\n");
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 2);
        assert_eq!(real[0].kind, GenericChangeKind::KeyRemoved);
        assert_eq!(real[0].old_key.as_deref(), Some("gone"));
        assert!(real[0].new_path.is_none() && real[0].new_value.is_none());
        assert_eq!(real[1].kind, GenericChangeKind::KeyAdded);
        assert_eq!(real[1].new_key.as_deref(), Some("fresh"));
        assert!(real[1].old_path.is_none() && real[1].old_value.is_none());
    }

    #[test]
    fn test_scalar_rename_scenario() {
        // Spec scenario: {database: {host: db}} -> {database: {hostname: db}}
        let changes = diff("database:\n  host: db\n", "database:\n  hostname: db\n");
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        let rename = real[0];
        assert_eq!(rename.kind, GenericChangeKind::KeyRenamed);
        assert_eq!(rename.old_key.as_deref(), Some("host"));
        assert_eq!(rename.new_key.as_deref(), Some("hostname"));
        assert_eq!(rename.old_path.as_ref().unwrap().to_string(), "$.database.host");
        assert_eq!(rename.new_path.as_ref().unwrap().to_string(), "$.database.hostname");
    }

    #[test]
    fn test_key_move_scenario() {
        // Spec scenario: {config: {database: {...}}} -> {database: {...}}
        let changes = diff(
            "config:\n  database:\n    host: db\n",
            "database:\n  host: db\n",
        );
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        let moved = real[0];
        assert_eq!(moved.kind, GenericChangeKind::KeyMoved);
        assert_eq!(moved.old_path.as_ref().unwrap().to_string(), "$.config.database");
        assert_eq!(moved.new_path.as_ref().unwrap().to_string(), "$.database");
    }

    #[test]
    fn test_array_identity_match_scenario() {
        // Spec scenario: containers matched by name across reorder, one
        // image edit. No ADDED/REMOVED/MOVED on containers.
        let rules = vec![IdentityRule::new("containers", "name").unwrap()];
        let changes = diff_with_rules(
            "containers:\n  - name: web\n    image: nginx:1.19\n  - name: db\n    image: pg:14\n",
            "containers:\n  - name: db\n    image: pg:14\n  - name: web\n    image: nginx:1.21\n",
            &rules,
        );
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 2);
        assert_eq!(real[0].kind, GenericChangeKind::ItemChanged);
        assert_eq!(real[0].old_path.as_ref().unwrap().to_string(), "$.containers[0]");
        assert_eq!(real[0].new_path.as_ref().unwrap().to_string(), "$.containers[1]");
        assert_eq!(real[1].kind, GenericChangeKind::ValueChanged);
        assert_eq!(real[1].path.to_string(), "$.containers[1].image");
    }

    #[test]
    fn test_conditional_identity_scenario() {
        // Spec scenario: book matched by catalog_id under a conditional
        // rule, dvd left to the positional/similarity fallback.
        let rules = vec![IdentityRule::conditional("inventory", "catalog_id", "type", "book").unwrap()];
        let changes = diff_with_rules(
            "inventory:\n  - type: book\n    catalog_id: B1\n    title: A\n  - type: dvd\n    sku: D1\n",
            "inventory:\n  - type: dvd\n    sku: D1\n  - type: book\n    catalog_id: B1\n    title: B\n",
            &rules,
        );
        let real = non_unchanged(&changes);
        let item_changed: Vec<_> = real
            .iter()
            .filter(|c| c.kind == GenericChangeKind::ItemChanged)
            .collect();
        assert_eq!(item_changed.len(), 1);
        assert_eq!(item_changed[0].new_path.as_ref().unwrap().to_string(), "$.inventory[1]");
        assert!(!real.iter().any(|c| matches!(
            c.kind,
            GenericChangeKind::ItemAdded | GenericChangeKind::ItemRemoved | GenericChangeKind::ItemMoved
        )));
    }

    #[test]
    fn test_item_added_and_removed_order() {
        let changes = diff("items:\n  - alpha\n  - beta\n", "items:\n  - gamma delta epsilon\n");
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 3);
        assert_eq!(real[0].kind, GenericChangeKind::ItemRemoved);
        assert_eq!(real[0].path.to_string(), "$.items[0]");
        assert_eq!(real[1].kind, GenericChangeKind::ItemRemoved);
        assert_eq!(real[1].path.to_string(), "$.items[1]");
        assert_eq!(real[2].kind, GenericChangeKind::ItemAdded);
        assert_eq!(real[2].path.to_string(), "$.items[0]");
    }

    #[test]
    fn test_similarity_cascade_prefers_best_pair() {
        // Both old items resemble the single new item, the first only at
        // ~0.73, the second at ~0.91. The high-confidence pass must bind
        // the second one even though the first comes earlier.
        let old = "notes:\n  - alpha beta gamma delta epsilon zeta eta theta\n  - alpha beta gamma delta epsilon zeta eta theta iota kappa\n";
        let new = "notes:\n  - alpha beta gamma delta epsilon zeta eta theta iota kappa lambda\n";
        let changes = diff(old, new);
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 2);
        assert_eq!(real[0].kind, GenericChangeKind::ValueChanged);
        assert_eq!(real[0].old_path.as_ref().unwrap().to_string(), "$.notes[1]");
        assert_eq!(real[1].kind, GenericChangeKind::ItemRemoved);
        assert_eq!(real[1].old_path.as_ref().unwrap().to_string(), "$.notes[0]");
    }

    #[test]
    fn test_item_moved_across_arrays_by_identity() {
        let changes = diff(
            "front:\n  - name: web\n    image: nginx\nback: []\n",
            "front: []\nback:\n  - name: web\n    image: nginx\n",
        );
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].kind, GenericChangeKind::ItemMoved);
        assert_eq!(real[0].old_path.as_ref().unwrap().to_string(), "$.front[0]");
        assert_eq!(real[0].new_path.as_ref().unwrap().to_string(), "$.back[0]");
    }

    #[test]
    fn test_empty_content_never_moves() {
        let changes = diff(
            "a:\n  - \"\"\nb: []\n",
            "a: []\nb:\n  - \"\"\n",
        );
        let real = non_unchanged(&changes);
        assert!(real.iter().all(|c| c.kind != GenericChangeKind::ItemMoved));
        assert!(real.iter().any(|c| c.kind == GenericChangeKind::ItemRemoved));
        assert!(real.iter().any(|c| c.kind == GenericChangeKind::ItemAdded));
    }

    #[test]
    fn test_rename_dominates_add_remove() {
        let old = "settings:\n  primary_host: alpha beta gamma delta\n";
        let new = "settings:\n  main_host: alpha beta gamma delta\n";
        let changes = diff(old, new);
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].kind, GenericChangeKind::KeyRenamed);
    }

    #[test]
    fn test_item_changed_wraps_candidate_only_differences() {
        // The matched item differs only by a removed key; the wrapper
        // must still mark the item as changed.
        let rules = vec![IdentityRule::new("containers", "name").unwrap()];
        let changes = diff_with_rules(
            "containers:\n  - name: web\n    debug: true\n",
            "containers:\n  - name: web\n",
            &rules,
        );
        let real = non_unchanged(&changes);
        assert!(real.iter().any(|c| c.kind == GenericChangeKind::ItemChanged));
        assert!(real.iter().any(|c| c.kind == GenericChangeKind::KeyRemoved));
    }

    #[test]
    fn test_scalar_duplicates_fall_through_positionally() {
        let changes = diff("nums: [1, 1, 1]\n", "nums: [1, 1]\n");
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].kind, GenericChangeKind::ItemRemoved);
    }

    #[test]
    fn test_determinism() {
        let old = "a: {x: 1, y: 2}\nitems: [{name: a}, {name: b}]\ngone: value\n";
        let new = "a: {x: 2, y: 2}\nitems: [{name: b}, {name: c}]\nfresh: value\n";
        let first = diff(old, new);
        let second = diff(old, new);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.path, b.path);
            assert_eq!(a.old_path, b.old_path);
            assert_eq!(a.new_path, b.new_path);
            // Change ids are fresh per invocation
            assert_ne!(a.id, b.id);
        }
    }

    #[test]
    fn test_symmetry_of_adds_and_removes() {
        let old = "a: 1\ngone: x\nitems: [only-here]\n";
        let new = "a: 1\nfresh: y\nitems: []\n";
        let forward = diff(old, new);
        let backward = diff(new, old);

        let count = |changes: &[GenericChange], kind: GenericChangeKind| {
            changes.iter().filter(|c| c.kind == kind).count()
        };
        assert_eq!(
            count(&forward, GenericChangeKind::KeyAdded),
            count(&backward, GenericChangeKind::KeyRemoved)
        );
        assert_eq!(
            count(&forward, GenericChangeKind::KeyRemoved),
            count(&backward, GenericChangeKind::KeyAdded)
        );
        assert_eq!(
            count(&forward, GenericChangeKind::ItemRemoved),
            count(&backward, GenericChangeKind::ItemAdded)
        );
    }

    #[test]
    fn test_unchanged_records_carry_equal_values() {
        let changes = diff("a: 1\nb: two\n", "a: 1\nb: two\n");
        for c in &changes {
            assert_eq!(c.kind, GenericChangeKind::Unchanged);
            assert_eq!(c.old_value, c.new_value);
        }
    }

    #[test]
    fn test_root_scalar_diff() {
        let changes = diff("hello\n", "world\n");
        let real = non_unchanged(&changes);
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].path.to_string(), "$");
    }

    #[test]
    fn test_empty_containers_count_as_unchanged() {
        let changes = diff("a: {}\nb: []\n", "a: {}\nb: []\n");
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.kind == GenericChangeKind::Unchanged));
    }
}
