//! Identity resolution for sequence items
//!
//! Given an array and the configured identity rules, works out which
//! field identifies each item. Conditional rules are consulted first
//! (first match in input order wins), then unconditional rules, then a
//! built-in auto-detect list. Two items with the same
//! `(field, canonical value)` pair are considered the same entity.

use yamdiff_core::{IdentityRule, Mapping, Node, Value};

/// `(field, canonical value)` pair equating two items
pub type IdentityKey = (String, String);

/// Fields tried by auto-detection, in priority order. The first field
/// present with a non-null scalar in every mapping item wins.
pub const AUTO_IDENTITY_FIELDS: &[&str] = &["id", "_id", "uuid", "key", "name", "host", "hostname"];

/// Resolve an identity key for every item of an array.
///
/// `array_name` is the immediate parent key of the array, compared
/// case-sensitively against rule names; arrays without a parent key
/// (root arrays, arrays inside arrays) can only auto-detect.
pub fn identify(
    array_name: Option<&str>,
    items: &[Node],
    rules: &[IdentityRule],
) -> Vec<Option<IdentityKey>> {
    let applicable: Vec<&IdentityRule> = match array_name {
        Some(name) => rules.iter().filter(|r| r.array_name == name).collect(),
        None => Vec::new(),
    };
    let conditional: Vec<&IdentityRule> = applicable
        .iter()
        .copied()
        .filter(|r| r.is_conditional())
        .collect();
    let unconditional: Vec<&IdentityRule> = applicable
        .iter()
        .copied()
        .filter(|r| !r.is_conditional())
        .collect();

    let auto_field = detect_auto_field(items);

    items
        .iter()
        .map(|item| {
            let map = item.value.as_map()?;

            for rule in &conditional {
                let (Some(when_field), Some(when_value)) = (&rule.when_field, &rule.when_value)
                else {
                    continue;
                };
                let matches = map
                    .get(when_field)
                    .and_then(|n| n.value.scalar_text())
                    .is_some_and(|text| text == *when_value);
                if matches {
                    return extract(map, &rule.identity_field);
                }
            }

            if let Some(rule) = unconditional.first() {
                return extract(map, &rule.identity_field);
            }

            auto_field.and_then(|field| extract(map, field))
        })
        .collect()
}

fn detect_auto_field(items: &[Node]) -> Option<&'static str> {
    let maps: Vec<&Mapping> = items.iter().filter_map(|n| n.value.as_map()).collect();
    if maps.is_empty() {
        return None;
    }
    AUTO_IDENTITY_FIELDS.iter().copied().find(|field| {
        maps.iter().all(|map| {
            map.get(field)
                .is_some_and(|n| n.value.is_scalar() && !matches!(n.value, Value::Null))
        })
    })
}

fn extract(map: &Mapping, field: &str) -> Option<IdentityKey> {
    let node = map.get(field)?;
    if matches!(node.value, Value::Null) {
        return None;
    }
    let text = node.value.scalar_text()?;
    Some((field.to_string(), text))
}
