//! Word-set similarity kernel
//!
//! The single source of truth for every "similar enough" decision in
//! both engines: word-set Jaccard over canonical textual projections.
//! Tokens are split on Unicode whitespace and compared case-sensitively
//! (content may be Hebrew or otherwise case-significant).

use std::collections::HashSet;
use yamdiff_core::Node;

/// Similarity of two values in `[0, 1]`.
pub fn similarity(a: &Node, b: &Node) -> f64 {
    text_similarity(&a.value.projection(), &b.value.projection())
}

/// Word-set Jaccard of two texts. Both empty is `1.0`; exactly one
/// empty is `0.0`.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use yamdiff_core::parse;

    #[test]
    fn test_identical_texts() {
        assert_eq!(text_similarity("a b c", "a b c"), 1.0);
    }

    #[test]
    fn test_disjoint_texts() {
        assert_eq!(text_similarity("a b", "c d"), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // {a, b, c} vs {b, c, d}: 2 shared of 4 total
        assert_eq!(text_similarity("a b c", "b c d"), 0.5);
    }

    #[test]
    fn test_empty_edge_cases() {
        assert_eq!(text_similarity("", ""), 1.0);
        assert_eq!(text_similarity("   ", "\t\n"), 1.0);
        assert_eq!(text_similarity("a", ""), 0.0);
        assert_eq!(text_similarity("", "a"), 0.0);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(text_similarity("Alpha", "alpha"), 0.0);
    }

    #[test]
    fn test_multiset_collapses_to_set() {
        assert_eq!(text_similarity("a a a", "a"), 1.0);
    }

    #[test]
    fn test_symmetric_on_values() {
        let a = parse("name: web\nimage: nginx\n").unwrap();
        let b = parse("name: web\nimage: caddy\n").unwrap();
        assert_eq!(similarity(&a, &b), similarity(&b, &a));
    }

    #[test]
    fn test_hebrew_tokens() {
        let sim = text_similarity("כבוד האדם וחירותו", "כבוד האדם");
        assert!(sim > 0.6 && sim < 0.7);
    }
}
