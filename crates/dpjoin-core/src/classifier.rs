//! Predicate classifier: buckets predicates by relation arity and answers
//! "which predicates apply to subset S?" queries.

use std::collections::BTreeSet;

use crate::types::{PredicateBucket, PredicateRecord, RelationAlias};

/// Three predicate lists applicable to a given subset of relations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubsetPredicates {
    pub selections: Vec<String>,
    pub joins: Vec<String>,
    pub complex: Vec<String>,
}

/// Accumulates predicates during the build phase of one query, then answers
/// subset-restricted lookups. Insertion order is preserved within each bucket.
#[derive(Debug, Clone, Default)]
pub struct PredicateClassifier {
    records: Vec<PredicateRecord>,
}

impl PredicateClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one atomic predicate with the relations it references. Bucketing by arity
    /// happens immediately; there is no separate finalization step to forget to call.
    pub fn add_predicate(&mut self, text: impl Into<String>, relations: BTreeSet<RelationAlias>) {
        self.records.push(PredicateRecord::new(text, relations));
    }

    /// Returns every stored predicate whose relation set is a subset of `subset`,
    /// grouped into selections / joins / complex, preserving insertion order.
    pub fn predicates_for_subset(&self, subset: &BTreeSet<RelationAlias>) -> SubsetPredicates {
        let mut result = SubsetPredicates::default();
        for record in &self.records {
            if !record.relations.is_subset(subset) {
                continue;
            }
            match record.bucket {
                PredicateBucket::Selection => result.selections.push(record.text.clone()),
                PredicateBucket::Join => result.joins.push(record.text.clone()),
                PredicateBucket::Complex => result.complex.push(record.text.clone()),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rels(names: &[&str]) -> BTreeSet<RelationAlias> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn buckets_by_arity() {
        let mut c = PredicateClassifier::new();
        c.add_predicate("a.x > 10", rels(&["a"]));
        c.add_predicate("a.x = b.y", rels(&["a", "b"]));
        c.add_predicate("a.x = b.y + c.z", rels(&["a", "b", "c"]));

        let preds = c.predicates_for_subset(&rels(&["a", "b", "c"]));
        assert_eq!(preds.selections, vec!["a.x > 10"]);
        assert_eq!(preds.joins, vec!["a.x = b.y"]);
        assert_eq!(preds.complex, vec!["a.x = b.y + c.z"]);
    }

    #[test]
    fn restricts_to_subset() {
        let mut c = PredicateClassifier::new();
        c.add_predicate("a.x > 10", rels(&["a"]));
        c.add_predicate("b.y > 10", rels(&["b"]));
        c.add_predicate("a.x = b.y", rels(&["a", "b"]));

        let preds = c.predicates_for_subset(&rels(&["a"]));
        assert_eq!(preds.selections, vec!["a.x > 10"]);
        assert!(preds.joins.is_empty());
    }

    #[test]
    fn preserves_insertion_order_and_is_deterministic() {
        let mut c = PredicateClassifier::new();
        c.add_predicate("a.x > 1", rels(&["a"]));
        c.add_predicate("a.y > 2", rels(&["a"]));
        c.add_predicate("a.z > 3", rels(&["a"]));

        let subset = rels(&["a"]);
        let first = c.predicates_for_subset(&subset);
        let second = c.predicates_for_subset(&subset);
        assert_eq!(first, second);
        assert_eq!(first.selections, vec!["a.x > 1", "a.y > 2", "a.z > 3"]);
    }
}
