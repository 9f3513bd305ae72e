//! Join graph: asserted/derived edges, column-aware transitive closure, and the
//! equivalence-class connectivity queries built on top of them.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use regex::Regex;
use std::sync::OnceLock;

use crate::classifier::PredicateClassifier;
use crate::error::EnumeratorError;
use crate::types::{edge_key, EdgeKey, JoinDetail, JoinOrigin, QualifiedColumn, RelationAlias};

/// Closure iterations are capped to guard against a malformed graph spinning forever;
/// any well-formed input converges in far fewer passes.
const CLOSURE_ITERATION_CAP: usize = 10;

/// Accumulates equi-join knowledge for one query: asserted edges, derived edges, and
/// the equivalence classes their column-level equalities induce.
#[derive(Debug, Clone, Default)]
pub struct JoinGraph {
    details: BTreeMap<EdgeKey, Vec<JoinDetail>>,
    classes: Vec<BTreeSet<QualifiedColumn>>,
}

impl JoinGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests an asserted (or externally-derived) equi-join. Canonicalizes relation
    /// order so that calling with the two relations swapped yields the same stored
    /// detail, regardless of which order the caller discovered them in.
    pub fn add_join(
        &mut self,
        t1: impl Into<String>,
        t2: impl Into<String>,
        t1_col: impl Into<String>,
        t2_col: impl Into<String>,
        origin: JoinOrigin,
    ) {
        let (t1, t2, t1_col, t2_col) = (t1.into(), t2.into(), t1_col.into(), t2_col.into());
        if t1 == t2 {
            return; // no self-edges on a single alias
        }
        let key = edge_key(&t1, &t2);
        let detail = JoinDetail::normalized(t1, t1_col, t2, t2_col, origin);
        let bucket = self.details.entry(key).or_default();
        if !bucket.iter().any(|d| *d == detail) {
            bucket.push(detail);
        }
    }

    /// Scans the classifier's single-relation selections for `relation.col = constant`
    /// or `relation.col IN (constant)` facts (exactly one value; outer quotes and
    /// trailing `::type` casts stripped) and derives an edge between every pair of
    /// relations that share the same `(column, value)` fact. Returns the number of
    /// derived edges added.
    pub fn ingest_constant_equality(
        &mut self,
        classifier: &PredicateClassifier,
        relations: &[RelationAlias],
    ) -> usize {
        // Map: "column:normalized_value" -> relations asserting it, in relation order.
        let mut groups: HashMap<(String, String), Vec<RelationAlias>> = HashMap::new();

        for relation in relations {
            let singleton: BTreeSet<RelationAlias> = [relation.clone()].into_iter().collect();
            let preds = classifier.predicates_for_subset(&singleton);
            for text in &preds.selections {
                if let Some((column, value)) = extract_single_constant_value(text) {
                    groups
                        .entry((column, value))
                        .or_default()
                        .push(relation.clone());
                }
            }
        }

        let mut added = 0;
        let mut keys: Vec<_> = groups.keys().cloned().collect();
        keys.sort();
        for key in keys {
            let members = &groups[&key];
            let (column, _) = &key;
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    let before = self.details.get(&edge_key(&members[i], &members[j])).map(Vec::len).unwrap_or(0);
                    self.add_join(
                        members[i].clone(),
                        members[j].clone(),
                        column.clone(),
                        column.clone(),
                        JoinOrigin::Derived,
                    );
                    let after = self.details.get(&edge_key(&members[i], &members[j])).map(Vec::len).unwrap_or(0);
                    if after > before {
                        added += 1;
                    }
                }
            }
        }
        added
    }

    /// Iterates column-aware transitive closure to a fixed point. Four per-pair cases
    /// (one per matching-end combination) derive a new detail between the two endpoints
    /// not shared between `d1` and `d2`, skipping self-edges and already-present details.
    pub fn compute_transitive_closure(&mut self) -> Result<usize, EnumeratorError> {
        let mut total_added = 0;

        for _iteration in 0..CLOSURE_ITERATION_CAP {
            let mut discovered = Vec::new();
            let current: Vec<JoinDetail> = self.details.values().flatten().cloned().collect();

            for d1 in &current {
                for d2 in &current {
                    if let Some(candidate) = try_compose(d1, d2) {
                        if candidate.t1 == candidate.t2 {
                            continue;
                        }
                        if !self.detail_exists(&candidate) {
                            discovered.push(candidate);
                        }
                    }
                }
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(iteration = _iteration, discovered = discovered.len(), "closure pass");

            if discovered.is_empty() {
                return Ok(total_added);
            }

            for detail in discovered {
                if !self.detail_exists(&detail) {
                    let key = edge_key(&detail.t1, &detail.t2);
                    self.details.entry(key).or_default().push(detail);
                    total_added += 1;
                }
            }
        }

        // One more pass to distinguish "converged exactly at the cap" from "still growing".
        let current: Vec<JoinDetail> = self.details.values().flatten().cloned().collect();
        for d1 in &current {
            for d2 in &current {
                if let Some(candidate) = try_compose(d1, d2) {
                    if candidate.t1 != candidate.t2 && !self.detail_exists(&candidate) {
                        return Err(EnumeratorError::ClosureDidNotConverge(CLOSURE_ITERATION_CAP));
                    }
                }
            }
        }
        Ok(total_added)
    }

    fn detail_exists(&self, candidate: &JoinDetail) -> bool {
        self.details
            .get(&edge_key(&candidate.t1, &candidate.t2))
            .is_some_and(|existing| existing.iter().any(|d| *d == *candidate))
    }

    /// Rebuilds the equivalence-class partition from the current detail set. Must be
    /// called after any edge mutation before connectivity queries are trusted.
    pub fn build_equivalence_classes(&mut self) {
        let mut uf = UnionFind::new();
        for detail in self.details.values().flatten() {
            uf.union(detail.left_column(), detail.right_column());
        }
        self.classes = uf.classes();
    }

    pub fn details_for(&self, r1: &str, r2: &str) -> &[JoinDetail] {
        self.details
            .get(&edge_key(r1, r2))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn in_same_class(&self, r1: &str, r2: &str) -> bool {
        self.classes.iter().any(|class| {
            let has1 = class.iter().any(|qc| qc.relation == r1);
            let has2 = class.iter().any(|qc| qc.relation == r2);
            has1 && has2
        })
    }

    /// BFS via `in_same_class`, FIFO frontier, no revisits.
    pub fn is_connected(&self, subset: &BTreeSet<RelationAlias>) -> bool {
        if subset.len() <= 1 {
            return true;
        }
        let start = subset.iter().next().unwrap();
        let mut visited: BTreeSet<&RelationAlias> = BTreeSet::new();
        visited.insert(start);
        let mut frontier: VecDeque<&RelationAlias> = VecDeque::new();
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            for other in subset {
                if !visited.contains(other) && self.in_same_class(current, other) {
                    visited.insert(other);
                    frontier.push_back(other);
                }
            }
        }

        visited.len() == subset.len()
    }

    pub fn can_join(&self, left: &BTreeSet<RelationAlias>, right: &BTreeSet<RelationAlias>) -> bool {
        left.iter()
            .any(|l| right.iter().any(|r| self.in_same_class(l, r)))
    }
}

/// Tries to compose two join details into a transitive detail, matching on a shared
/// relation *and* shared column at that relation. Four cases, one per end-combination.
fn try_compose(d1: &JoinDetail, d2: &JoinDetail) -> Option<JoinDetail> {
    // d1.t2 == d2.t1 (matching columns)
    if d1.t2 == d2.t1 && d1.t2_col == d2.t1_col {
        return Some(JoinDetail::normalized(
            d1.t1.clone(),
            d1.t1_col.clone(),
            d2.t2.clone(),
            d2.t2_col.clone(),
            JoinOrigin::Derived,
        ));
    }
    // d1.t2 == d2.t2
    if d1.t2 == d2.t2 && d1.t2_col == d2.t2_col {
        return Some(JoinDetail::normalized(
            d1.t1.clone(),
            d1.t1_col.clone(),
            d2.t1.clone(),
            d2.t1_col.clone(),
            JoinOrigin::Derived,
        ));
    }
    // d1.t1 == d2.t1
    if d1.t1 == d2.t1 && d1.t1_col == d2.t1_col {
        return Some(JoinDetail::normalized(
            d1.t2.clone(),
            d1.t2_col.clone(),
            d2.t2.clone(),
            d2.t2_col.clone(),
            JoinOrigin::Derived,
        ));
    }
    // d1.t1 == d2.t2
    if d1.t1 == d2.t2 && d1.t1_col == d2.t2_col {
        return Some(JoinDetail::normalized(
            d1.t2.clone(),
            d1.t2_col.clone(),
            d2.t1.clone(),
            d2.t1_col.clone(),
            JoinOrigin::Derived,
        ));
    }
    None
}

/// Extracts a single constant value from a selection predicate's rendered text, per the
/// constant-equality derivation rule: `relation.col = constant` or a one-element IN-list.
/// Multi-value IN-lists, inequalities, pattern matches, and null tests yield `None`.
fn extract_single_constant_value(predicate: &str) -> Option<(String, String)> {
    static EQ_RE: OnceLock<Regex> = OnceLock::new();
    static IN_RE: OnceLock<Regex> = OnceLock::new();

    let eq_re = EQ_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*\w+\.(\w+)\s*=\s*(.+?)\s*$").expect("valid regex")
    });
    let in_re = IN_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*\w+\.(\w+)\s+IN\s*\(([^)]+)\)\s*$").expect("valid regex")
    });

    if let Some(caps) = eq_re.captures(predicate) {
        let column = caps.get(1)?.as_str().to_string();
        let value = normalize_value(caps.get(2)?.as_str());
        return Some((column, value));
    }

    if let Some(caps) = in_re.captures(predicate) {
        let column = caps.get(1)?.as_str().to_string();
        let list = caps.get(2)?.as_str();
        let values: Vec<&str> = list.split(',').map(str::trim).collect();
        if values.len() == 1 {
            return Some((column, normalize_value(values[0])));
        }
    }

    None
}

fn normalize_value(raw: &str) -> String {
    static CAST_RE: OnceLock<Regex> = OnceLock::new();
    let cast_re = CAST_RE.get_or_init(|| Regex::new(r"::\w+$").expect("valid regex"));

    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(trimmed);
    cast_re.replace(unquoted, "").trim().to_string()
}

/// Iterative union-find over qualified columns, indexed by the column's string form.
/// Path compression is a two-pass walk-then-compress to avoid recursion depth limits
/// on pathological chains.
struct UnionFind {
    parent: BTreeMap<QualifiedColumn, QualifiedColumn>,
    rank: BTreeMap<QualifiedColumn, usize>,
}

impl UnionFind {
    fn new() -> Self {
        Self {
            parent: BTreeMap::new(),
            rank: BTreeMap::new(),
        }
    }

    fn ensure(&mut self, x: &QualifiedColumn) {
        self.parent.entry(x.clone()).or_insert_with(|| x.clone());
        self.rank.entry(x.clone()).or_insert(0);
    }

    fn find(&mut self, x: &QualifiedColumn) -> QualifiedColumn {
        self.ensure(x);
        let mut root = x.clone();
        while self.parent[&root] != root {
            root = self.parent[&root].clone();
        }
        let mut current = x.clone();
        while self.parent[&current] != current {
            let next = self.parent[&current].clone();
            self.parent.insert(current, root.clone());
            current = next;
        }
        root
    }

    fn union(&mut self, a: QualifiedColumn, b: QualifiedColumn) {
        let root_a = self.find(&a);
        let root_b = self.find(&b);
        if root_a == root_b {
            return;
        }
        let rank_a = self.rank[&root_a];
        let rank_b = self.rank[&root_b];
        if rank_a < rank_b {
            self.parent.insert(root_a, root_b);
        } else if rank_a > rank_b {
            self.parent.insert(root_b, root_a);
        } else {
            self.parent.insert(root_b, root_a.clone());
            *self.rank.get_mut(&root_a).unwrap() += 1;
        }
    }

    fn classes(&mut self) -> Vec<BTreeSet<QualifiedColumn>> {
        let columns: Vec<QualifiedColumn> = self.parent.keys().cloned().collect();
        let mut groups: BTreeMap<QualifiedColumn, BTreeSet<QualifiedColumn>> = BTreeMap::new();
        for column in columns {
            let root = self.find(&column);
            groups.entry(root).or_default().insert(column);
        }
        groups.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<RelationAlias> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_join_normalizes_reversed_order() {
        let mut g = JoinGraph::new();
        g.add_join("b", "a", "y", "x", JoinOrigin::Asserted);
        let details = g.details_for("a", "b");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].t1, "a");
        assert_eq!(details[0].t1_col, "x");
        assert_eq!(details[0].t2, "b");
        assert_eq!(details[0].t2_col, "y");
    }

    #[test]
    fn transitive_closure_is_column_aware() {
        // A.x=B.y AND B.z=C.w must NOT derive any A-C edge (different column on B).
        let mut g = JoinGraph::new();
        g.add_join("A", "B", "x", "y", JoinOrigin::Asserted);
        g.add_join("B", "C", "z", "w", JoinOrigin::Asserted);
        g.compute_transitive_closure().unwrap();
        assert!(g.details_for("A", "C").is_empty());
    }

    #[test]
    fn transitive_closure_derives_on_shared_column() {
        // A.x=B.y AND B.y=C.z => A.x=C.z
        let mut g = JoinGraph::new();
        g.add_join("A", "B", "x", "y", JoinOrigin::Asserted);
        g.add_join("B", "C", "y", "z", JoinOrigin::Asserted);
        g.compute_transitive_closure().unwrap();
        let details = g.details_for("A", "C");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].origin, JoinOrigin::Derived);
        assert_eq!(details[0].t1_col, "x");
        assert_eq!(details[0].t2_col, "z");
    }

    #[test]
    fn closure_is_a_fixed_point() {
        let mut g = JoinGraph::new();
        g.add_join("A", "B", "x", "y", JoinOrigin::Asserted);
        g.add_join("B", "C", "y", "z", JoinOrigin::Asserted);
        g.compute_transitive_closure().unwrap();
        let before = g.details.values().map(Vec::len).sum::<usize>();
        g.compute_transitive_closure().unwrap();
        let after = g.details.values().map(Vec::len).sum::<usize>();
        assert_eq!(before, after);
    }

    #[test]
    fn constant_equality_derives_pairwise_edges() {
        let mut classifier = PredicateClassifier::new();
        classifier.add_predicate("it1.info = 'rating'", set(&["it1"]));
        classifier.add_predicate("it2.info = 'rating'", set(&["it2"]));

        let mut g = JoinGraph::new();
        let relations = vec!["it1".to_string(), "it2".to_string()];
        let added = g.ingest_constant_equality(&classifier, &relations);
        assert_eq!(added, 1);

        let details = g.details_for("it1", "it2");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].origin, JoinOrigin::Derived);
        assert_eq!(details[0].t1_col, "info");
    }

    #[test]
    fn multi_value_in_list_does_not_derive() {
        let mut classifier = PredicateClassifier::new();
        classifier.add_predicate("a.type IN ('x', 'y')", set(&["a"]));
        classifier.add_predicate("b.type IN ('x', 'y')", set(&["b"]));

        let mut g = JoinGraph::new();
        let added = g.ingest_constant_equality(&classifier, &["a".to_string(), "b".to_string()]);
        assert_eq!(added, 0);
        assert!(g.details_for("a", "b").is_empty());
    }

    #[test]
    fn connectivity_via_equivalence_classes() {
        let mut g = JoinGraph::new();
        g.add_join("A", "B", "x", "y", JoinOrigin::Asserted);
        g.build_equivalence_classes();

        assert!(g.in_same_class("A", "B"));
        assert!(g.is_connected(&set(&["A", "B"])));
        assert!(!g.is_connected(&set(&["A", "C"])));
        assert!(g.can_join(&set(&["A"]), &set(&["B"])));
    }
}
