//! Level-ordered dynamic-programming enumerator over connected join subsets.

use std::collections::BTreeSet;

use crate::graph::JoinGraph;
use crate::types::{CanonicalKey, EnumerationPlan, EnumerationResult, RelationAlias};

/// Enumerates every connected subset of `tables`, level by level (size 1, 2, 3, ...),
/// admitting a subset only once it has a witnessed decomposition into two smaller
/// already-admitted subsets that the join graph says can join.
pub struct Enumerator<'a> {
    graph: &'a JoinGraph,
    admitted: BTreeSet<CanonicalKey>,
}

impl<'a> Enumerator<'a> {
    pub fn new(graph: &'a JoinGraph) -> Self {
        Self {
            graph,
            admitted: BTreeSet::new(),
        }
    }

    /// Runs the full enumeration. `max_level` is clamped to `tables.len()`; `tables` is
    /// sorted internally so output order is deterministic regardless of input order.
    pub fn enumerate(&mut self, tables: &[RelationAlias], max_level: usize) -> EnumerationResult {
        let mut tables: Vec<RelationAlias> = tables.to_vec();
        tables.sort();

        self.admitted.clear();
        let mut result = EnumerationResult::default();
        let max_level = max_level.min(tables.len());

        for level in 1..=max_level {
            let mut added = 0;
            for subset in k_combinations(&tables, level) {
                if !self.graph.is_connected(&subset) {
                    continue;
                }

                if level == 1 {
                    self.admit(&mut result, subset, None, None);
                    added += 1;
                } else if let Some((left, right)) = self.find_decomposition(&subset) {
                    self.admit(&mut result, subset, Some(left), Some(right));
                    added += 1;
                }
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(level, added, "enumeration level complete");

            result.counts.insert(level, added);
        }

        result
    }

    /// Tries every split size and every left-subset at that size, in sorted order, and
    /// returns the first split whose two halves are already admitted and can join.
    fn find_decomposition(
        &self,
        subset: &BTreeSet<RelationAlias>,
    ) -> Option<(BTreeSet<RelationAlias>, BTreeSet<RelationAlias>)> {
        let members: Vec<RelationAlias> = subset.iter().cloned().collect();
        let n = members.len();

        for left_size in 1..n {
            for left in k_combinations(&members, left_size) {
                let right: BTreeSet<RelationAlias> = subset.difference(&left).cloned().collect();

                if !self.admitted.contains(&canonical_key(&left))
                    || !self.admitted.contains(&canonical_key(&right))
                {
                    continue;
                }

                if self.graph.can_join(&left, &right) {
                    return Some((left, right));
                }
            }
        }

        None
    }

    fn admit(
        &mut self,
        result: &mut EnumerationResult,
        subset: BTreeSet<RelationAlias>,
        left: Option<BTreeSet<RelationAlias>>,
        right: Option<BTreeSet<RelationAlias>>,
    ) {
        self.admitted.insert(canonical_key(&subset));
        result.plans.push(EnumerationPlan {
            subset,
            left,
            right,
            rendered_sql: String::new(),
        });
    }
}

/// Sorted join of the subset's members, delimited the same way as join-graph edge keys.
pub fn canonical_key(subset: &BTreeSet<RelationAlias>) -> CanonicalKey {
    subset.iter().cloned().collect::<Vec<_>>().join(crate::types::DELIM)
}

/// All size-`k` subsets of `items` (already sorted), each returned as a sorted `BTreeSet`,
/// generated in lexicographic combination order. No external combinatorics crate needed
/// at this scale.
fn k_combinations(items: &[RelationAlias], k: usize) -> Vec<BTreeSet<RelationAlias>> {
    let n = items.len();
    if k == 0 || k > n {
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut indices: Vec<usize> = (0..k).collect();

    loop {
        result.push(indices.iter().map(|&i| items[i].clone()).collect());

        let mut i = k;
        loop {
            if i == 0 {
                return result;
            }
            i -= 1;
            if indices[i] != i + n - k {
                break;
            }
        }
        indices[i] += 1;
        for j in (i + 1)..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}
