//! Enumeration plans and per-level counts produced by the DP enumerator.

use std::collections::{BTreeMap, BTreeSet};

use super::relation::RelationAlias;

/// The deterministic string form of a subset, used as the DP admitted-set key.
/// Sorted aliases joined by [`crate::types::join::DELIM`].
pub type CanonicalKey = String;

/// One admitted subset: its members, the decomposition that witnessed it (absent for
/// singletons), and the rendered counting query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationPlan {
    pub subset: BTreeSet<RelationAlias>,
    pub left: Option<BTreeSet<RelationAlias>>,
    pub right: Option<BTreeSet<RelationAlias>>,
    pub rendered_sql: String,
}

impl EnumerationPlan {
    pub fn is_singleton(&self) -> bool {
        self.subset.len() == 1
    }
}

/// Number of admitted subsets at each level (subset cardinality).
pub type EnumerationCounts = BTreeMap<usize, usize>;

/// The full output of one enumerator run: plans in emission order, plus per-level counts.
#[derive(Debug, Clone, Default)]
pub struct EnumerationResult {
    pub plans: Vec<EnumerationPlan>,
    pub counts: EnumerationCounts,
}
