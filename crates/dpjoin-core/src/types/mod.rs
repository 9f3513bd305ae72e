//! Core data types shared across the join-graph, enumerator, and renderer.

mod join;
mod plan;
mod predicate;
mod relation;

pub use join::{edge_key, EdgeKey, JoinDetail, JoinOrigin};
pub(crate) use join::DELIM;
pub use plan::{CanonicalKey, EnumerationCounts, EnumerationPlan, EnumerationResult};
pub use predicate::{PredicateBucket, PredicateRecord};
pub use relation::{Dialect, QualifiedColumn, RelationAlias};
