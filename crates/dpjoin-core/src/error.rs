//! Error types for query parsing and join-subset enumeration.
//!
//! # Error handling strategy
//!
//! - [`QueryError`]: everything that can go wrong turning one raw query string into
//!   relations, a join graph, and a predicate set. Returned as `Result<T, QueryError>`
//!   and stops processing of that one query; the driver moves on to the next.
//! - [`EnumeratorError`]: internal invariant violations in the DP enumerator or the
//!   join-graph closure. These should never occur for a graph built by this crate's own
//!   parser; they exist so a caller that feeds a hand-built [`crate::JoinGraph`] gets a
//!   typed error instead of a panic.

use thiserror::Error;

/// Errors encountered while turning one query string into a [`crate::ParsedQuery`].
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to parse query: {0}")]
    Sql(#[from] sqlparser::parser::ParserError),

    #[error("query has no relations")]
    NoRelations,

    #[error("unsupported query shape: {0}")]
    UnsupportedShape(String),

    #[error(transparent)]
    Enumeration(#[from] EnumeratorError),
}

/// Internal invariant violations in the join graph or enumerator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnumeratorError {
    #[error("connected subset {0:?} has no witness decomposition")]
    NoWitnessDecomposition(Vec<String>),

    #[error("column-aware transitive closure did not reach a fixed point within {0} iterations")]
    ClosureDidNotConverge(usize),

    #[error("renderer could not find a next relation to attach for connected subset {0:?}")]
    NoAttachableRelation(Vec<String>),
}
