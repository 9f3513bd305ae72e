pub mod classifier;
pub mod enumerator;
pub mod error;
pub mod graph;
pub mod parser;
pub mod renderer;
pub mod types;

pub use classifier::{PredicateClassifier, SubsetPredicates};
pub use enumerator::{canonical_key, Enumerator};
pub use error::{EnumeratorError, QueryError};
pub use graph::JoinGraph;
pub use parser::{parse_query, parse_sql, parse_sql_with_dialect, ParsedQuery};
pub use renderer::RenderContext;
pub use types::{
    CanonicalKey, Dialect, EdgeKey, EnumerationCounts, EnumerationPlan, EnumerationResult,
    JoinDetail, JoinOrigin, PredicateBucket, PredicateRecord, QualifiedColumn, RelationAlias,
};

/// Main entry point: parses one query string and enumerates every connected join
/// subset up to `max_level` relations, with each plan's counting SQL already rendered.
///
/// `max_level` is clamped to the query's relation count internally, so passing a large
/// value (or `usize::MAX`) enumerates the full query.
pub fn enumerate_query(sql: &str, dialect: Dialect, max_level: usize) -> Result<EnumerationResult, QueryError> {
    let parsed = parser::parse_query(sql, dialect)?;

    let mut enumerator = Enumerator::new(&parsed.graph);
    let mut result = enumerator.enumerate(&parsed.tables, max_level);

    let ctx = RenderContext {
        aliases: &parsed.aliases,
        classifier: &parsed.classifier,
        graph: &parsed.graph,
    };

    for plan in &mut result.plans {
        plan.rendered_sql = ctx.render(&plan.subset, plan.left.as_ref(), plan.right.as_ref())?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_and_renders_a_three_way_join() {
        let sql = "SELECT * FROM orders o \
                   JOIN customers c ON o.customer_id = c.id \
                   JOIN regions r ON c.region_id = r.id \
                   WHERE c.active = true";
        let result = enumerate_query(sql, Dialect::Generic, 20).unwrap();

        assert_eq!(result.counts[&1], 3);
        assert_eq!(result.counts[&2], 2); // o-c, c-r connect directly
        assert_eq!(result.counts[&3], 1);

        let full = result.plans.iter().find(|p| p.subset.len() == 3).unwrap();
        assert!(full.rendered_sql.starts_with("SELECT * FROM"));
    }

    #[test]
    fn max_level_limits_enumeration_without_erroring() {
        let sql = "SELECT * FROM a JOIN b ON a.id = b.a_id";
        let result = enumerate_query(sql, Dialect::Generic, 1).unwrap();
        assert_eq!(result.counts.len(), 1);
        assert!(result.plans.iter().all(|p| p.subset.len() == 1));
    }

    #[test]
    fn propagates_parse_errors() {
        let sql = "SELECT * FROM";
        let err = enumerate_query(sql, Dialect::Generic, 20).unwrap_err();
        assert!(matches!(err, QueryError::Sql(_)));
    }
}
