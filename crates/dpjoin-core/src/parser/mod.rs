//! SQL parsing and extraction: turns one query string into the relations, alias map,
//! join graph, and predicate classifier the enumerator and renderer need.

mod extract;

use std::collections::BTreeMap;

use sqlparser::ast::Statement;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::classifier::PredicateClassifier;
use crate::error::QueryError;
use crate::graph::JoinGraph;
use crate::types::{Dialect, JoinOrigin, RelationAlias};

/// Everything downstream analysis (enumerator, renderer) needs about one query.
pub struct ParsedQuery {
    pub tables: Vec<RelationAlias>,
    pub aliases: BTreeMap<RelationAlias, String>,
    pub classifier: PredicateClassifier,
    pub graph: JoinGraph,
}

/// Parses `sql` with the generic dialect (legacy compatibility, matches the pre-dialect
/// CLI default).
pub fn parse_sql(sql: &str) -> Result<Vec<Statement>, QueryError> {
    parse_sql_with_dialect(sql, Dialect::Generic)
}

/// Parses `sql` with the requested dialect, falling back to Postgres syntax for the
/// generic dialect when the input looks like it uses Postgres-only operators. Warehouse
/// SQL samples routinely use `::`, `->`, and `?`-family JSON operators that the generic
/// dialect rejects outright.
pub fn parse_sql_with_dialect(sql: &str, dialect: Dialect) -> Result<Vec<Statement>, QueryError> {
    let sqlparser_dialect = dialect.to_sqlparser_dialect();
    match Parser::parse_sql(sqlparser_dialect.as_ref(), sql) {
        Ok(statements) => Ok(statements),
        Err(primary_err) => {
            if matches!(dialect, Dialect::Generic) && looks_like_postgres_syntax(sql) {
                let postgres = PostgreSqlDialect {};
                if let Ok(statements) = Parser::parse_sql(&postgres, sql) {
                    return Ok(statements);
                }
            }
            Err(primary_err.into())
        }
    }
}

fn looks_like_postgres_syntax(sql: &str) -> bool {
    sql.contains("::")
        || sql.contains("->")
        || sql.contains("?|")
        || sql.contains("?&")
        || sql.contains(" ? ")
        || sql.contains(" ?\n")
        || sql.contains("? '")
        || sql.contains("?\t")
}

/// Full pipeline from raw SQL text to a [`ParsedQuery`]: parse, extract relations/joins/
/// predicates, derive constant-equality edges, close transitively, and build equivalence
/// classes. The input is expected to be exactly one statement (callers split on `;`
/// themselves, per the driver's query-extraction pass).
pub fn parse_query(sql: &str, dialect: Dialect) -> Result<ParsedQuery, QueryError> {
    let mut statements = parse_sql_with_dialect(sql, dialect)?;
    if statements.is_empty() {
        return Err(QueryError::NoRelations);
    }
    if statements.len() > 1 {
        return Err(QueryError::UnsupportedShape(
            "expected a single statement".to_string(),
        ));
    }
    let statement = statements.remove(0);

    let select = extract::select_body(&statement).ok_or_else(|| {
        QueryError::UnsupportedShape(format!("not a conjunctive SELECT: {statement}"))
    })?;

    let (tables, aliases) = extract::tables_and_aliases(select);
    if tables.is_empty() {
        return Err(QueryError::NoRelations);
    }

    let mut classifier = PredicateClassifier::new();
    for (text, relations) in extract::where_predicates(select) {
        classifier.add_predicate(text, relations);
    }

    let mut graph = JoinGraph::new();
    for cond in extract::join_conditions(select) {
        graph.add_join(
            cond.left_relation,
            cond.right_relation,
            cond.left_column,
            cond.right_column,
            JoinOrigin::Asserted,
        );
    }

    graph.ingest_constant_equality(&classifier, &tables);
    graph.compute_transitive_closure()?;
    graph.build_equivalence_classes();

    Ok(ParsedQuery {
        tables,
        aliases,
        classifier,
        graph,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_inner_join() {
        let sql = "SELECT * FROM orders o JOIN customers c ON o.customer_id = c.id WHERE c.active = true";
        let parsed = parse_query(sql, Dialect::Generic).unwrap();

        assert_eq!(parsed.tables, vec!["c".to_string(), "o".to_string()]);
        assert_eq!(parsed.aliases.get("o").unwrap(), "orders");
        assert!(!parsed.graph.details_for("c", "o").is_empty());
    }

    #[test]
    fn parses_legacy_comma_join() {
        let sql = "SELECT * FROM orders o, customers c WHERE o.customer_id = c.id";
        let parsed = parse_query(sql, Dialect::Generic).unwrap();
        assert!(!parsed.graph.details_for("c", "o").is_empty());
    }

    #[test]
    fn no_tables_is_an_error() {
        let sql = "SELECT 1";
        let err = parse_query(sql, Dialect::Generic).unwrap_err();
        assert!(matches!(err, QueryError::NoRelations));
    }

    #[test]
    fn derives_constant_equality_joins() {
        let sql = "SELECT * FROM t1, t2 WHERE t1.info = 'rating' AND t2.info = 'rating'";
        let parsed = parse_query(sql, Dialect::Generic).unwrap();
        assert!(!parsed.graph.details_for("t1", "t2").is_empty());
    }
}
