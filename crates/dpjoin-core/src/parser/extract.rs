//! AST walking: pulls relations, aliases, equi-join conditions, and WHERE-clause
//! predicates out of a parsed `SELECT`. Conjunctive queries only — subqueries,
//! set operations, and non-equality join graphs are out of scope (`UnsupportedShape`
//! is returned by the caller for anything this module can't see through).

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use sqlparser::ast::{
    BinaryOperator, Expr, Join, JoinConstraint, JoinOperator, Query, Select, SelectItem, SetExpr,
    Statement, TableFactor,
};

use crate::types::RelationAlias;

/// An asserted equi-join condition between two qualified columns.
pub struct JoinCondition {
    pub left_relation: RelationAlias,
    pub left_column: String,
    pub right_relation: RelationAlias,
    pub right_column: String,
}

/// Unwraps `Statement::Query(... SetExpr::Select ...)` down to the `Select` body.
/// `WITH` CTEs are not inlined; only the final `SELECT`'s own FROM/WHERE is analyzed.
pub fn select_body(statement: &Statement) -> Option<&Select> {
    let Statement::Query(query) = statement else {
        return None;
    };
    select_from_query(query)
}

fn select_from_query(query: &Query) -> Option<&Select> {
    match query.body.as_ref() {
        SetExpr::Select(select) => Some(select.as_ref()),
        _ => None, // UNION/INTERSECT/EXCEPT trees are not conjunctive queries
    }
}

/// Every `TableFactor::Table` reachable from `FROM` and `JOIN` clauses, in the order
/// they appear. The alias (or base name, if unaliased) is the relation identity used
/// everywhere else; the alias map remembers what to actually render in `FROM`/`JOIN`.
pub fn tables_and_aliases(select: &Select) -> (Vec<RelationAlias>, BTreeMap<RelationAlias, String>) {
    let mut tables = Vec::new();
    let mut aliases = BTreeMap::new();

    for twj in &select.from {
        visit_table_factor(&twj.relation, &mut tables, &mut aliases);
        for join in &twj.joins {
            visit_table_factor(&join.relation, &mut tables, &mut aliases);
        }
    }

    (tables, aliases)
}

fn visit_table_factor(
    factor: &TableFactor,
    tables: &mut Vec<RelationAlias>,
    aliases: &mut BTreeMap<RelationAlias, String>,
) {
    if let TableFactor::Table { name, alias, .. } = factor {
        let base_name = name.to_string();
        let relation = alias
            .as_ref()
            .map(|a| a.name.value.clone())
            .unwrap_or_else(|| base_name.clone());

        if !tables.contains(&relation) {
            tables.push(relation.clone());
            aliases.insert(relation, base_name);
        }
    }
}

/// Equi-join conditions from explicit `JOIN ... ON` clauses and from the legacy
/// comma-join style, where the join predicate lives in the `WHERE` clause instead.
pub fn join_conditions(select: &Select) -> Vec<JoinCondition> {
    let mut conditions = Vec::new();

    for twj in &select.from {
        for join in &twj.joins {
            if let Some(on_expr) = join_on_expr(join) {
                collect_equi_joins(on_expr, &mut conditions);
            }
        }
    }

    if let Some(selection) = &select.selection {
        collect_equi_joins(selection, &mut conditions);
    }

    conditions
}

fn join_on_expr(join: &Join) -> Option<&Expr> {
    let constraint = match &join.join_operator {
        JoinOperator::Inner(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => c,
        _ => return None, // cross joins, semi/anti joins carry no ON predicate we use
    };
    match constraint {
        JoinConstraint::On(expr) => Some(expr),
        _ => None, // USING/NATURAL joins name columns, not qualified equalities
    }
}

/// Splits `expr` on top-level `AND` and keeps only `relation.col = relation.col`
/// comparisons between two distinct relations.
fn collect_equi_joins(expr: &Expr, out: &mut Vec<JoinCondition>) {
    if let Expr::BinaryOp { left, op: BinaryOperator::And, right } = expr {
        collect_equi_joins(left, out);
        collect_equi_joins(right, out);
        return;
    }

    if let Expr::BinaryOp { left, op: BinaryOperator::Eq, right } = expr {
        if let (Some(l), Some(r)) = (qualified_column(left), qualified_column(right)) {
            if l.0 != r.0 {
                out.push(JoinCondition {
                    left_relation: l.0,
                    left_column: l.1,
                    right_relation: r.0,
                    right_column: r.1,
                });
            }
        }
    }
}

/// Splits the `WHERE` clause on top-level `AND` and records, for each resulting atomic
/// predicate, its rendered text and the set of relations it references.
pub fn where_predicates(select: &Select) -> Vec<(String, BTreeSet<RelationAlias>)> {
    let Some(selection) = &select.selection else {
        return Vec::new();
    };

    let mut conditions = Vec::new();
    split_and_chain(selection, &mut conditions);

    conditions
        .into_iter()
        .map(|expr| {
            let mut relations = BTreeSet::new();
            collect_relations(expr, &mut relations);
            (expr.to_string(), relations)
        })
        .collect()
}

fn split_and_chain<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    if let Expr::BinaryOp { left, op: BinaryOperator::And, right } = expr {
        split_and_chain(left, out);
        split_and_chain(right, out);
    } else {
        out.push(expr);
    }
}

/// Walks every qualified (and, where unambiguous, unqualified) column reference inside
/// `expr`, adding the owning relation to `out`. Covers the expression shapes a
/// conjunctive WHERE clause actually uses: comparisons, boolean combinators, `IN`,
/// `BETWEEN`, pattern matches, null tests, unary negation, parens, and casts.
fn collect_relations(expr: &Expr, out: &mut BTreeSet<RelationAlias>) {
    match expr {
        Expr::CompoundIdentifier(idents) => {
            if let Some(relation) = qualified_relation(idents) {
                out.insert(relation);
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_relations(left, out);
            collect_relations(right, out);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::Cast { expr, .. } => {
            collect_relations(expr, out);
        }
        Expr::IsNull(expr) | Expr::IsNotNull(expr) => collect_relations(expr, out),
        Expr::InList { expr, list, .. } => {
            collect_relations(expr, out);
            for item in list {
                collect_relations(item, out);
            }
        }
        Expr::Between { expr, low, high, .. } => {
            collect_relations(expr, out);
            collect_relations(low, out);
            collect_relations(high, out);
        }
        Expr::Like { expr, pattern, .. } | Expr::ILike { expr, pattern, .. } => {
            collect_relations(expr, out);
            collect_relations(pattern, out);
        }
        _ => {} // literals, subqueries, function calls: out of scope for relation attribution
    }
}

/// Extracts `(relation, column)` when `expr` is a two- (or more-) part compound
/// identifier, taking the last two segments as `relation.column` so schema-qualified
/// references (`db.schema.tbl.col`) still resolve to the right alias.
fn qualified_column(expr: &Expr) -> Option<(RelationAlias, String)> {
    match expr {
        Expr::CompoundIdentifier(idents) if idents.len() >= 2 => {
            let n = idents.len();
            Some((idents[n - 2].value.clone(), idents[n - 1].value.clone()))
        }
        _ => None,
    }
}

fn qualified_relation(idents: &[sqlparser::ast::Ident]) -> Option<RelationAlias> {
    if idents.len() >= 2 {
        Some(idents[idents.len() - 2].value.clone())
    } else {
        None
    }
}

/// True if `select`'s projection is a plain `*` or simple column list (no aggregates),
/// which is all the renderer ever emits itself; kept for callers that want to validate
/// a query shape before treating it as conjunctive. Unused internally but documents the
/// supported projection shape.
#[allow(dead_code)]
pub fn is_simple_projection(select: &Select) -> bool {
    select
        .projection
        .iter()
        .all(|item| matches!(item, SelectItem::Wildcard(_) | SelectItem::UnnamedExpr(_) | SelectItem::ExprWithAlias { .. }))
}
