//! Renders the counting SQL text for one admitted subset: a bare `SELECT COUNT(*)` for
//! singletons, or a left-deep `JOIN` tree with a `WHERE` clause of everything not already
//! spent as a join condition for larger subsets.

use std::collections::{BTreeMap, BTreeSet};

use crate::classifier::PredicateClassifier;
use crate::error::EnumeratorError;
use crate::graph::JoinGraph;
use crate::types::{JoinDetail, QualifiedColumn, RelationAlias};

/// Everything the renderer needs that isn't carried on the `EnumerationPlan` itself.
pub struct RenderContext<'a> {
    pub aliases: &'a BTreeMap<RelationAlias, String>,
    pub classifier: &'a PredicateClassifier,
    pub graph: &'a JoinGraph,
}

impl<'a> RenderContext<'a> {
    pub fn render(
        &self,
        subset: &BTreeSet<RelationAlias>,
        left: Option<&BTreeSet<RelationAlias>>,
        right: Option<&BTreeSet<RelationAlias>>,
    ) -> Result<String, EnumeratorError> {
        if subset.len() == 1 {
            let table = subset.iter().next().expect("non-empty subset");
            return Ok(self.render_base_table_query(table));
        }
        let _ = (left, right); // decomposition is metadata only; the join tree is rebuilt fresh
        self.render_join_query(subset)
    }

    fn render_base_table_query(&self, table: &str) -> String {
        let singleton: BTreeSet<RelationAlias> = [table.to_string()].into_iter().collect();
        let preds = self.classifier.predicates_for_subset(&singleton);
        let table_clause = self.render_table(table);

        if preds.selections.is_empty() {
            format!("SELECT COUNT(*) FROM {table_clause};")
        } else {
            format!(
                "SELECT COUNT(*) FROM {table_clause} WHERE {};",
                preds.selections.join(" AND ")
            )
        }
    }

    fn render_join_query(&self, subset: &BTreeSet<RelationAlias>) -> Result<String, EnumeratorError> {
        let subset_list: Vec<RelationAlias> = subset.iter().cloned().collect();

        let mut from_clause = self.render_table(&subset_list[0]);
        let mut added: BTreeSet<RelationAlias> = [subset_list[0].clone()].into_iter().collect();
        let mut remaining: BTreeSet<RelationAlias> = subset_list[1..].iter().cloned().collect();
        let mut used_predicates: BTreeSet<(QualifiedColumn, QualifiedColumn)> = BTreeSet::new();

        while !remaining.is_empty() {
            let next = self
                .find_next_table(&added, &remaining)
                .ok_or_else(|| EnumeratorError::NoAttachableRelation(subset_list.clone()))?;

            from_clause.push_str(&format!("\nJOIN {}", self.render_table(&next.table)));
            if let Some(detail) = &next.detail {
                from_clause.push_str(&format!(" ON {}", detail.as_predicate()));
                used_predicates.insert(detail.semantic_key());
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(table = %next.table, asserted = next.detail.as_ref().is_some_and(|d| d.origin == crate::types::JoinOrigin::Asserted), "attached relation to join tree");

            added.insert(next.table.clone());
            remaining.remove(&next.table);
        }

        let where_clause = self.build_where_clause(subset, &used_predicates);

        if where_clause.is_empty() {
            Ok(format!("SELECT * FROM {from_clause};"))
        } else {
            Ok(format!("SELECT * FROM {from_clause}\nWHERE {where_clause};"))
        }
    }

    /// Tries every not-yet-added table against every already-added one, preferring an
    /// asserted edge over a derived one, and the first match in sorted order otherwise.
    fn find_next_table(
        &self,
        added: &BTreeSet<RelationAlias>,
        remaining: &BTreeSet<RelationAlias>,
    ) -> Option<NextTable> {
        for table in remaining {
            for attached in added {
                let details = self.graph.details_for(attached, table);
                if let Some(detail) = details.iter().find(|d| d.origin == crate::types::JoinOrigin::Asserted) {
                    return Some(NextTable {
                        table: table.clone(),
                        detail: Some(detail.clone()),
                    });
                }
            }
        }

        for table in remaining {
            for attached in added {
                let details = self.graph.details_for(attached, table);
                if let Some(detail) = details.first() {
                    return Some(NextTable {
                        table: table.clone(),
                        detail: Some(detail.clone()),
                    });
                }
            }
        }

        None
    }

    fn build_where_clause(
        &self,
        subset: &BTreeSet<RelationAlias>,
        used_predicates: &BTreeSet<(QualifiedColumn, QualifiedColumn)>,
    ) -> String {
        let preds = self.classifier.predicates_for_subset(subset);
        let mut parts: Vec<String> = Vec::new();
        parts.extend(preds.selections.iter().cloned());

        for join_pred in &preds.joins {
            if !matches_used_predicate(join_pred, used_predicates) {
                parts.push(join_pred.clone());
            }
        }

        parts.extend(preds.complex.iter().cloned());
        parts.join(" AND ")
    }

    fn render_table(&self, alias: &str) -> String {
        match self.aliases.get(alias) {
            Some(base) if base != alias => format!("{base} {alias}"),
            _ => alias.to_string(),
        }
    }
}

struct NextTable {
    table: RelationAlias,
    detail: Option<JoinDetail>,
}

/// A join predicate's text is `a.c1 = b.c2`; recover the two qualified columns and compare
/// by semantic key so a residual predicate already consumed as a JOIN ON clause is not
/// re-emitted in the WHERE clause, regardless of which side it was written from.
fn matches_used_predicate(
    text: &str,
    used: &BTreeSet<(QualifiedColumn, QualifiedColumn)>,
) -> bool {
    let Some((left, right)) = text.split_once('=') else {
        return false;
    };
    let (Some(l), Some(r)) = (parse_qualified(left), parse_qualified(right)) else {
        return false;
    };
    let key = if l <= r { (l, r) } else { (r, l) };
    used.contains(&key)
}

fn parse_qualified(raw: &str) -> Option<QualifiedColumn> {
    let trimmed = raw.trim();
    let (relation, column) = trimmed.split_once('.')?;
    Some(QualifiedColumn::new(relation.trim(), column.trim()))
}
