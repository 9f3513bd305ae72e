//! End-to-end scenarios from SQL text to enumerated, rendered subsets.

use dpjoin_core::{enumerate_query, Dialect};
use rstest::rstest;

#[rstest]
#[case::simple_join(
    "SELECT * FROM A, B WHERE A.x = B.y AND A.z > 10;",
    &[2, 1]
)]
#[case::chain_join_with_transitive_closure(
    "SELECT * FROM A, B, C WHERE A.x = B.y AND B.y = C.z AND A.w > 5;",
    &[3, 3, 1]
)]
#[case::constant_equality_join(
    "SELECT * FROM it1, it2 WHERE it1.info = 'rating' AND it2.info = 'rating';",
    &[2, 1]
)]
#[case::multi_value_in_does_not_derive(
    "SELECT * FROM A, B WHERE A.type IN ('x', 'y') AND B.type IN ('x', 'y');",
    &[2]
)]
#[case::disconnected_tables(
    "SELECT * FROM A, B WHERE A.x > 10 AND B.y < 20;",
    &[2]
)]
#[case::column_aware_closure_rejects_mismatched_columns(
    "SELECT * FROM A, B, C WHERE A.x = B.y AND B.z = C.w;",
    &[3, 2, 1]
)]
fn enumerates_expected_counts_per_level(#[case] sql: &str, #[case] expected_counts: &[usize]) {
    let result = enumerate_query(sql, Dialect::Generic, 20).unwrap();
    let counts: Vec<usize> = (1..=expected_counts.len())
        .map(|level| *result.counts.get(&level).unwrap_or(&0))
        .collect();
    assert_eq!(counts, expected_counts);

    for level in (expected_counts.len() + 1)..=4 {
        assert_eq!(result.counts.get(&level).copied().unwrap_or(0), 0);
    }
}

#[test]
fn selection_predicate_appears_in_singleton_and_join_query() {
    let sql = "SELECT * FROM A, B WHERE A.x = B.y AND A.z > 10;";
    let result = enumerate_query(sql, Dialect::Generic, 20).unwrap();

    let singleton = result
        .plans
        .iter()
        .find(|p| p.subset.len() == 1 && p.subset.contains("A"))
        .unwrap();
    assert!(singleton.rendered_sql.contains("A.z > 10"));

    let pair = result.plans.iter().find(|p| p.subset.len() == 2).unwrap();
    assert!(pair.rendered_sql.contains("A.z > 10"));
    assert!(pair.rendered_sql.contains("JOIN B ON A.x = B.y"));
}

#[test]
fn constant_equality_join_rendered_as_derived_predicate() {
    let sql = "SELECT * FROM it1, it2 WHERE it1.info = 'rating' AND it2.info = 'rating';";
    let result = enumerate_query(sql, Dialect::Generic, 20).unwrap();

    let pair = result.plans.iter().find(|p| p.subset.len() == 2).unwrap();
    assert!(pair.rendered_sql.contains("JOIN"));
    assert!(pair.rendered_sql.contains("it1.info = it2.info"));
}

#[test]
fn self_join_renders_base_table_alias_for_each_side() {
    let sql = "SELECT * FROM users u1, users u2 WHERE u1.manager_id = u2.id AND u1.department = 'Engineering';";
    let result = enumerate_query(sql, Dialect::Generic, 20).unwrap();

    let pair = result.plans.iter().find(|p| p.subset.len() == 2).unwrap();
    assert!(pair.rendered_sql.contains("users u1"));
    assert!(pair.rendered_sql.contains("users u2"));
}

#[test]
fn modern_join_syntax_enumerates_every_connected_subset() {
    let sql = "SELECT * FROM A JOIN B ON A.x = B.y JOIN C ON B.y = C.z WHERE A.w > 10;";
    let result = enumerate_query(sql, Dialect::Generic, 20).unwrap();
    assert_eq!(result.plans.len(), 7);
}

#[test]
fn max_level_caps_enumeration_depth() {
    let sql = "SELECT * FROM A, B, C, D WHERE A.x = B.y AND B.y = C.z AND C.z = D.w;";
    let result = enumerate_query(sql, Dialect::Generic, 2).unwrap();

    assert!(result.counts.contains_key(&1));
    assert!(result.counts.contains_key(&2));
    assert!(!result.counts.contains_key(&3));
    assert!(!result.counts.contains_key(&4));
}
