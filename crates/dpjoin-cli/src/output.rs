//! CSV output: one row per admitted subset of size >= 2, across every query.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use dpjoin_core::EnumerationResult;

/// Opens `path` and writes the `query_id, subset, query` header. Rows are appended one
/// query at a time via [`write_rows`] so a fatal error partway through still leaves
/// earlier rows on disk.
pub fn open_writer(path: &Path) -> Result<csv::Writer<File>> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    writer
        .write_record(["query_id", "subset", "query"])
        .context("failed to write CSV header")?;
    Ok(writer)
}

/// Writes every admitted subset of size >= 2 from `result` as one row each. `subset` is
/// rendered `{a, b, c}` with aliases sorted lexicographically (they already are, since
/// plans carry a `BTreeSet`); `query` has embedded newlines collapsed to single spaces.
pub fn write_rows(
    writer: &mut csv::Writer<File>,
    query_id: usize,
    result: &EnumerationResult,
) -> Result<()> {
    for plan in &result.plans {
        if plan.subset.len() < 2 {
            continue;
        }
        let subset = format_subset(&plan.subset);
        let query = plan.rendered_sql.replace('\n', " ");
        writer
            .write_record([query_id.to_string().as_str(), subset.as_str(), query.as_str()])
            .context("failed to write CSV row")?;
    }
    writer.flush().context("failed to flush CSV writer")?;
    Ok(())
}

fn format_subset(subset: &BTreeSet<String>) -> String {
    format!("{{{}}}", subset.iter().cloned().collect::<Vec<_>>().join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpjoin_core::EnumerationPlan;

    fn plan(members: &[&str], sql: &str) -> EnumerationPlan {
        EnumerationPlan {
            subset: members.iter().map(|s| s.to_string()).collect(),
            left: None,
            right: None,
            rendered_sql: sql.to_string(),
        }
    }

    #[test]
    fn formats_subset_braces_sorted() {
        let subset: BTreeSet<String> = ["b", "a", "c"].into_iter().map(String::from).collect();
        assert_eq!(format_subset(&subset), "{a, b, c}");
    }

    #[test]
    fn write_rows_skips_singletons_and_collapses_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut writer = open_writer(&path).unwrap();

        let result = EnumerationResult {
            plans: vec![
                plan(&["a"], "SELECT COUNT(*) FROM a;"),
                plan(&["a", "b"], "SELECT * FROM a\nJOIN b ON a.id = b.a_id;"),
            ],
            counts: Default::default(),
        };
        write_rows(&mut writer, 1, &result).unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("COUNT(*)"));
        assert!(contents.contains("SELECT * FROM a JOIN b ON a.id = b.a_id;"));
        assert!(contents.starts_with("query_id,subset,query\n"));
    }
}
