//! Drives one input file end to end: extract queries, run each through the core
//! enumerator, and write admitted subsets to the output CSV. Errors on an individual
//! query are logged and execution moves to the next query unless `stop_on_error` is set.

use std::path::Path;

use anyhow::{Context, Result};
use dpjoin_core::Dialect;

use crate::extract::{self, ExtractedQuery};
use crate::output;

/// Summary of one driver run, used to pick the process exit code.
pub struct DriverReport {
    pub queries_seen: usize,
    pub queries_failed: usize,
    pub stopped_early: bool,
}

impl DriverReport {
    pub fn has_errors(&self) -> bool {
        self.queries_failed > 0
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    input_path: &Path,
    output_path: &Path,
    semicolon_separated: bool,
    stop_on_error: bool,
    max_level: usize,
    dialect: Dialect,
    verbose: bool,
) -> Result<DriverReport> {
    let contents = std::fs::read_to_string(input_path)
        .with_context(|| format!("failed to read input file {}", input_path.display()))?;

    let queries: Vec<ExtractedQuery> = if semicolon_separated {
        extract::extract_semicolon_mode(&contents)
    } else {
        extract::extract_line_mode(&contents)
    };

    tracing::info!(count = queries.len(), "extracted queries");

    let mut writer = output::open_writer(output_path)?;
    let mut queries_failed = 0;
    let mut stopped_early = false;

    for (idx, query) in queries.iter().enumerate() {
        let query_id = idx + 1;
        match dpjoin_core::enumerate_query(&query.text, dialect, max_level) {
            Ok(result) => {
                if verbose {
                    let subset_count: usize = result.counts.values().sum();
                    tracing::info!(query_id, line = query.line, subset_count, "query enumerated");
                }
                output::write_rows(&mut writer, query_id, &result)
                    .with_context(|| format!("failed writing rows for query {query_id}"))?;
            }
            Err(err) => {
                queries_failed += 1;
                tracing::error!(query_id, line = query.line, error = %err, "query failed");
                if stop_on_error {
                    stopped_early = true;
                    break;
                }
            }
        }
    }

    Ok(DriverReport {
        queries_seen: queries.len(),
        queries_failed,
        stopped_early,
    })
}
