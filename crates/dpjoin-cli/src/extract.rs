//! Splits one input file into individual query strings, either one-per-line or by
//! scanning for `SELECT ... ;` spans across the whole file.

use regex::Regex;
use std::sync::OnceLock;

/// One extracted query, with the 1-based source line it started on (for error reporting).
pub struct ExtractedQuery {
    pub text: String,
    pub line: usize,
}

/// Line mode: each line is scanned independently for the first `SELECT` (case-insensitive);
/// the substring from there to the first `;` or end-of-line is the query. Lines with no
/// `SELECT` are skipped.
pub fn extract_line_mode(contents: &str) -> Vec<ExtractedQuery> {
    static SELECT_RE: OnceLock<Regex> = OnceLock::new();
    let select_re = SELECT_RE.get_or_init(|| Regex::new(r"(?i)select").unwrap());

    contents
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let start = select_re.find(line)?.start();
            let rest = &line[start..];
            let text = rest.split(';').next().unwrap_or(rest).trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(ExtractedQuery { text, line: idx + 1 })
        })
        .collect()
}

/// Semicolon mode: the whole file is scanned for `SELECT ... ;` spans, non-greedy, with
/// `.` matching newlines so multi-line queries are captured whole.
pub fn extract_semicolon_mode(contents: &str) -> Vec<ExtractedQuery> {
    static SPAN_RE: OnceLock<Regex> = OnceLock::new();
    let span_re = SPAN_RE.get_or_init(|| Regex::new(r"(?is)select.*?;").unwrap());

    span_re
        .find_iter(contents)
        .map(|m| {
            let line = contents[..m.start()].matches('\n').count() + 1;
            ExtractedQuery {
                text: m.as_str().trim_end_matches(';').trim().to_string(),
                line,
            }
        })
        .collect()
}
