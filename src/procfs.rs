//! Line-oriented readers for kernel pseudo-files.
//!
//! Pseudo-files present live kernel state as text with a fixed layout:
//! a known number of header lines, then whitespace-separated records.
//! Reads here are fail-soft: a missing or unreadable file yields an empty
//! result, never an error, so the service stays responsive on hosts where
//! a source does not exist (non-Linux, restricted containers).

use std::fs;
use std::path::Path;

use tracing::debug;

/// Reads a pseudo-file into field records.
///
/// Skips `skip_lines` header lines, splits the remainder on whitespace,
/// and drops records with fewer than `min_fields` fields. Any open or
/// read failure is treated as "no data".
pub fn read_table(path: &Path, skip_lines: usize, min_fields: usize) -> Vec<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => parse_table(&content, skip_lines, min_fields),
        Err(e) => {
            debug!("Treating unreadable table {} as empty: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Content-level record splitter behind [`read_table`].
pub fn parse_table(content: &str, skip_lines: usize, min_fields: usize) -> Vec<Vec<String>> {
    content
        .lines()
        .skip(skip_lines)
        .map(|line| {
            line.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|fields| fields.len() >= min_fields)
        .collect()
}

/// Reads a single-value file, trimmed. `None` when absent or unreadable.
pub fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
