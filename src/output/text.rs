//! Plain-text rendering for the terminal.
//!
//! Styling goes through `yansi`, so `--no-color` / `NO_COLOR` (which
//! disable it globally) yield plain text.

use std::fmt::Write as _;

use yansi::Paint;

use crate::analysis::{KeyCount, ValueCount};
use crate::output::ResultRow;
use crate::sync::SyncSummary;

/// Widest a table cell may get before it is truncated.
pub const DEFAULT_MAX_CELL_WIDTH: usize = 40;

const ELLIPSIS: char = '…';

/// A left-aligned table with a bold header row.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    max_cell_width: usize,
}

impl TextTable {
    /// Create an empty table with the given headers.
    #[must_use]
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            max_cell_width: DEFAULT_MAX_CELL_WIDTH,
        }
    }

    /// Table of the `columns` of `rows`.
    #[must_use]
    pub fn from_rows(columns: &[String], rows: &[ResultRow]) -> Self {
        let mut table = Self::new(columns.to_vec());
        for row in rows {
            table.push(
                columns
                    .iter()
                    .map(|col| row.value(col).unwrap_or_default().to_string())
                    .collect(),
            );
        }
        table
    }

    /// Key list produced by property analysis.
    #[must_use]
    pub fn from_key_counts(keys: &[KeyCount]) -> Self {
        let mut table = Self::new(vec!["key".to_string(), "blocks".to_string()]);
        for key in keys {
            table.push(vec![key.key.clone(), key.count.to_string()]);
        }
        table
    }

    /// Value frequency table of one key.
    #[must_use]
    pub fn from_value_counts(key: &str, counts: &[ValueCount]) -> Self {
        let mut table = Self::new(vec![key.to_string(), "count".to_string()]);
        for count in counts {
            table.push(vec![count.value.clone(), count.count.to_string()]);
        }
        table
    }

    /// Limit cell width; longer cells end in an ellipsis.
    #[must_use]
    pub fn with_max_cell_width(mut self, width: usize) -> Self {
        self.max_cell_width = width.max(1);
        self
    }

    /// Append a row. Missing trailing cells render empty.
    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Number of body rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no body rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render header, separator and rows, each line newline-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        let headers: Vec<String> = self.headers.iter().map(|h| self.cell(h)).collect();
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| self.cell(c)).collect())
            .collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header_line = join_padded(&headers, &widths);
        let _ = writeln!(out, "{}", header_line.bold());
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(out, "{}", rule.join("  "));
        for row in &rows {
            let _ = writeln!(out, "{}", join_padded(row, &widths));
        }
        out
    }

    /// Single-line, width-limited form of a cell.
    fn cell(&self, text: &str) -> String {
        let flat: String = text
            .chars()
            .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
            .collect();
        if flat.chars().count() <= self.max_cell_width {
            return flat;
        }
        let mut cut: String = flat.chars().take(self.max_cell_width - 1).collect();
        cut.push(ELLIPSIS);
        cut
    }
}

fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let line = widths
        .iter()
        .enumerate()
        .map(|(i, width)| {
            let cell = cells.get(i).map(String::as_str).unwrap_or_default();
            format!("{cell:<width$}")
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

/// Human-readable report of a synchronization pass.
#[must_use]
pub fn sync_report(graph: &str, summary: &SyncSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Graph:".bold(), graph);
    if summary.up_to_date {
        let _ = writeln!(
            out,
            "{} ({} files, {} blocks)",
            "Cache up to date".green(),
            summary.entries,
            summary.blocks
        );
        return out;
    }

    let _ = writeln!(
        out,
        "{} {} new, {} modified, {} deleted",
        "Changes:".bold(),
        summary.added,
        summary.modified,
        summary.deleted
    );
    let _ = writeln!(
        out,
        "{} {} of {} files re-extracted in {:.2?}",
        "Extracted:".bold(),
        summary.extracted,
        summary.discovered,
        summary.duration
    );
    if summary.skipped > 0 {
        let _ = writeln!(out, "{} {} files", "Skipped:".yellow(), summary.skipped);
    }
    let _ = writeln!(
        out,
        "{} {} files, {} blocks",
        "Cached:".bold(),
        summary.entries,
        summary.blocks
    );
    if !summary.saved {
        let _ = writeln!(out, "{}", "Warning: the cache could not be saved".yellow());
    }
    out
}
