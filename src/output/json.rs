//! JSON output formatter for query results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "query": "type:book",
//!   "graph": "/home/me/notes",
//!   "summary": { "matches": 1, "total_blocks": 42, "entries": 17 },
//!   "columns": ["page", "type"],
//!   "rows": [
//!     { "id": 0, "page": "library", "content": "- Dune\n  type:: book", "type": "book" }
//!   ]
//! }
//! ```
//!
//! Rows always carry every property; `columns` lists the selection a
//! table view would show. Should a property share a name with `id`,
//! `page` or `content`, the property value replaces the block field.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::output::ResultRow;
use crate::sync::SyncSummary;

/// Counts describing a query run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JsonQuerySummary {
    /// Rows in the result
    pub matches: usize,
    /// Blocks the query was evaluated against
    pub total_blocks: usize,
    /// Cached files of the graph
    pub entries: usize,
}

/// Complete JSON output for a query.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Query text as evaluated
    pub query: String,
    /// Graph the query ran against
    pub graph: String,
    /// Counts
    pub summary: JsonQuerySummary,
    /// Selected columns
    pub columns: Vec<String>,
    /// Flattened rows
    pub rows: Vec<Map<String, Value>>,
}

impl JsonOutput {
    /// Build the JSON document for a query result.
    #[must_use]
    pub fn new(
        query: &str,
        graph: &str,
        summary: JsonQuerySummary,
        columns: &[String],
        rows: &[ResultRow],
    ) -> Self {
        Self {
            query: query.to_string(),
            graph: graph.to_string(),
            summary,
            columns: columns.to_vec(),
            rows: rows.iter().map(flatten_row).collect(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        write_json(self, writer, pretty)
    }
}

/// Machine-readable summary of a synchronization pass.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSyncSummary {
    /// Graph that was synchronized
    pub graph: String,
    /// Markdown files found on disk
    pub discovered: usize,
    /// New files
    pub added: usize,
    /// Modified files
    pub modified: usize,
    /// Deleted files
    pub deleted: usize,
    /// Files re-extracted
    pub extracted: usize,
    /// Files skipped after an I/O error
    pub skipped: usize,
    /// Cache entries after the pass
    pub entries: usize,
    /// Blocks after the pass
    pub blocks: usize,
    /// Whether the pass found nothing to do
    pub up_to_date: bool,
    /// Pass duration in milliseconds
    pub duration_ms: u64,
}

impl JsonSyncSummary {
    /// Convert a pass summary.
    #[must_use]
    pub fn new(graph: &str, summary: &SyncSummary) -> Self {
        Self {
            graph: graph.to_string(),
            discovered: summary.discovered,
            added: summary.added,
            modified: summary.modified,
            deleted: summary.deleted,
            extracted: summary.extracted,
            skipped: summary.skipped,
            entries: summary.entries,
            blocks: summary.blocks,
            up_to_date: summary.up_to_date,
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Write any serializable value as JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<T: Serialize + ?Sized, W: Write>(
    value: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), JsonOutputError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// `{id, page, content, <properties>}`, properties overriding
/// same-named block fields.
fn flatten_row(row: &ResultRow) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".to_string(), Value::from(row.id));
    map.insert("page".to_string(), Value::from(row.page.as_str()));
    map.insert("content".to_string(), Value::from(row.content.as_str()));
    for (key, value) in &row.props {
        map.insert(key.clone(), Value::from(value.as_str()));
    }
    map
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
