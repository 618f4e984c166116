//! Output formatters for query results and reports.
//!
//! Matched blocks are first flattened into [`ResultRow`]s (`id`, `page`,
//! `content` plus every property), optionally sorted with a sort model,
//! then rendered by one of:
//!
//! - [`text`]: aligned terminal tables and pass reports
//! - [`json`]: machine-readable JSON for scripting
//! - [`csv`]: CSV for spreadsheets, restricted to the selected columns
//!
//! # Example
//!
//! ```
//! use propdex::cache::{Block, Properties};
//! use propdex::output::{build_rows, csv::CsvOutput};
//!
//! let mut props = Properties::new();
//! props.insert("type".to_string(), "book".to_string());
//! let block = Block::new("library", "- Dune\n  type:: book", props);
//!
//! let rows = build_rows(&[&block]);
//! let columns = vec!["page".to_string(), "type".to_string()];
//! let csv = CsvOutput::new(&columns, &rows).to_string().unwrap();
//! assert_eq!(csv, "page,type\nlibrary,book\n");
//! ```

pub mod csv;
pub mod json;
pub mod text;

use std::cmp::Ordering;

use serde::Serialize;

use crate::cache::{Block, Properties};
use crate::prefs::{SortDirection, SortModelItem};

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextTable;

/// One matched block, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// 0-based position in the unsorted result
    pub id: usize,
    /// Page name
    pub page: String,
    /// Raw block text
    pub content: String,
    /// Block properties
    pub props: Properties,
}

impl ResultRow {
    /// Value of a column. Properties are looked up first, so a property
    /// named `page` or `content` shadows the block field.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<&str> {
        if let Some(value) = self.props.get(column) {
            return Some(value);
        }
        match column {
            "page" => Some(&self.page),
            "content" => Some(&self.content),
            _ => None,
        }
    }
}

/// Flatten matched blocks into rows numbered in match order.
#[must_use]
pub fn build_rows(blocks: &[&Block]) -> Vec<ResultRow> {
    blocks
        .iter()
        .enumerate()
        .map(|(id, block)| ResultRow {
            id,
            page: block.page.clone(),
            content: block.content.clone(),
            props: block.properties.clone(),
        })
        .collect()
}

/// Sort rows with a sort model.
///
/// Items are applied in `sort_index` order, earlier items taking priority.
/// Rows lacking a column sort after rows that have it, in either
/// direction. The sort is stable, so rows equal on every key keep their
/// match order.
pub fn apply_sort(rows: &mut [ResultRow], model: &[SortModelItem]) {
    if model.is_empty() {
        return;
    }
    let mut keys: Vec<&SortModelItem> = model.iter().collect();
    keys.sort_by_key(|item| item.sort_index.unwrap_or(usize::MAX));

    rows.sort_by(|a, b| {
        keys.iter()
            .map(|item| compare_column(a, b, item))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

fn compare_column(a: &ResultRow, b: &ResultRow, item: &SortModelItem) -> Ordering {
    match (a.value(&item.col_id), b.value(&item.col_id)) {
        (Some(x), Some(y)) => match item.sort {
            SortDirection::Asc => x.cmp(y),
            SortDirection::Desc => y.cmp(x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
