//! Column selection for query results.

use std::collections::{BTreeSet, HashSet};

use crate::cache::Block;
use crate::prefs::data::{unique, ColumnFilter};

/// Column holding the page name. Always the first result column.
pub const PAGE_COLUMN: &str = "page";

/// Columns offered for a result set: `page`, then every property key of
/// the matched blocks in sorted order.
#[must_use]
pub fn result_columns(blocks: &[&Block]) -> Vec<String> {
    let keys: BTreeSet<&str> = blocks
        .iter()
        .flat_map(|block| block.properties.keys())
        .map(String::as_str)
        .filter(|key| *key != PAGE_COLUMN)
        .collect();

    std::iter::once(PAGE_COLUMN)
        .chain(keys)
        .map(str::to_string)
        .collect()
}

/// Merge the columns of a new result set into a stored selection.
///
/// - previously selected columns that are still offered stay selected, in
///   their stored order
/// - columns never seen before are selected after them
/// - `page` is selected when first seen, or when nothing was selected before
/// - `seen` only grows
#[must_use]
pub fn reconcile(columns: &[String], previous: Option<&ColumnFilter>) -> ColumnFilter {
    let (prev_selected, prev_seen) = previous
        .map(|p| (p.selected.as_slice(), p.seen.as_slice()))
        .unwrap_or_default();

    let offered: HashSet<&str> = columns.iter().map(String::as_str).collect();
    let seen_before: HashSet<&str> = prev_seen.iter().map(String::as_str).collect();

    let seen = unique(prev_seen.iter().chain(columns).cloned().collect());

    let kept = prev_selected
        .iter()
        .filter(|col| offered.contains(col.as_str()));
    let fresh = columns
        .iter()
        .filter(|col| !seen_before.contains(col.as_str()));
    let mut selected = unique(kept.chain(fresh).cloned().collect());

    let page_offered = offered.contains(PAGE_COLUMN);
    let page_is_new = !seen_before.contains(PAGE_COLUMN);
    if page_offered
        && (page_is_new || prev_selected.is_empty())
        && !selected.iter().any(|c| c == PAGE_COLUMN)
    {
        selected.insert(0, PAGE_COLUMN.to_string());
    }

    ColumnFilter::new(selected, seen)
}
