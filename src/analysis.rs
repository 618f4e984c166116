//! Property statistics over a graph's blocks.
//!
//! Two views are offered: every property key with the number of blocks
//! carrying it, and the value frequency table of one key. The latter can
//! be rendered as a horizontal text bar chart.
//!
//! # Example
//!
//! ```
//! use propdex::analysis::{bar_chart, value_counts};
//! use propdex::cache::{Block, Properties};
//!
//! let mut props = Properties::new();
//! props.insert("type".to_string(), "book".to_string());
//! let blocks = vec![Block::new("a", "- a", props)];
//!
//! let counts = value_counts(&blocks, "type");
//! assert_eq!(counts[0].count, 1);
//! assert!(bar_chart(&counts, 15, 30).contains("book"));
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::cache::Block;

/// Number of values shown in a chart unless told otherwise.
pub const DEFAULT_TOP: usize = 15;

/// Width in characters of the longest bar.
pub const BAR_WIDTH: usize = 30;

const BAR_CHAR: char = '█';

/// A property key and how many blocks carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    /// Property key
    pub key: String,
    /// Blocks carrying the key
    pub count: usize,
}

/// A property value and how many blocks carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    /// Property value, verbatim
    pub value: String,
    /// Blocks carrying the value
    pub count: usize,
}

/// Every property key in `blocks`, sorted by key.
#[must_use]
pub fn property_keys(blocks: &[Block]) -> Vec<KeyCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in blocks.iter().flat_map(|b| b.properties.keys()) {
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(key, count)| KeyCount {
            key: key.to_string(),
            count,
        })
        .collect()
}

/// Frequency of each value of `key`, most frequent first. Ties are broken
/// by value so the order is deterministic.
#[must_use]
pub fn value_counts(blocks: &[Block], key: &str) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in blocks.iter().filter_map(|b| b.properties.get(key)) {
        *counts.entry(value).or_default() += 1;
    }

    let mut table: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect();
    table.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    table
}

/// Render the first `top` rows of a frequency table as a bar chart.
///
/// Bars are scaled so the largest count spans `width` characters; every
/// non-zero count gets at least one character.
#[must_use]
pub fn bar_chart(counts: &[ValueCount], top: usize, width: usize) -> String {
    let rows = &counts[..counts.len().min(top)];
    let Some(max) = rows.iter().map(|r| r.count).max().filter(|m| *m > 0) else {
        return String::new();
    };
    let label_width = rows
        .iter()
        .map(|r| r.value.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for row in rows {
        let len = (row.count * width).div_ceil(max);
        let pad = label_width - row.value.chars().count();
        out.push_str(&row.value);
        out.push_str(&" ".repeat(pad));
        out.push_str(" | ");
        out.extend(std::iter::repeat(BAR_CHAR).take(len));
        out.push_str(&format!(" {}\n", row.count));
    }
    out
}
