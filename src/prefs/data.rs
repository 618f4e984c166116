//! Data structures for persisted preferences.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// The whole preference file.
///
/// Keys this version does not know about are kept in `extra` and written
/// back unchanged. Reading is lenient below the top level: a malformed
/// filter or sort entry is dropped on its own instead of invalidating the
/// file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceFile {
    /// Last graph path synchronized successfully
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub graph_path: Option<String>,
    /// Column selection per graph path
    #[serde(default, deserialize_with = "lenient_entries")]
    pub column_filters: BTreeMap<String, ColumnFilter>,
    /// Sort memory per graph path, then per literal query text
    #[serde(default, deserialize_with = "lenient_nested_entries")]
    pub query_sort_memory: BTreeMap<String, BTreeMap<String, SortMemory>>,
    /// Unknown top-level keys
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Column selection remembered for one graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    /// Columns currently shown, in display order
    #[serde(default)]
    pub selected: Vec<String>,
    /// Every column ever observed for this graph
    #[serde(default)]
    pub seen: Vec<String>,
    /// Last update time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl ColumnFilter {
    /// Create a filter stamped with the current time. Both lists are
    /// de-duplicated, keeping first occurrences.
    #[must_use]
    pub fn new(selected: Vec<String>, seen: Vec<String>) -> Self {
        Self {
            selected: unique(selected),
            seen: unique(seen),
            updated_at: Utc::now(),
        }
    }
}

/// Sort direction of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("Unknown sort direction: '{other}' (expected asc or desc)")),
        }
    }
}

/// One column of a sort model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortModelItem {
    /// Column being sorted
    #[serde(rename = "colId")]
    pub col_id: String,
    /// Direction
    pub sort: SortDirection,
    /// Priority among sorted columns (0 first)
    #[serde(rename = "sortIndex", default)]
    pub sort_index: Option<usize>,
}

impl SortModelItem {
    /// Create a sort item with no explicit priority.
    #[must_use]
    pub fn new(col_id: impl Into<String>, sort: SortDirection) -> Self {
        Self {
            col_id: col_id.into(),
            sort,
            sort_index: None,
        }
    }
}

impl FromStr for SortModelItem {
    type Err = String;

    /// Parse `COLUMN` or `COLUMN:asc|desc`. A missing direction means ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (col, dir) = match s.rsplit_once(':') {
            Some((col, dir)) if dir.parse::<SortDirection>().is_ok() => (col, dir.parse()?),
            _ => (s, SortDirection::Asc),
        };
        let col = col.trim();
        if col.is_empty() {
            return Err("Sort column cannot be empty".to_string());
        }
        Ok(Self::new(col, dir))
    }
}

/// Sort state remembered for one (graph, query) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortMemory {
    /// Sanitized sort model
    #[serde(rename = "sortModel", default, deserialize_with = "lenient_items")]
    pub sort_model: Vec<SortModelItem>,
    /// Display column order
    #[serde(rename = "columnOrder", default)]
    pub column_order: Vec<String>,
    /// Last update time
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl SortMemory {
    /// Create sort memory from raw input, sanitizing the model and
    /// de-duplicating the column order.
    #[must_use]
    pub fn new(sort_model: Vec<SortModelItem>, column_order: Vec<String>) -> Self {
        Self {
            sort_model: sanitize_sort_model(sort_model),
            column_order: unique(column_order),
            updated_at: Utc::now(),
        }
    }
}

/// Normalize a sort model.
///
/// Items with a blank column are dropped, a column listed twice keeps its
/// first item, items are ordered by `sort_index` (unindexed items last,
/// otherwise in input order) and then renumbered from 0.
#[must_use]
pub fn sanitize_sort_model(items: Vec<SortModelItem>) -> Vec<SortModelItem> {
    let mut seen = HashSet::new();
    let mut kept: Vec<SortModelItem> = items
        .into_iter()
        .filter_map(|mut item| {
            item.col_id = item.col_id.trim().to_string();
            if item.col_id.is_empty() || !seen.insert(item.col_id.clone()) {
                return None;
            }
            Some(item)
        })
        .collect();

    kept.sort_by_key(|item| item.sort_index.unwrap_or(usize::MAX));
    for (index, item) in kept.iter_mut().enumerate() {
        item.sort_index = Some(index);
    }
    kept
}

/// Remove duplicates, keeping the first occurrence of each value.
#[must_use]
pub fn unique(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => {
            log::warn!("Ignoring non-string graph_path in preferences: {}", other);
            None
        }
    })
}

/// Object entries that fail to deserialize are dropped one by one.
fn entries_from_value<T: DeserializeOwned>(field: &str, value: Value) -> BTreeMap<String, T> {
    let Value::Object(map) = value else {
        if !value.is_null() {
            log::warn!("Ignoring malformed '{}' in preferences", field);
        }
        return BTreeMap::new();
    };
    map.into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                log::warn!("Dropping malformed '{}' entry for {}: {}", field, key, e);
                None
            }
        })
        .collect()
}

fn lenient_entries<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(entries_from_value("column_filters", value))
}

fn lenient_nested_entries<'de, D, T>(
    deserializer: D,
) -> Result<BTreeMap<String, BTreeMap<String, T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(entries_from_value::<Value>("query_sort_memory", value)
        .into_iter()
        .map(|(graph, per_query)| (graph, entries_from_value("query_sort_memory", per_query)))
        .collect())
}

fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// RFC 3339, or a timestamp without offset taken as UTC. Anything else
/// reads as the epoch.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => parse_timestamp(&s).unwrap_or_default(),
        _ => DateTime::<Utc>::default(),
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
