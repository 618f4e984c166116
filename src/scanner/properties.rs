//! Line-oriented `key:: value` property extraction.
//!
//! A file is split into blocks at every newline that is immediately
//! followed by a top-level list marker (`- `). Text before the first
//! marker (the page preamble) forms a block of its own. Each line of a
//! block is matched against the property grammar after leading list
//! markers and whitespace are stripped:
//!
//! ```text
//! - TODO read this
//!   type:: book
//!   due:: 2024-01-01
//! ```
//!
//! Extraction is a pure function of the input text. Lines that do not
//! match are skipped, never reported.

use crate::cache::{Block, Properties};

/// Separator between a property key and its value.
const PROPERTY_SEPARATOR: &str = "::";

/// Extract every property-bearing block from one file's text.
///
/// Blocks with no properties are dropped. `page` is attached to every
/// returned block unchanged.
///
/// # Example
///
/// ```
/// use propdex::scanner::extract_blocks;
///
/// let text = "- Dune\n  type:: book\n- no properties here\n";
/// let blocks = extract_blocks("library", text);
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].page, "library");
/// assert_eq!(blocks[0].properties["type"], "book");
/// ```
#[must_use]
pub fn extract_blocks(page: &str, text: &str) -> Vec<Block> {
    split_blocks(text)
        .into_iter()
        .filter(|block| block.contains(PROPERTY_SEPARATOR))
        .filter_map(|block| {
            let properties = parse_properties(block);
            if properties.is_empty() {
                None
            } else {
                Some(Block::new(page, block, properties))
            }
        })
        .collect()
}

/// Split text into blocks at top-level list item boundaries.
///
/// The newline at each boundary is consumed; the `- ` marker stays with
/// the block it opens. Indented (nested) list items remain part of their
/// parent block.
#[must_use]
pub fn split_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;

    for (idx, _) in text.match_indices("\n- ") {
        blocks.push(&text[start..idx]);
        start = idx + 1;
    }
    blocks.push(&text[start..]);

    blocks
}

/// Parse all properties in a single block.
///
/// When a key appears more than once, the first occurrence wins.
#[must_use]
pub fn parse_properties(block: &str) -> Properties {
    let mut properties = Properties::new();
    for line in block.lines() {
        if let Some((key, value)) = parse_property_line(line) {
            properties
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    properties
}

/// Match one line against the `key:: value` grammar.
///
/// The key is the longest prefix of the first non-whitespace token that
/// is followed by `::`; the value is the rest of the line, trimmed.
/// Returns `None` when either side would be empty.
#[must_use]
pub fn parse_property_line(line: &str) -> Option<(&str, &str)> {
    let stripped = line.trim_start_matches(|c: char| c == '-' || c.is_whitespace());

    let token_end = stripped
        .find(char::is_whitespace)
        .unwrap_or(stripped.len());
    let token = &stripped[..token_end];

    let sep = token.rfind(PROPERTY_SEPARATOR)?;
    let key = token[..sep].trim();
    let value = stripped[sep + PROPERTY_SEPARATOR.len()..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}
