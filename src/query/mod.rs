//! Flat boolean queries over block properties.
//!
//! A query is a disjunction of conjunctions:
//!
//! ```text
//! type:book AND has:due OR type~article
//! ```
//!
//! `AND` binds tighter than `OR`; there are no parentheses, negation or
//! nesting. Each condition is one of the forms in [`Condition`]. Filtering
//! keeps the input order and yields each block at most once.
//!
//! # Example
//!
//! ```
//! use propdex::cache::{Block, Properties};
//! use propdex::query::Query;
//!
//! let mut props = Properties::new();
//! props.insert("type".to_string(), "book".to_string());
//! let blocks = vec![Block::new("library", "- Dune\n  type:: book", props)];
//!
//! let query = Query::parse("type:book OR type:article").unwrap();
//! assert_eq!(query.filter(&blocks).len(), 1);
//! ```

pub mod condition;

use std::fmt;

use crate::cache::{Block, Properties};

pub use condition::Condition;

/// Token separating disjuncts.
pub const OR_TOKEN: &str = " OR ";

/// Token separating conditions within a disjunct.
pub const AND_TOKEN: &str = " AND ";

/// Errors raised before a query is evaluated.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The query text is empty or whitespace only.
    #[error("Query cannot be empty")]
    Empty,
}

/// A parsed query: OR over groups of AND-ed conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    groups: Vec<Vec<Condition>>,
}

impl Query {
    /// Parse query text.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Empty`] for blank input. Malformed conditions
    /// are not errors; they simply never match.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }

        let groups: Vec<Vec<Condition>> = trimmed
            .split(OR_TOKEN)
            .map(|group| group.trim().split(AND_TOKEN).map(Condition::parse).collect())
            .collect();

        Ok(Self {
            text: trimmed.to_string(),
            groups,
        })
    }

    /// The trimmed source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Disjuncts, each a list of conditions that must all hold.
    #[must_use]
    pub fn groups(&self) -> &[Vec<Condition>] {
        &self.groups
    }

    /// Whether a property mapping satisfies the query.
    #[must_use]
    pub fn matches(&self, properties: &Properties) -> bool {
        self.groups
            .iter()
            .any(|group| group.iter().all(|cond| cond.matches(properties)))
    }

    /// Keep the blocks that satisfy the query, in input order.
    #[must_use]
    pub fn filter<'a>(&self, blocks: &'a [Block]) -> Vec<&'a Block> {
        blocks
            .iter()
            .filter(|block| self.matches(&block.properties))
            .collect()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Parse `text` and filter `blocks` with it.
///
/// # Errors
///
/// Returns [`QueryError::Empty`] for blank query text.
pub fn filter_blocks<'a>(blocks: &'a [Block], text: &str) -> Result<Vec<&'a Block>, QueryError> {
    Ok(Query::parse(text)?.filter(blocks))
}
