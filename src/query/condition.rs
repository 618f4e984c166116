//! Single query conditions.

use std::fmt;

use crate::cache::Properties;

/// Prefix of the existence condition.
const HAS_PREFIX: &str = "has:";

/// Enclosing quote pairs stripped from exact-match values.
const QUOTE_PAIRS: [(char, char); 4] = [
    ('"', '"'),
    ('\'', '\''),
    ('\u{201c}', '\u{201d}'),
    ('\u{2018}', '\u{2019}'),
];

/// One condition of a query, tested against a block's properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `has:KEY` - the key is present, whatever its value
    Has(String),
    /// `KEY~VALUE` - case-insensitive substring match on the value
    Contains {
        /// Property key (case-sensitive)
        key: String,
        /// Lowercased needle
        needle: String,
    },
    /// `KEY:VALUE` - trimmed value equals the unquoted expected value
    Equals {
        /// Property key (case-sensitive)
        key: String,
        /// Expected value, trimmed and unquoted
        value: String,
    },
    /// Text matching no form; never true
    Unrecognized(String),
}

impl Condition {
    /// Parse one condition.
    ///
    /// Forms are tried in order: `has:`, then the first `~`, then the
    /// first `:`. Surrounding whitespace of the whole condition is
    /// ignored; keys are otherwise taken verbatim.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Some(key) = text.strip_prefix(HAS_PREFIX) {
            return Self::Has(key.to_string());
        }
        if let Some((key, needle)) = text.split_once('~') {
            return Self::Contains {
                key: key.to_string(),
                needle: needle.to_lowercase(),
            };
        }
        if let Some((key, value)) = text.split_once(':') {
            return Self::Equals {
                key: key.to_string(),
                value: unquote(value.trim()).to_string(),
            };
        }
        Self::Unrecognized(text.to_string())
    }

    /// Evaluate against one block's properties.
    #[must_use]
    pub fn matches(&self, properties: &Properties) -> bool {
        match self {
            Self::Has(key) => properties.contains_key(key),
            Self::Contains { key, needle } => properties
                .get(key)
                .is_some_and(|v| v.to_lowercase().contains(needle.as_str())),
            Self::Equals { key, value } => properties
                .get(key)
                .is_some_and(|v| v.trim() == value.as_str()),
            Self::Unrecognized(_) => false,
        }
    }

    /// Property key this condition refers to, if any.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Has(key) | Self::Contains { key, .. } | Self::Equals { key, .. } => Some(key),
            Self::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Has(key) => write!(f, "{HAS_PREFIX}{key}"),
            Self::Contains { key, needle } => write!(f, "{key}~{needle}"),
            Self::Equals { key, value } => write!(f, "{key}:{value}"),
            Self::Unrecognized(text) => write!(f, "{text}"),
        }
    }
}

/// Strip one pair of enclosing straight or curly quotes.
fn unquote(value: &str) -> &str {
    for (open, close) in QUOTE_PAIRS {
        if let Some(inner) = value
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    value
}
