//! Identity derivation for content items.
//!
//! Every item is addressed by a `(collection, number)` pair. The number may
//! carry a single trailing lowercase letter marking it as a *variant*: an
//! alternate narration of the same base item (`"251a"`, `"251b"` are both
//! narrations of Muslim 251).
//!
//! Two identifiers are derived from the pair:
//!
//! - **`unique_id`** = `collection:number`, variant-sensitive, used for display
//!   and metadata.
//! - **`base_id`** = `collection:base_number`, variant-insensitive, used for
//!   deduplication. Posting any variant covers all its siblings.
//!
//! Only a pure-digit prefix qualifies for variant parsing:
//! - `"251b"` → base `251`, variant `b`
//! - `"251"`  → base `251`, no variant
//! - `"abc"`  → base `abc`, no variant
//! - `"251B"` → base `251B`, no variant (uppercase is not a variant marker)

use std::fmt;

/// Result of resolving a `(collection, number)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// `collection:number`, variant letter preserved.
    pub unique_id: String,
    /// `collection:base_number`, variant letter stripped.
    pub base_id: String,
    /// Number with any variant letter stripped.
    pub base_number: String,
    /// Trailing variant letter, if present.
    pub variant: Option<char>,
}

/// An item number as it appears in content files: either an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemNumber {
    Int(u64),
    Text(String),
}

impl From<u64> for ItemNumber {
    fn from(n: u64) -> Self {
        ItemNumber::Int(n)
    }
}

impl From<&str> for ItemNumber {
    fn from(s: &str) -> Self {
        ItemNumber::Text(s.to_string())
    }
}

impl From<String> for ItemNumber {
    fn from(s: String) -> Self {
        ItemNumber::Text(s)
    }
}

impl fmt::Display for ItemNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemNumber::Int(n) => write!(f, "{n}"),
            ItemNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Split a number into `(base_number, variant)`.
pub fn split_variant(number: &str) -> (&str, Option<char>) {
    let Some(last) = number.chars().last() else {
        return (number, None);
    };
    if !last.is_ascii_lowercase() {
        return (number, None);
    }
    let prefix = &number[..number.len() - 1];
    if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
        (prefix, Some(last))
    } else {
        (number, None)
    }
}

/// Resolve identifiers for a `(collection, number)` pair.
///
/// Pure and total: every input produces an identity.
pub fn resolve(collection: &str, number: impl Into<ItemNumber>) -> Identity {
    let number = number.into().to_string();
    let (base_number, variant) = split_variant(&number);
    Identity {
        unique_id: format!("{collection}:{number}"),
        base_id: format!("{collection}:{base_number}"),
        base_number: base_number.to_string(),
        variant,
    }
}

/// Collection part of a `base_id` or `unique_id`.
///
/// The number never contains `:`, so the split happens at the last separator.
pub fn collection_of(id: &str) -> &str {
    id.rsplit_once(':').map(|(collection, _)| collection).unwrap_or(id)
}
