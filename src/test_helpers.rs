//! Shared test utilities for the hadith-carousel test suite.
//!
//! Item builders that produce valid content, plus store setup in a temp dir.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, mut posted) = empty_posted_store();
//! let content = ContentStore::new(vec![item("bukhari", "1"), item("muslim", "251b")]);
//! posted.mark_posted(&content.items()[1]).unwrap();
//! ```

use tempfile::TempDir;

use crate::content::ContentItem;
use crate::posted::{PostedStore, STATE_FILENAME};

// =========================================================================
// Items
// =========================================================================

/// A valid item with twenty words of filler text.
pub fn item(collection: &str, number: &str) -> ContentItem {
    item_with_text(collection, number, &words(20))
}

/// A valid item with the given text.
pub fn item_with_text(collection: &str, number: &str, text: &str) -> ContentItem {
    ContentItem::new(collection, number, text, &format!("{collection} {number}"))
}

/// `"w1 w2 ... wN"`.
pub fn words(n: usize) -> String {
    (1..=n)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// =========================================================================
// Stores
// =========================================================================

/// An empty posted store backed by a file inside a fresh temp dir.
///
/// Keep the returned `TempDir` alive for as long as the store is used.
pub fn empty_posted_store() -> (TempDir, PostedStore) {
    let tmp = TempDir::new().unwrap();
    let store = PostedStore::empty(&tmp.path().join(STATE_FILENAME));
    (tmp, store)
}
