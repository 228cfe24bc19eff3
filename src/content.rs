//! Content store: the ordered list of postable items.
//!
//! Items come from a JSON file (default `verified_hadiths.json`) holding either
//! a bare array or an object with a `hadiths` array:
//!
//! ```json
//! {
//!   "metadata": { "source": "..." },
//!   "hadiths": [
//!     {
//!       "collection": "muslim",
//!       "hadith_number": "251b",
//!       "text": "Faith has over sixty branches...",
//!       "reference": "Sahih Muslim 251",
//!       "source": "cdn",
//!       "category": "Faith"
//!     }
//!   ]
//! }
//! ```
//!
//! `hadith_number` may be an integer or a string. File order is the store
//! order: it drives collection tie-breaks and legacy index migration, so it must
//! stay stable across runs.
//!
//! Missing source fields are filled after load: `primary_source` defaults to
//! `reference`, `verification_source` to `"<source> verified"` when a `source`
//! is recorded. Items that still lack a verification source are kept in the
//! store and fail [`ContentItem::validate`] at selection time.

use crate::identity::{self, Identity, ItemNumber};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("cannot read content file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid content file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Why an item failed the integrity check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("text is empty")]
    EmptyText,
    #[error("{0} is empty")]
    MissingSource(&'static str),
    #[error("primary and verification sources are identical")]
    SameSources,
    #[error("grade is '{found}', expected '{expected}'")]
    Grade { found: String, expected: String },
}

/// One postable text unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub collection: String,
    #[serde(
        rename = "hadith_number",
        alias = "number",
        deserialize_with = "deserialize_number"
    )]
    pub number: String,
    pub text: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub reference: String,
    #[serde(default)]
    pub primary_source: String,
    #[serde(default)]
    pub verification_source: String,
    #[serde(default = "default_grade")]
    pub grade: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_grade() -> String {
    "Sahih".to_string()
}

fn deserialize_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Int(u64),
        Text(String),
    }

    Ok(match RawNumber::deserialize(deserializer)? {
        RawNumber::Int(n) => ItemNumber::Int(n).to_string(),
        RawNumber::Text(s) => s,
    })
}

impl ContentItem {
    /// Build a complete item with distinct primary/verification sources.
    pub fn new(
        collection: &str,
        number: impl Into<ItemNumber>,
        text: &str,
        reference: &str,
    ) -> Self {
        Self {
            collection: collection.to_string(),
            number: number.into().to_string(),
            text: text.to_string(),
            category: default_category(),
            reference: reference.to_string(),
            primary_source: reference.to_string(),
            verification_source: format!("{collection} collection verified"),
            grade: default_grade(),
            source: None,
            narrator: None,
            chapter: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn with_grade(mut self, grade: &str) -> Self {
        self.grade = grade.to_string();
        self
    }

    pub fn with_sources(mut self, primary: &str, verification: &str) -> Self {
        self.primary_source = primary.to_string();
        self.verification_source = verification.to_string();
        self
    }

    pub fn identity(&self) -> Identity {
        identity::resolve(&self.collection, self.number.as_str())
    }

    pub fn base_id(&self) -> String {
        self.identity().base_id
    }

    pub fn unique_id(&self) -> String {
        self.identity().unique_id
    }

    /// Integrity check run on every candidate before it is handed out.
    pub fn validate(&self, accepted_grade: &str) -> Result<(), ValidationFailure> {
        if self.text.trim().is_empty() {
            return Err(ValidationFailure::EmptyText);
        }
        let primary = self.primary_source.trim();
        let verification = self.verification_source.trim();
        if primary.is_empty() {
            return Err(ValidationFailure::MissingSource("primary source"));
        }
        if verification.is_empty() {
            return Err(ValidationFailure::MissingSource("verification source"));
        }
        if primary == verification {
            return Err(ValidationFailure::SameSources);
        }
        if self.grade != accepted_grade {
            return Err(ValidationFailure::Grade {
                found: self.grade.clone(),
                expected: accepted_grade.to_string(),
            });
        }
        Ok(())
    }

    /// A variant whose text is too short to stand alone (usually just a chain
    /// note pointing at its sibling).
    pub fn is_incomplete_variant(&self, min_chars: usize) -> bool {
        self.identity().variant.is_some() && self.text.chars().count() < min_chars
    }

    fn fill_source_defaults(&mut self) {
        if self.primary_source.trim().is_empty() {
            self.primary_source = self.reference.clone();
        }
        if self.verification_source.trim().is_empty()
            && let Some(source) = self.source.as_deref().filter(|s| !s.trim().is_empty())
        {
            self.verification_source = format!("{source} verified");
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentFile {
    Wrapped { hadiths: Vec<ContentItem> },
    Bare(Vec<ContentItem>),
}

/// Read-only, ordered collection of content items.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    items: Vec<ContentItem>,
}

impl ContentStore {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    /// Load items from a JSON content file, preserving file order.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let content = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ContentFile =
            serde_json::from_str(&content).map_err(|source| ContentError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let mut items = match file {
            ContentFile::Wrapped { hadiths } => hadiths,
            ContentFile::Bare(items) => items,
        };
        for item in &mut items {
            item.fill_source_defaults();
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ContentItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distinct collection names in first-seen order.
    pub fn collections(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for item in &self.items {
            if !seen.contains(&item.collection.as_str()) {
                seen.push(&item.collection);
            }
        }
        seen
    }

    /// Distinct base ids in a collection.
    pub fn base_ids_in(&self, collection: &str) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for item in self.items.iter().filter(|i| i.collection == collection) {
            let base_id = item.base_id();
            if !ids.contains(&base_id) {
                ids.push(base_id);
            }
        }
        ids
    }

    /// Items failing [`ContentItem::validate`], in store order.
    pub fn validation_failures(&self, accepted_grade: &str) -> Vec<(&ContentItem, ValidationFailure)> {
        self.items
            .iter()
            .filter_map(|item| item.validate(accepted_grade).err().map(|e| (item, e)))
            .collect()
    }
}
