//! Posted-state store: the durable record of every `base_id` already emitted.
//!
//! The store is append-only. Every mutation is written back to disk before the
//! call returns, so a successful `mark_posted` is never in-memory only. Writes
//! go through [`atomic`](crate::atomic) to survive a crash mid-write.
//!
//! ## File format
//!
//! ```json
//! {
//!   "posted_ids": ["bukhari:1", "muslim:251"],
//!   "metadata": {
//!     "muslim:251": {
//!       "posted_date": "2026-03-14",
//!       "variant_used": "b",
//!       "unique_id": "muslim:251b",
//!       "reference": "Sahih Muslim 251"
//!     }
//!   },
//!   "migration_info": { ... }
//! }
//! ```
//!
//! Records written by quarantine carry an extra `quarantine_reason`.
//!
//! ## Legacy format
//!
//! Older deployments stored a flat JSON array of positional indices into the
//! content file. Such a file is migrated once on load: each index is resolved
//! against the content store's order and its `base_id` recorded. Out-of-range
//! indices are dropped and reported as [`MigrationError`]s; the migrated file
//! is written back immediately.
//!
//! Any other shape is [`PostedError::UnrecognizedFormat`] and fatal: running on
//! an untrustworthy view of what was posted risks duplicates.

use crate::atomic;
use crate::content::{ContentItem, ContentStore};
use crate::identity;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default file name of the posted state, relative to the working root.
pub const STATE_FILENAME: &str = "posted_hadiths.json";

#[derive(Error, Debug)]
pub enum PostedError {
    #[error("cannot read posted state {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("posted state {path} is in an unrecognized format: {source}")]
    UnrecognizedFormat {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot write posted state {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A legacy index that could not be carried over.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("legacy index {index} is out of range (content store has {len} items)")]
    IndexOutOfRange { index: i64, len: usize },
}

/// Metadata kept for each posted `base_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostedRecord {
    pub posted_date: NaiveDate,
    #[serde(
        default,
        alias = "variant",
        skip_serializing_if = "Option::is_none"
    )]
    pub variant_used: Option<String>,
    pub unique_id: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarantine_reason: Option<String>,
}

impl PostedRecord {
    pub fn is_quarantined(&self) -> bool {
        self.quarantine_reason.is_some()
    }
}

/// Provenance of a migrated state file, persisted alongside the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationInfo {
    pub migrated_at: NaiveDateTime,
    pub original_indices: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_indices: Vec<i64>,
    #[serde(default)]
    pub note: String,
}

/// Outcome of a migration performed during this process's `load`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MigrationReport {
    /// Base ids recorded from legacy indices, in index order.
    pub migrated: Vec<String>,
    pub errors: Vec<MigrationError>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    posted_ids: Vec<String>,
    #[serde(default)]
    metadata: BTreeMap<String, PostedRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migration_info: Option<MigrationInfo>,
}

enum StoredState {
    Current(StateFile),
    LegacyIndices(Vec<i64>),
}

impl StoredState {
    /// Top-level arrays are the legacy schema, everything else the current one.
    fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.is_array() {
            Ok(StoredState::LegacyIndices(serde_json::from_value(value)?))
        } else {
            Ok(StoredState::Current(serde_json::from_value(value)?))
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostedStore {
    path: PathBuf,
    posted: BTreeSet<String>,
    metadata: BTreeMap<String, PostedRecord>,
    migration_info: Option<MigrationInfo>,
    migration: Option<MigrationReport>,
}

impl PostedStore {
    /// Empty store bound to `path`; nothing is written until the first mutation.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            posted: BTreeSet::new(),
            metadata: BTreeMap::new(),
            migration_info: None,
            migration: None,
        }
    }

    /// Load the state at `path`. A missing file is an empty store; a legacy
    /// index list is migrated against `content` and saved.
    pub fn load(path: &Path, content: &ContentStore) -> Result<Self, PostedError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty(path)),
            Err(source) => {
                return Err(PostedError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let state = StoredState::parse(&raw).map_err(|source| PostedError::UnrecognizedFormat {
            path: path.to_path_buf(),
            source,
        })?;

        match state {
            StoredState::Current(file) => {
                let mut posted: BTreeSet<String> = file.posted_ids.into_iter().collect();
                posted.extend(file.metadata.keys().cloned());
                Ok(Self {
                    path: path.to_path_buf(),
                    posted,
                    metadata: file.metadata,
                    migration_info: file.migration_info,
                    migration: None,
                })
            }
            StoredState::LegacyIndices(indices) => {
                let today = Local::now().date_naive();
                let mut store = Self::empty(path);
                let report = store.migrate(&indices, content, today);
                store.migration_info = Some(MigrationInfo {
                    migrated_at: Local::now().naive_local(),
                    original_indices: indices,
                    dropped_indices: report
                        .errors
                        .iter()
                        .map(|MigrationError::IndexOutOfRange { index, .. }| *index)
                        .collect(),
                    note: "Migrated from index-based to base_id tracking".to_string(),
                });
                store.save()?;
                info!(
                    path = %path.display(),
                    migrated = report.migrated.len(),
                    dropped = report.errors.len(),
                    "migrated legacy posted state"
                );
                store.migration = Some(report);
                Ok(store)
            }
        }
    }

    fn migrate(
        &mut self,
        indices: &[i64],
        content: &ContentStore,
        today: NaiveDate,
    ) -> MigrationReport {
        let mut report = MigrationReport::default();
        for &index in indices {
            let item = usize::try_from(index).ok().and_then(|i| content.get(i));
            let Some(item) = item else {
                let err = MigrationError::IndexOutOfRange {
                    index,
                    len: content.len(),
                };
                warn!("dropping legacy posted entry: {err}");
                report.errors.push(err);
                continue;
            };
            let base_id = item.base_id();
            if self.insert(item, today, None) {
                report.migrated.push(base_id);
            }
        }
        report
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, base_id: &str) -> bool {
        self.posted.contains(base_id)
    }

    pub fn posted_ids(&self) -> &BTreeSet<String> {
        &self.posted
    }

    pub fn metadata(&self) -> &BTreeMap<String, PostedRecord> {
        &self.metadata
    }

    pub fn record(&self, base_id: &str) -> Option<&PostedRecord> {
        self.metadata.get(base_id)
    }

    pub fn len(&self) -> usize {
        self.posted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posted.is_empty()
    }

    /// Migration performed by this load, if any.
    pub fn migration(&self) -> Option<&MigrationReport> {
        self.migration.as_ref()
    }

    pub fn migration_info(&self) -> Option<&MigrationInfo> {
        self.migration_info.as_ref()
    }

    /// Number of distinct posted base ids per collection.
    pub fn posted_count_by_collection(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for base_id in &self.posted {
            *counts
                .entry(identity::collection_of(base_id).to_string())
                .or_insert(0) += 1;
        }
        counts
    }

    /// Record `item` as posted today and persist.
    pub fn mark_posted(&mut self, item: &ContentItem) -> Result<(), PostedError> {
        self.mark_posted_on(item, Local::now().date_naive())
    }

    pub fn mark_posted_on(&mut self, item: &ContentItem, date: NaiveDate) -> Result<(), PostedError> {
        self.commit(item, date, None)
    }

    /// Permanently exclude a broken item without posting it.
    pub fn quarantine(&mut self, item: &ContentItem, reason: &str) -> Result<(), PostedError> {
        self.commit(item, Local::now().date_naive(), Some(reason.to_string()))
    }

    /// Forget every posted id. Administrative only.
    pub fn reset(&mut self) -> Result<(), PostedError> {
        self.posted.clear();
        self.metadata.clear();
        self.migration_info = None;
        self.migration = None;
        self.save()
    }

    /// Write the full state to disk.
    pub fn save(&self) -> Result<(), PostedError> {
        let file = StateFile {
            posted_ids: self.posted.iter().cloned().collect(),
            metadata: self.metadata.clone(),
            migration_info: self.migration_info.clone(),
        };
        atomic::write_json(&self.path, &file).map_err(|source| PostedError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn commit(
        &mut self,
        item: &ContentItem,
        date: NaiveDate,
        quarantine_reason: Option<String>,
    ) -> Result<(), PostedError> {
        let base_id = item.base_id();
        if !self.insert(item, date, quarantine_reason) {
            return Ok(());
        }
        if let Err(e) = self.save() {
            self.posted.remove(&base_id);
            self.metadata.remove(&base_id);
            return Err(e);
        }
        Ok(())
    }

    /// Returns false when the base id was already recorded.
    fn insert(
        &mut self,
        item: &ContentItem,
        date: NaiveDate,
        quarantine_reason: Option<String>,
    ) -> bool {
        let identity = item.identity();
        if !self.posted.insert(identity.base_id.clone()) {
            return false;
        }
        self.metadata.insert(
            identity.base_id,
            PostedRecord {
                posted_date: date,
                variant_used: identity.variant.map(String::from),
                unique_id: identity.unique_id,
                reference: item.reference.clone(),
                quarantine_reason,
            },
        );
        true
    }
}
