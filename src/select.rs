//! Selector: picks the next unposted item.
//!
//! Each pass:
//!
//! 1. Candidates are items whose `base_id` is neither posted nor excluded for
//!    this run. Variants too short to stand on their own are skipped.
//! 2. No candidates → [`Pick::NotAvailable`].
//! 3. With `prefer_short`, candidates are narrowed to texts of at most
//!    [`SHORT_TEXT_CHARS`] characters, falling back to all candidates when
//!    nothing is that short.
//! 4. The candidate whose collection has the fewest posted `base_id`s wins.
//!    Ties go to the first candidate in content-store order.
//! 5. The winner is validated. A failure quarantines it (recorded as posted
//!    with a reason) and the pass repeats. A selector built with
//!    [`Selector::without_persisting`] excludes the failure for this run only.
//!
//! Every failing pass removes a previously eligible `base_id` from the
//! candidates, so the candidate set strictly shrinks and the loop is bounded
//! by the store size.

use crate::config::ContentConfig;
use crate::content::{ContentStore, ValidationFailure};
use crate::posted::{PostedError, PostedStore};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Texts at most this many characters long count as short.
pub const SHORT_TEXT_CHARS: usize = 800;

/// Content rules applied during selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRules {
    pub accepted_grade: String,
    pub min_variant_chars: usize,
}

impl SelectRules {
    pub fn from_config(config: &ContentConfig) -> Self {
        Self {
            accepted_grade: config.accepted_grade.clone(),
            min_variant_chars: config.min_variant_chars,
        }
    }
}

impl Default for SelectRules {
    fn default() -> Self {
        Self {
            accepted_grade: "Sahih".to_string(),
            min_variant_chars: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pick {
    /// Index into the content store.
    Item(usize),
    NotAvailable,
}

/// An item excluded permanently because it failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quarantined {
    pub unique_id: String,
    pub base_id: String,
    pub reason: ValidationFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub pick: Pick,
    pub quarantined: Vec<Quarantined>,
}

pub struct Selector<'a> {
    content: &'a ContentStore,
    rules: SelectRules,
    excluded: BTreeSet<String>,
    persist_quarantine: bool,
}

impl<'a> Selector<'a> {
    pub fn new(content: &'a ContentStore, rules: SelectRules) -> Self {
        Self {
            content,
            rules,
            excluded: BTreeSet::new(),
            persist_quarantine: true,
        }
    }

    /// Keep quarantines in memory: invalid winners are reported and skipped
    /// for this run, the posted store is never written.
    pub fn without_persisting(mut self) -> Self {
        self.persist_quarantine = false;
        self
    }

    /// Skip `base_id` for the rest of this run without touching the posted store.
    pub fn exclude_for_run(&mut self, base_id: &str) {
        self.excluded.insert(base_id.to_string());
    }

    /// Pick the next item, quarantining any invalid winners on the way.
    ///
    /// Only a failed quarantine write is an error.
    pub fn select(
        &mut self,
        posted: &mut PostedStore,
        prefer_short: bool,
    ) -> Result<Selection, PostedError> {
        let content = self.content;
        let mut quarantined = Vec::new();

        for _ in 0..=content.len() {
            let Some(index) = self.best_candidate(posted, prefer_short) else {
                return Ok(Selection {
                    pick: Pick::NotAvailable,
                    quarantined,
                });
            };
            let item = &content.items()[index];
            match item.validate(&self.rules.accepted_grade) {
                Ok(()) => {
                    debug!(unique_id = %item.unique_id(), "selected");
                    return Ok(Selection {
                        pick: Pick::Item(index),
                        quarantined,
                    });
                }
                Err(reason) => {
                    let identity = item.identity();
                    if self.persist_quarantine {
                        posted.quarantine(item, &reason.to_string())?;
                    } else {
                        self.excluded.insert(identity.base_id.clone());
                    }
                    warn!(
                        unique_id = %identity.unique_id,
                        "quarantined invalid item (not posted): {reason}"
                    );
                    quarantined.push(Quarantined {
                        unique_id: identity.unique_id,
                        base_id: identity.base_id,
                        reason,
                    });
                }
            }
        }

        Ok(Selection {
            pick: Pick::NotAvailable,
            quarantined,
        })
    }

    /// Indices of all eligible items, in store order.
    pub fn candidates(&self, posted: &PostedStore) -> Vec<usize> {
        self.content
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                let base_id = item.base_id();
                !posted.contains(&base_id)
                    && !self.excluded.contains(&base_id)
                    && !item.is_incomplete_variant(self.rules.min_variant_chars)
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn best_candidate(&self, posted: &PostedStore, prefer_short: bool) -> Option<usize> {
        let all = self.candidates(posted);
        if all.is_empty() {
            return None;
        }

        let pool = if prefer_short {
            let short: Vec<usize> = all
                .iter()
                .copied()
                .filter(|&i| self.content.items()[i].text.chars().count() <= SHORT_TEXT_CHARS)
                .collect();
            if short.is_empty() { all } else { short }
        } else {
            all
        };

        let counts = posted.posted_count_by_collection();
        let mut best: Option<(usize, usize)> = None;
        for index in pool {
            let collection = &self.content.items()[index].collection;
            let count = counts.get(collection).copied().unwrap_or(0);
            if best.is_none_or(|(_, best_count)| count < best_count) {
                best = Some((index, count));
            }
        }
        best.map(|(index, _)| index)
    }
}
