//! Post assembler: one run, at most one posted item.
//!
//! ```text
//! SELECT ──► MEASURE ──► single slide ─────────┐
//!   ▲            │                             ▼
//!   │            └──► PAGINATE ──► fits ──► RENDER_EACH ──► PUBLISH ──► FINALIZE
//!   │                     │
//!   └── exclude for run ◄─┘ more than max_slides
//! ```
//!
//! ## Outcomes and errors
//!
//! | Situation | Result |
//! |---|---|
//! | nothing unposted remains | `Ok(NothingToPost)` |
//! | invalid candidate | quarantined, listed in the report, selection repeats |
//! | too many slides | excluded for this run only, selection repeats preferring short texts |
//! | render or publish failure | `Err`, posted state untouched |
//! | posted state cannot be written | `Err(Persistence)` |
//!
//! The posted state is committed only after the publisher returns a post id.
//! Usage counting and archiving follow the commit and never fail the run.

use crate::archive;
use crate::config::AppConfig;
use crate::content::{ContentError, ContentItem, ContentStore, ValidationFailure};
use crate::paginate::{Pagination, SlideChunk, paginate, with_markers};
use crate::posted::{PostedError, PostedStore};
use crate::publish::{PublishError, Publisher, build_caption};
use crate::render::{RenderError, SlideParams, SlideRenderer, slide_file_name};
use crate::select::{Pick, Quarantined, SelectRules, Selector};
use crate::usage::{UsageCounter, asset_candidates};
use chrono::Local;
use rand::Rng;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("posted state unavailable: {0}")]
    Persistence(#[from] PostedError),
    #[error("content: {0}")]
    Content(#[from] ContentError),
    #[error("render failed for {unique_id}, slide {ordinal}: {source}")]
    Render {
        unique_id: String,
        ordinal: usize,
        source: RenderError,
    },
    #[error("publish failed for {unique_id}: {source}")]
    Publish {
        unique_id: String,
        source: PublishError,
    },
    #[error("index {index} out of range (content has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot post {unique_id}: {reason}")]
    InvalidOverride { unique_id: String, reason: String },
}

/// What one `post` invocation asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRequest {
    pub prefer_short: bool,
    /// Post the item at this content-store position instead of selecting.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted {
        unique_id: String,
        media_id: String,
        slides: Vec<PathBuf>,
    },
    /// Slides rendered without publishing.
    Rendered {
        unique_id: String,
        slides: Vec<PathBuf>,
    },
    NothingToPost,
    /// The override points at an item whose base id is already posted.
    AlreadyPosted { unique_id: String },
}

/// An item skipped this run because it needs too many slides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Oversized {
    pub unique_id: String,
    pub slides: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub quarantined: Vec<Quarantined>,
    pub oversized: Vec<Oversized>,
    pub archived: Option<PathBuf>,
}

impl RunReport {
    fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            quarantined: Vec::new(),
            oversized: Vec::new(),
            archived: None,
        }
    }
}

/// Content, posted state and usage counter for one run.
pub struct Stores {
    pub content: ContentStore,
    pub posted: PostedStore,
    pub usage: UsageCounter,
}

impl Stores {
    /// Load all stores from the paths configured under `root`.
    pub fn open(root: &Path, config: &AppConfig) -> Result<Self, RunError> {
        let content = ContentStore::load(&root.join(&config.content.file))?;
        let posted = PostedStore::load(&root.join(&config.state.posted_file), &content)?;
        let usage = UsageCounter::load(&root.join(&config.state.usage_file));
        Ok(Self {
            content,
            posted,
            usage,
        })
    }
}

/// Split `text` into slides: one slide if it fits the full budget, otherwise
/// paginated against the renderer's metrics. Paginated chunks are measured
/// with both continuation markers, as drawn on a middle slide.
pub fn plan_slides(renderer: &impl SlideRenderer, text: &str, min_words_last: usize) -> Pagination {
    let budget = renderer.text_budget();
    if renderer.measure(text) <= budget {
        let words: Vec<&str> = text.split_whitespace().collect();
        return Pagination {
            chunks: vec![SlideChunk {
                ordinal: 1,
                total: 1,
                text: words.join(" "),
            }],
            overflowing: Vec::new(),
        };
    }
    paginate(
        text,
        |s| renderer.measure(&with_markers(s)),
        budget,
        min_words_last,
    )
}

/// Run one post. With no `publisher` the slides are rendered and the run
/// stops there, leaving all state untouched.
pub fn run_post_with<R: Rng + ?Sized>(
    renderer: &impl SlideRenderer,
    publisher: Option<&dyn Publisher>,
    stores: &mut Stores,
    root: &Path,
    config: &AppConfig,
    request: &PostRequest,
    rng: &mut R,
) -> Result<RunReport, RunError> {
    let Stores {
        content,
        posted,
        usage,
    } = stores;

    if let Some(index) = request.index {
        let item = content.get(index).ok_or(RunError::IndexOutOfRange {
            index,
            len: content.len(),
        })?;
        if posted.contains(&item.base_id()) {
            return Ok(RunReport::new(RunOutcome::AlreadyPosted {
                unique_id: item.unique_id(),
            }));
        }
        item.validate(&config.content.accepted_grade)
            .map_err(|reason: ValidationFailure| RunError::InvalidOverride {
                unique_id: item.unique_id(),
                reason: reason.to_string(),
            })?;
        let pagination = plan_slides(renderer, &item.text, config.slides.min_words_last_slide);
        if pagination.exceeds(config.slides.max_slides) {
            return Err(RunError::InvalidOverride {
                unique_id: item.unique_id(),
                reason: format!(
                    "needs {} slides, limit is {}",
                    pagination.len(),
                    config.slides.max_slides
                ),
            });
        }
        let mut report = RunReport::new(RunOutcome::NothingToPost);
        produce(
            renderer, publisher, item, &pagination, posted, usage, root, config, rng,
            &mut report,
        )?;
        return Ok(report);
    }

    let mut selector = Selector::new(content, SelectRules::from_config(&config.content));
    if publisher.is_none() {
        selector = selector.without_persisting();
    }
    let mut prefer_short = request.prefer_short;
    let mut report = RunReport::new(RunOutcome::NothingToPost);

    // Each oversized pass excludes one more base id, so this ends.
    loop {
        let selection = selector.select(posted, prefer_short)?;
        report.quarantined.extend(selection.quarantined);
        let index = match selection.pick {
            Pick::Item(index) => index,
            Pick::NotAvailable => {
                info!("nothing left to post");
                return Ok(report);
            }
        };
        let item = &content.items()[index];

        let pagination = plan_slides(renderer, &item.text, config.slides.min_words_last_slide);
        if pagination.exceeds(config.slides.max_slides) {
            info!(
                unique_id = %item.unique_id(),
                slides = pagination.len(),
                max = config.slides.max_slides,
                "skipping oversized item for this run"
            );
            report.oversized.push(Oversized {
                unique_id: item.unique_id(),
                slides: pagination.len(),
            });
            selector.exclude_for_run(&item.base_id());
            prefer_short = true;
            continue;
        }

        produce(
            renderer, publisher, item, &pagination, posted, usage, root, config, rng,
            &mut report,
        )?;
        return Ok(report);
    }
}

/// Render, publish and finalize one item, filling in `report`.
#[allow(clippy::too_many_arguments)]
fn produce<R: Rng + ?Sized>(
    renderer: &impl SlideRenderer,
    publisher: Option<&dyn Publisher>,
    item: &ContentItem,
    pagination: &Pagination,
    posted: &mut PostedStore,
    usage: &mut UsageCounter,
    root: &Path,
    config: &AppConfig,
    rng: &mut R,
    report: &mut RunReport,
) -> Result<(), RunError> {
    let unique_id = item.unique_id();
    for ordinal in &pagination.overflowing {
        warn!(unique_id = %unique_id, ordinal, "single word taller than the slide budget");
    }

    let asset = if config.assets.enabled {
        let candidates = asset_candidates(
            root,
            config.assets.image_for(&item.category),
            &config.assets.dir,
        );
        usage.pick_least_used(&candidates, rng).cloned()
    } else {
        None
    };

    let output_dir = root.join(&config.slides.output_dir);
    let reference = format!("{} ({})", item.primary_source, item.grade);
    let mut slides = Vec::with_capacity(pagination.len());
    for chunk in &pagination.chunks {
        let params = SlideParams {
            text: chunk.display_text(),
            theme: config.theme.name,
            asset: asset.as_ref().map(|a| root.join(a)),
            ordinal: chunk.ordinal,
            total: chunk.total,
            reference: reference.clone(),
            output: output_dir.join(slide_file_name(&item.collection, &item.number, chunk.ordinal)),
        };
        let path = renderer
            .render_slide(&params)
            .map_err(|source| RunError::Render {
                unique_id: unique_id.clone(),
                ordinal: chunk.ordinal,
                source,
            })?;
        slides.push(path);
    }

    let Some(publisher) = publisher else {
        info!(unique_id = %unique_id, slides = slides.len(), "rendered without publishing");
        report.outcome = RunOutcome::Rendered { unique_id, slides };
        return Ok(());
    };

    let caption = build_caption(item, &config.posting, &config.layout.verification_note);
    let media_id = publisher
        .publish(&slides, &caption, &config.posting.hashtags)
        .map_err(|source| RunError::Publish {
            unique_id: unique_id.clone(),
            source,
        })?;

    posted.mark_posted(item)?;
    info!(unique_id = %unique_id, media_id = %media_id, slides = slides.len(), "posted");

    if let Some(asset) = &asset {
        usage.record_use(asset);
        if let Err(e) = usage.save() {
            warn!("image usage not saved: {e}");
        }
    }

    if config.archive.enabled {
        match archive::archive_post(
            &root.join(&config.archive.dir),
            &item.identity(),
            &media_id,
            &slides,
            Local::now().naive_local(),
        ) {
            Ok(dir) => report.archived = Some(dir),
            Err(e) => warn!(unique_id = %unique_id, "archive failed: {e}"),
        }
    }

    report.outcome = RunOutcome::Posted {
        unique_id,
        media_id,
        slides,
    };
    Ok(())
}
