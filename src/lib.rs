//! # Hadith Carousel
//!
//! Turns a curated collection of verified hadith into Instagram carousel
//! posts, one per run, without ever posting the same narration twice.
//!
//! # Architecture: One Run, One Post
//!
//! Each invocation is a short batch job, usually fired by a scheduler:
//!
//! ```text
//! 1. Select     content + posted state  →  one unposted item
//! 2. Paginate   item text + font metrics →  slide chunks
//! 3. Render     chunks                   →  output/*.png
//! 4. Publish    slides + caption         →  media id
//! 5. Finalize   media id                 →  posted state, usage, archive
//! ```
//!
//! Nothing is committed until step 4 succeeds, so a failed run can simply be
//! repeated.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`identity`] | `unique_id` / `base_id` derivation, variant parsing |
//! | [`content`] | Content file loading, the ordered content store, integrity checks |
//! | [`posted`] | Posted-state store: dedup by `base_id`, legacy migration, atomic saves |
//! | [`usage`] | Background image usage counter and least-used asset choice |
//! | [`select`] | Fair selection across collections with quarantine of invalid items |
//! | [`paginate`] | Pure, deterministic text-to-slides splitting |
//! | [`render`] | Slide layout, glyph rasterization, the renderer seam |
//! | [`publish`] | Captions and the Instagram Graph API client |
//! | [`assemble`] | The per-run state machine tying it all together |
//! | [`archive`] | Copies of posted slides under `archive/` |
//! | [`config`] | `config.toml` loading, merging over stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Deduplicate by Base Id
//!
//! Collections number alternate narrations of one hadith as variants (`251a`,
//! `251b`). Posting any variant marks the whole family: the posted store keys
//! on `collection:base_number`, and the selector never looks at a sibling
//! again.
//!
//! ## Quarantine Instead of Crash
//!
//! An item that fails its integrity check when selected is recorded as posted
//! with a `quarantine_reason`. It stays out of every future run, the log says
//! why, and the run moves on to the next candidate.
//!
//! ## Trait Seams for Side Effects
//!
//! Rendering and publishing sit behind [`render::SlideRenderer`] and
//! [`publish::Publisher`]. The whole pipeline runs in tests against recording
//! mocks, with no fonts and no network.

pub mod archive;
pub mod assemble;
pub mod atomic;
pub mod config;
pub mod content;
pub mod identity;
pub mod output;
pub mod paginate;
pub mod posted;
pub mod publish;
pub mod render;
pub mod select;
pub mod usage;

#[cfg(test)]
pub(crate) mod test_helpers;
