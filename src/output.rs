//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every item is shown by its identity (`collection:number`) first, with file
//! paths as indented context lines. Paths are displayed relative to the
//! working root so the output reads the same wherever the tool runs.
//!
//! # Output Format
//!
//! ## Post
//!
//! ```text
//! Quarantined
//!     bukhari:7 (grade is 'Daif', expected 'Sahih')
//! Skipped for this run
//!     muslim:12 (13 slides)
//! Posted muslim:251b → 17895695668004550
//!     01 output/muslim_251b_slide_01.png
//!     02 output/muslim_251b_slide_02.png
//!     Archive: archive/muslim/251
//! ```
//!
//! ## Status
//!
//! ```text
//! Content: 120 items, 112 base ids
//! Posted: 40 (1 quarantined)
//! Remaining: 72
//!
//! bukhari  posted 21, remaining 35
//! muslim   posted 19, remaining 37
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure.

use crate::assemble::{RunOutcome, RunReport};
use crate::content::{ContentItem, ContentStore, ValidationFailure};
use crate::posted::{MigrationReport, PostedStore};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root` when it lies inside it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Post
// ============================================================================

pub fn format_run_report(report: &RunReport, root: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.quarantined.is_empty() {
        lines.push("Quarantined".to_string());
        for q in &report.quarantined {
            lines.push(format!("{}{} ({})", indent(1), q.unique_id, q.reason));
        }
    }
    if !report.oversized.is_empty() {
        lines.push("Skipped for this run".to_string());
        for o in &report.oversized {
            lines.push(format!("{}{} ({} slides)", indent(1), o.unique_id, o.slides));
        }
    }

    let slide_lines = |slides: &[std::path::PathBuf], lines: &mut Vec<String>| {
        for (i, slide) in slides.iter().enumerate() {
            lines.push(format!(
                "{}{:02} {}",
                indent(1),
                i + 1,
                display_path(slide, root)
            ));
        }
    };

    match &report.outcome {
        RunOutcome::Posted {
            unique_id,
            media_id,
            slides,
        } => {
            lines.push(format!("Posted {unique_id} \u{2192} {media_id}"));
            slide_lines(slides, &mut lines);
        }
        RunOutcome::Rendered { unique_id, slides } => {
            lines.push(format!("Rendered {unique_id} (not published)"));
            slide_lines(slides, &mut lines);
        }
        RunOutcome::NothingToPost => {
            lines.push("Nothing to post: every item has been posted".to_string());
        }
        RunOutcome::AlreadyPosted { unique_id } => {
            lines.push(format!("{unique_id} is already posted, nothing to do"));
        }
    }

    if let Some(dir) = &report.archived {
        lines.push(format!("{}Archive: {}", indent(1), display_path(dir, root)));
    }
    lines
}

pub fn print_run_report(report: &RunReport, root: &Path) {
    for line in format_run_report(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Migration
// ============================================================================

pub fn format_migration(report: &MigrationReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Migrated legacy posted state: {}",
        plural(report.migrated.len(), "id", "ids")
    )];
    for err in &report.errors {
        lines.push(format!("{}dropped: {}", indent(1), err));
    }
    lines
}

pub fn print_migration(report: &MigrationReport) {
    for line in format_migration(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Status
// ============================================================================

pub fn format_status(content: &ContentStore, posted: &PostedStore) -> Vec<String> {
    let collections = content.collections();
    let per_collection: Vec<(&str, usize, usize)> = collections
        .iter()
        .map(|&collection| {
            let ids = content.base_ids_in(collection);
            let done = ids.iter().filter(|id| posted.contains(id)).count();
            (collection, done, ids.len() - done)
        })
        .collect();
    let base_ids: usize = per_collection.iter().map(|(_, d, r)| d + r).sum();
    let remaining: usize = per_collection.iter().map(|(_, _, r)| r).sum();
    let quarantined = posted
        .metadata()
        .values()
        .filter(|r| r.is_quarantined())
        .count();

    let mut lines = vec![
        format!(
            "Content: {}, {}",
            plural(content.len(), "item", "items"),
            plural(base_ids, "base id", "base ids")
        ),
        format!("Posted: {} ({} quarantined)", posted.len(), quarantined),
        format!("Remaining: {remaining}"),
    ];

    if !per_collection.is_empty() {
        lines.push(String::new());
        let width = collections.iter().map(|c| c.len()).max().unwrap_or(0);
        for (collection, done, left) in &per_collection {
            lines.push(format!(
                "{collection:<width$}  posted {done}, remaining {left}"
            ));
        }
    }

    if let Some(report) = posted.migration() {
        lines.push(String::new());
        lines.extend(format_migration(report));
    } else if let Some(info) = posted.migration_info() {
        lines.push(String::new());
        lines.push(format!(
            "Migrated from legacy indices on {}",
            info.migrated_at.format("%Y-%m-%d")
        ));
    }
    lines
}

pub fn print_status(content: &ContentStore, posted: &PostedStore) {
    for line in format_status(content, posted) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check(total: usize, failures: &[(&ContentItem, ValidationFailure)]) -> Vec<String> {
    if failures.is_empty() {
        return vec![format!("All {} valid", plural(total, "item", "items"))];
    }
    let mut lines = vec![format!(
        "{} of {} fail validation",
        failures.len(),
        plural(total, "item", "items")
    )];
    for (item, reason) in failures {
        lines.push(format!("{}{} ({})", indent(1), item.unique_id(), reason));
    }
    lines
}

pub fn print_check(total: usize, failures: &[(&ContentItem, ValidationFailure)]) {
    for line in format_check(total, failures) {
        println!("{}", line);
    }
}
