//! Image-usage counter: how often each background asset has been posted.
//!
//! Stored as a flat JSON object (`image_usage.json`) mapping an asset path,
//! relative to the working root, to its use count. The counter only biases the
//! asset choice toward least-used images; it carries no correctness invariant.
//! A missing or corrupt file is treated as empty (corruption is logged).

use crate::atomic;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

/// Default file name of the usage counter, relative to the working root.
pub const USAGE_FILENAME: &str = "image_usage.json";

const ASSET_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Error, Debug)]
pub enum UsageError {
    #[error("cannot write image usage {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct UsageCounter {
    path: PathBuf,
    counts: BTreeMap<String, u64>,
}

impl UsageCounter {
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            counts: BTreeMap::new(),
        }
    }

    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), "cannot read image usage, starting empty: {e}");
                }
                return Self::empty(path);
            }
        };
        match serde_json::from_str(&content) {
            Ok(counts) => Self {
                path: path.to_path_buf(),
                counts,
            },
            Err(e) => {
                warn!(path = %path.display(), "corrupt image usage, starting empty: {e}");
                Self::empty(path)
            }
        }
    }

    pub fn save(&self) -> Result<(), UsageError> {
        atomic::write_json(&self.path, &self.counts).map_err(|source| UsageError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn count(&self, asset: &str) -> u64 {
        self.counts.get(asset).copied().unwrap_or(0)
    }

    pub fn record_use(&mut self, asset: &str) {
        *self.counts.entry(asset.to_string()).or_insert(0) += 1;
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Least-used candidate; ties are broken at random.
    pub fn pick_least_used<'a, R: Rng + ?Sized>(
        &self,
        candidates: &'a [String],
        rng: &mut R,
    ) -> Option<&'a String> {
        let min = candidates.iter().map(|c| self.count(c)).min()?;
        let least: Vec<&'a String> = candidates
            .iter()
            .filter(|c| self.count(c) == min)
            .collect();
        least.choose(rng).copied()
    }
}

/// Candidate assets for one post, as root-relative paths.
///
/// A `preferred` asset (the category's configured image) wins when it exists on
/// disk; otherwise every image under `dir` is a candidate.
pub fn asset_candidates(root: &Path, preferred: Option<&str>, dir: &str) -> Vec<String> {
    if let Some(preferred) = preferred
        && root.join(preferred).is_file()
    {
        return vec![preferred.to_string()];
    }
    discover_assets(root, dir)
}

/// All images under `root/dir`, sorted, as `/`-separated root-relative paths.
pub fn discover_assets(root: &Path, dir: &str) -> Vec<String> {
    let mut assets: Vec<String> = WalkDir::new(root.join(dir))
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ASSET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            let parts: Vec<_> = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(parts.join("/"))
        })
        .collect();
    assets.sort();
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let counter = UsageCounter::load(&tmp.path().join(USAGE_FILENAME));
        assert!(counter.counts().is_empty());
    }

    #[test]
    fn corrupt_file_is_replaced_by_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(USAGE_FILENAME);
        fs::write(&path, "[1, 2").unwrap();
        let counter = UsageCounter::load(&path);
        assert!(counter.counts().is_empty());
    }

    #[test]
    fn record_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(USAGE_FILENAME);
        let mut counter = UsageCounter::load(&path);
        counter.record_use("images/a.jpg");
        counter.record_use("images/a.jpg");
        counter.record_use("images/b.jpg");
        counter.save().unwrap();

        let reloaded = UsageCounter::load(&path);
        assert_eq!(reloaded.count("images/a.jpg"), 2);
        assert_eq!(reloaded.count("images/b.jpg"), 1);
        assert_eq!(reloaded.count("images/c.jpg"), 0);
    }

    #[test]
    fn picks_least_used() {
        let tmp = TempDir::new().unwrap();
        let mut counter = UsageCounter::empty(&tmp.path().join(USAGE_FILENAME));
        counter.record_use("a.jpg");
        counter.record_use("b.jpg");
        let candidates = vec!["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()];
        let mut rng = StdRng::from_seed([0_u8; 32]);

        assert_eq!(
            counter.pick_least_used(&candidates, &mut rng).map(String::as_str),
            Some("c.jpg")
        );
    }

    #[test]
    fn tie_break_stays_within_least_used() {
        let tmp = TempDir::new().unwrap();
        let mut counter = UsageCounter::empty(&tmp.path().join(USAGE_FILENAME));
        counter.record_use("a.jpg");
        let candidates = vec!["a.jpg".to_string(), "b.jpg".to_string(), "c.jpg".to_string()];
        let mut rng = StdRng::from_seed([7_u8; 32]);

        for _ in 0..20 {
            let picked = counter.pick_least_used(&candidates, &mut rng).unwrap();
            assert_ne!(picked, "a.jpg");
        }
    }

    #[test]
    fn no_candidates_picks_nothing() {
        let tmp = TempDir::new().unwrap();
        let counter = UsageCounter::empty(&tmp.path().join(USAGE_FILENAME));
        let mut rng = StdRng::from_seed([0_u8; 32]);
        assert!(counter.pick_least_used(&[], &mut rng).is_none());
    }

    // =========================================================================
    // Asset discovery
    // =========================================================================

    #[test]
    fn discovers_images_recursively() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("images/nature")).unwrap();
        fs::create_dir_all(tmp.path().join("images/patterns")).unwrap();
        fs::write(tmp.path().join("images/nature/sky.jpg"), "").unwrap();
        fs::write(tmp.path().join("images/patterns/gold.PNG"), "").unwrap();
        fs::write(tmp.path().join("images/notes.txt"), "").unwrap();

        let assets = discover_assets(tmp.path(), "images");
        assert_eq!(assets, vec!["images/nature/sky.jpg", "images/patterns/gold.PNG"]);
    }

    #[test]
    fn missing_dir_has_no_assets() {
        let tmp = TempDir::new().unwrap();
        assert!(discover_assets(tmp.path(), "images").is_empty());
    }

    #[test]
    fn preferred_asset_wins_when_present() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("images/nature")).unwrap();
        fs::write(tmp.path().join("images/nature/sky.jpg"), "").unwrap();
        fs::write(tmp.path().join("images/nature/lake.jpg"), "").unwrap();

        assert_eq!(
            asset_candidates(tmp.path(), Some("images/nature/lake.jpg"), "images"),
            vec!["images/nature/lake.jpg"]
        );
        assert_eq!(
            asset_candidates(tmp.path(), Some("images/missing.jpg"), "images").len(),
            2
        );
    }
}
