//! Post-success archive of rendered slides.
//!
//! ```text
//! archive/
//! └── muslim/
//!     └── 251/
//!         ├── muslim_251b_slide_01.png
//!         ├── muslim_251b_slide_02.png
//!         └── post.json
//! ```
//!
//! The archive runs after the posted state is final, so callers log a failure
//! here and carry on.

use crate::atomic;
use crate::identity::{Identity, collection_of};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RECORD_FILENAME: &str = "post.json";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("cannot archive {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Sidecar written next to the archived slides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub unique_id: String,
    pub media_id: String,
    pub archived_at: NaiveDateTime,
    pub slides: Vec<String>,
}

/// Directory holding the archive for `identity`.
pub fn archive_dir(archive_root: &Path, identity: &Identity) -> PathBuf {
    let collection = collection_of(&identity.base_id);
    archive_root.join(collection).join(&identity.base_number)
}

/// Copy `slides` into the archive and write the sidecar record.
pub fn archive_post(
    archive_root: &Path,
    identity: &Identity,
    media_id: &str,
    slides: &[PathBuf],
    archived_at: NaiveDateTime,
) -> Result<PathBuf, ArchiveError> {
    let dir = archive_dir(archive_root, identity);
    std::fs::create_dir_all(&dir).map_err(|source| ArchiveError::Io {
        path: dir.clone(),
        source,
    })?;

    let mut names = Vec::with_capacity(slides.len());
    for slide in slides {
        let Some(name) = slide.file_name() else {
            continue;
        };
        let dest = dir.join(name);
        std::fs::copy(slide, &dest).map_err(|source| ArchiveError::Io {
            path: slide.clone(),
            source,
        })?;
        names.push(name.to_string_lossy().into_owned());
    }

    let record = ArchiveRecord {
        unique_id: identity.unique_id.clone(),
        media_id: media_id.to_string(),
        archived_at,
        slides: names,
    };
    let record_path = dir.join(RECORD_FILENAME);
    atomic::write_json(&record_path, &record).map_err(|source| ArchiveError::Io {
        path: record_path,
        source,
    })?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::resolve;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn dir_uses_collection_and_base_number() {
        let identity = resolve("muslim", "251b");
        assert_eq!(
            archive_dir(Path::new("archive"), &identity),
            Path::new("archive/muslim/251")
        );
    }

    #[test]
    fn copies_slides_and_writes_record() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("output");
        std::fs::create_dir_all(&out).unwrap();
        let slides: Vec<PathBuf> = (1..=2)
            .map(|i| {
                let p = out.join(format!("bukhari_1_slide_{i:02}.png"));
                std::fs::write(&p, format!("slide {i}")).unwrap();
                p
            })
            .collect();

        let dir = archive_post(
            &tmp.path().join("archive"),
            &resolve("bukhari", 1u64),
            "1789",
            &slides,
            at(),
        )
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.join("bukhari_1_slide_02.png")).unwrap(),
            "slide 2"
        );
        let record: ArchiveRecord =
            serde_json::from_str(&std::fs::read_to_string(dir.join(RECORD_FILENAME)).unwrap())
                .unwrap();
        assert_eq!(record.media_id, "1789");
        assert_eq!(record.unique_id, "bukhari:1");
        assert_eq!(record.slides.len(), 2);
    }

    #[test]
    fn missing_slide_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = archive_post(
            tmp.path(),
            &resolve("bukhari", 1u64),
            "1",
            &[tmp.path().join("gone.png")],
            at(),
        );
        assert!(matches!(result, Err(ArchiveError::Io { .. })));
    }
}
