//! Filesystem-backed prompt archive.

use crate::ArchiveRecord;
use chrono::{DateTime, Utc};
use flipbook_core::GenerationRun;
use flipbook_error::{FlipbookResult, StorageError, StorageErrorKind};
use regex::Regex;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// File name prefix shared by every archive record.
pub const ARCHIVE_PREFIX: &str = "generated_prompts_";

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S_%9f";

static RECORD_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^generated_prompts_\d{8}T\d{6}_\d{9}\.json$").expect("valid regex")
});

/// Archive of generation runs under a single root directory.
///
/// Layout:
///
/// ```text
/// {root}/
/// ├── generated_prompts_20250101T090000_000000000.json
/// └── generated_prompts_20250101T091500_123456789.json
/// ```
///
/// Names carry a zero-padded, nanosecond-precision UTC timestamp, so the
/// lexicographically greatest name is the most recent record. Existing
/// records are never overwritten.
#[derive(Debug, Clone)]
pub struct PromptArchive {
    root: PathBuf,
}

impl PromptArchive {
    /// Archive rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Archive root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File name for a record written at `at`.
    pub fn record_name(at: DateTime<Utc>) -> String {
        format!("{}{}.json", ARCHIVE_PREFIX, at.format(TIMESTAMP_FORMAT))
    }

    /// Whether `name` follows the archive naming convention.
    pub fn is_record_name(name: &str) -> bool {
        RECORD_NAME_RE.is_match(name)
    }

    /// Persist `run` as a new record stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if a record with the same timestamp is
    /// already present, or a write error if the root cannot be prepared.
    #[tracing::instrument(skip(self, run), fields(run_id = %run.run_id(), prompts = run.produced_prompts().len()))]
    pub async fn save(&self, run: &GenerationRun) -> FlipbookResult<PathBuf> {
        self.save_at(run, Utc::now()).await
    }

    /// Persist `run` as a record stamped with `at`.
    ///
    /// The record is written to a hidden temporary file in the root and only
    /// linked under its final name once complete, so a failed write never
    /// leaves a truncated record behind.
    #[tracing::instrument(skip(self, run), fields(run_id = %run.run_id()))]
    pub async fn save_at(&self, run: &GenerationRun, at: DateTime<Utc>) -> FlipbookResult<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                self.root.display(),
                e
            )))
        })?;

        let record = ArchiveRecord::from_run(run, at);
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;

        let path = self.root.join(Self::record_name(at));
        let root = self.root.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || write_record(&root, &target, &json))
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "{}: write task failed: {}",
                    path.display(),
                    e
                )))
            })??;

        tracing::info!(path = %path.display(), frame_count = record.frame_count, "Archived prompts");
        Ok(path)
    }

    /// All record paths in chronological order.
    ///
    /// A missing root is treated as an empty archive.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn list(&self) -> FlipbookResult<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    self.root.display(),
                    e
                )))
                .into());
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.root.display(),
                e
            )))
        })? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if Self::is_record_name(&name) {
                names.push(name);
            }
        }
        names.sort();

        tracing::debug!(count = names.len(), "Listed archive records");
        Ok(names.into_iter().map(|n| self.root.join(n)).collect())
    }

    /// Path of the most recent record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no file under the root matches the naming
    /// convention.
    pub async fn latest(&self) -> FlipbookResult<PathBuf> {
        self.list().await?.pop().ok_or_else(|| {
            StorageError::new(StorageErrorKind::NotFound(format!(
                "no {}*.json records in {}",
                ARCHIVE_PREFIX,
                self.root.display()
            )))
            .into()
        })
    }

    /// Read and parse one record.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self, path: &Path) -> FlipbookResult<ArchiveRecord> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            let kind = if e.kind() == ErrorKind::NotFound {
                StorageErrorKind::NotFound(path.display().to_string())
            } else {
                StorageErrorKind::FileRead(format!("{}: {}", path.display(), e))
            };
            StorageError::new(kind)
        })?;

        let record: ArchiveRecord = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::new(StorageErrorKind::Serialization(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(record)
    }

    /// Load the most recent record along with its path.
    pub async fn load_latest(&self) -> FlipbookResult<(PathBuf, ArchiveRecord)> {
        let path = self.latest().await?;
        let record = self.load(&path).await?;
        Ok((path, record))
    }
}

/// Write `json` beside `target` and move it into place without clobbering.
fn write_record(root: &Path, target: &Path, json: &[u8]) -> Result<(), StorageError> {
    let write_failed = |e: std::io::Error| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            target.display(),
            e
        )))
    };

    let mut pending = tempfile::Builder::new()
        .prefix(".pending_")
        .suffix(".json")
        .tempfile_in(root)
        .map_err(write_failed)?;
    pending.write_all(json).map_err(write_failed)?;
    pending.as_file().sync_all().map_err(write_failed)?;

    pending.persist_noclobber(target).map_err(|e| {
        if e.error.kind() == ErrorKind::AlreadyExists {
            StorageError::new(StorageErrorKind::AlreadyExists(target.display().to_string()))
        } else {
            write_failed(e.error)
        }
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_name_is_fixed_width() {
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let name = PromptArchive::record_name(early);
        assert_eq!(name, "generated_prompts_20240102T030405_000000000.json");
        assert!(PromptArchive::is_record_name(&name));
    }

    #[test]
    fn test_name_order_matches_time_order() {
        let a = Utc.with_ymd_and_hms(2024, 9, 30, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap();
        assert!(PromptArchive::record_name(a) < PromptArchive::record_name(b));
    }

    #[test]
    fn test_foreign_names_are_rejected() {
        assert!(!PromptArchive::is_record_name("generated_prompts_20240101_120000.json"));
        assert!(!PromptArchive::is_record_name("notes.json"));
        assert!(!PromptArchive::is_record_name(
            "generated_prompts_20240102T030405_000000000.json.bak"
        ));
    }
}
