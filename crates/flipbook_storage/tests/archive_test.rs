use chrono::{Duration, TimeZone, Utc};
use flipbook_core::{GenerationRun, RunStatus};
use flipbook_error::{FlipbookErrorKind, StorageErrorKind};
use flipbook_storage::PromptArchive;
use std::num::NonZeroUsize;
use tempfile::TempDir;

fn run_with(prompts: &[&str], requested: usize) -> GenerationRun {
    let mut run = GenerationRun::with_run_id(
        "run_test",
        "a paper boat drifting downstream",
        NonZeroUsize::new(requested).unwrap(),
    );
    for text in prompts {
        run.accept(*text);
    }
    run.finish(None);
    run
}

fn storage_kind(err: &flipbook_error::FlipbookError) -> &StorageErrorKind {
    match err.kind() {
        FlipbookErrorKind::Storage(e) => &e.kind,
        other => panic!("expected storage error, got {other}"),
    }
}

#[tokio::test]
async fn test_round_trip_keeps_prompt_order() {
    let dir = TempDir::new().unwrap();
    let archive = PromptArchive::new(dir.path().join("archive"));
    let prompts = ["one", "two", "three", "four", "five"];
    let run = run_with(&prompts, 5);

    let saved = archive.save(&run).await.unwrap();
    let (latest, record) = archive.load_latest().await.unwrap();

    assert_eq!(saved, latest);
    assert_eq!(record.prompts, prompts);
    assert_eq!(record.frame_count, 5);
    assert_eq!(record.status, Some(RunStatus::Completed));
    assert_eq!(record.run_id.as_deref(), Some("run_test"));
    assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
}

#[tokio::test]
async fn test_partial_run_records_prefix_and_request() {
    let dir = TempDir::new().unwrap();
    let archive = PromptArchive::new(dir.path());
    let run = run_with(&["one", "two"], 4);

    let path = archive.save(&run).await.unwrap();
    let record = archive.load(&path).await.unwrap();

    assert_eq!(record.frame_count, 2);
    assert_eq!(record.requested_frame_count, Some(4));
    assert_eq!(record.status, Some(RunStatus::PartiallyCompleted));
}

#[tokio::test]
async fn test_never_overwrites_existing_record() {
    let dir = TempDir::new().unwrap();
    let archive = PromptArchive::new(dir.path());
    let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

    let first = archive.save_at(&run_with(&["original"], 1), at).await.unwrap();
    let err = archive
        .save_at(&run_with(&["intruder"], 1), at)
        .await
        .unwrap_err();

    assert!(matches!(storage_kind(&err), StorageErrorKind::AlreadyExists(_)));
    let record = archive.load(&first).await.unwrap();
    assert_eq!(record.prompts, vec!["original"]);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_save_leaves_only_complete_records() {
    let dir = TempDir::new().unwrap();
    let archive = PromptArchive::new(dir.path());
    let start = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

    for offset in 0..3 {
        archive
            .save_at(&run_with(&["a", "b"], 2), start + Duration::seconds(offset))
            .await
            .unwrap();
    }

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| PromptArchive::is_record_name(n)));
    for path in archive.list().await.unwrap() {
        assert_eq!(archive.load(&path).await.unwrap().prompts, vec!["a", "b"]);
    }
}

#[tokio::test]
async fn test_latest_picks_most_recent_and_ignores_foreign_files() {
    let dir = TempDir::new().unwrap();
    let archive = PromptArchive::new(dir.path());
    let base = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 58).unwrap();

    // Saved out of order on purpose.
    archive
        .save_at(&run_with(&["middle"], 1), base + Duration::seconds(1))
        .await
        .unwrap();
    let newest = archive
        .save_at(&run_with(&["newest"], 1), base + Duration::seconds(2))
        .await
        .unwrap();
    archive.save_at(&run_with(&["oldest"], 1), base).await.unwrap();
    std::fs::write(dir.path().join("generated_prompts_zzz.json"), "{}").unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not a record").unwrap();

    assert_eq!(archive.latest().await.unwrap(), newest);

    let listed = archive.list().await.unwrap();
    let mut firsts = Vec::new();
    for path in &listed {
        firsts.push(archive.load(path).await.unwrap().prompts[0].clone());
    }
    assert_eq!(firsts, vec!["oldest", "middle", "newest"]);
}

#[tokio::test]
async fn test_latest_on_empty_or_missing_root_is_not_found() {
    let dir = TempDir::new().unwrap();

    let missing = PromptArchive::new(dir.path().join("nowhere"));
    let err = missing.latest().await.unwrap_err();
    assert!(matches!(storage_kind(&err), StorageErrorKind::NotFound(_)));

    let empty = PromptArchive::new(dir.path());
    let err = empty.load_latest().await.unwrap_err();
    assert!(matches!(storage_kind(&err), StorageErrorKind::NotFound(_)));
}

#[tokio::test]
async fn test_loads_minimal_legacy_documents() {
    let dir = TempDir::new().unwrap();
    let archive = PromptArchive::new(dir.path());
    let path = dir
        .path()
        .join("generated_prompts_20240101T000000_000000000.json");
    std::fs::write(
        &path,
        r#"{"timestamp": "2024-01-01T00:00:00", "frame_count": 2, "prompts": ["a", "b"]}"#,
    )
    .unwrap();

    let record = archive.load(&path).await.unwrap();
    assert_eq!(record.prompts, vec!["a", "b"]);
    assert!(record.run_id.is_none());
    assert!(record.status.is_none());
}

#[tokio::test]
async fn test_malformed_record_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    let archive = PromptArchive::new(dir.path());
    let path = dir
        .path()
        .join("generated_prompts_20240101T000000_000000000.json");
    std::fs::write(&path, "not json").unwrap();

    let err = archive.load(&path).await.unwrap_err();
    assert!(matches!(storage_kind(&err), StorageErrorKind::Serialization(_)));
}
