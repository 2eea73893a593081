use flipbook_core::{FramePrompt, GenerationRun, RunStatus};
use std::num::NonZeroUsize;

fn requested(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn test_new_run_is_in_progress_and_empty() {
    let run = GenerationRun::start("a lighthouse at dusk", requested(5));
    assert_eq!(*run.status(), RunStatus::InProgress);
    assert!(run.produced_prompts().is_empty());
    assert_eq!(*run.requested_frame_count(), 5);
    assert!(run.run_id().starts_with("run_"));
    assert_eq!(run.next_index(), 1);
}

#[test]
fn test_completed_run_holds_exactly_requested_prompts() {
    let mut run = GenerationRun::with_run_id("run_a", "scene", requested(3));
    for text in ["one", "two", "three"] {
        run.accept(text);
    }
    assert_eq!(run.finish(None), RunStatus::Completed);
    assert_eq!(run.produced_prompts().len(), 3);

    let indices: Vec<usize> = run.produced_prompts().iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[test]
fn test_partial_run_keeps_prefix_and_diagnostic() {
    let mut run = GenerationRun::with_run_id("run_b", "scene", requested(5));
    run.accept("one");
    run.accept("two");
    let status = run.finish(Some("frame 3: request rejected".into()));

    assert_eq!(status, RunStatus::PartiallyCompleted);
    assert_eq!(run.prompt_texts(), vec!["one", "two"]);
    assert_eq!(run.diagnostic().as_deref(), Some("frame 3: request rejected"));
    assert_eq!(
        run.last_accepted(),
        Some(&FramePrompt {
            index: 2,
            text: "two".into(),
            derived_from: Some(1),
        })
    );
}

#[test]
fn test_run_status_serializes_snake_case() {
    let json = serde_json::to_string(&RunStatus::PartiallyCompleted).unwrap();
    assert_eq!(json, "\"partially_completed\"");
    let back: RunStatus = serde_json::from_str("\"failed\"").unwrap();
    assert_eq!(back, RunStatus::Failed);
}

#[test]
fn test_run_round_trips_through_json() {
    let mut run = GenerationRun::with_run_id("run_c", "scene", requested(2));
    run.accept("one");
    run.finish(Some("stopped".into()));

    let json = serde_json::to_string(&run).unwrap();
    let back: GenerationRun = serde_json::from_str(&json).unwrap();
    assert_eq!(back, run);
}
