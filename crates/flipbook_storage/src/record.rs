//! On-disk record format.

use chrono::{DateTime, SecondsFormat, Utc};
use flipbook_core::{GenerationRun, RunStatus};
use serde::{Deserialize, Serialize};

/// One persisted generation run.
///
/// `timestamp`, `frame_count` and `prompts` are always present. The remaining
/// fields are written by this crate but optional on read, so bare
/// `{timestamp, frame_count, prompts}` documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    /// ISO-8601 time the record was written
    pub timestamp: String,
    /// Number of prompts in the record
    pub frame_count: usize,
    /// Prompt texts in frame order
    pub prompts: Vec<String>,
    /// Identifier of the run that produced the prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Scene the run animated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_description: Option<String>,
    /// How many prompts were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_frame_count: Option<usize>,
    /// Terminal status of the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
}

impl ArchiveRecord {
    /// Snapshot a run at the given instant.
    pub fn from_run(run: &GenerationRun, at: DateTime<Utc>) -> Self {
        let prompts: Vec<String> = run.prompt_texts().into_iter().map(String::from).collect();
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, true),
            frame_count: prompts.len(),
            prompts,
            run_id: Some(run.run_id().clone()),
            scene_description: Some(run.scene_description().clone()),
            requested_frame_count: Some(*run.requested_frame_count()),
            status: Some(*run.status()),
        }
    }
}
