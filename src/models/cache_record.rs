//! # Cache Record
//!
//! Status/result record for one identifier, the single source of truth for
//! what happened to a job. Each write replaces the whole record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fetch::{FetchError, FetchedFields};

/// Worker-side job state stored in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    InProgress,
    Completed,
    Failed,
}

impl JobState {
    /// `Completed` and `Failed` end the job; only a new submission moves it again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobState::InProgress => "IN_PROGRESS",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// `{"status": ..., "data": {..}}` as stored under `scrape_job:<identifier>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub status: JobState,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl CacheRecord {
    pub fn in_progress() -> Self {
        Self {
            status: JobState::InProgress,
            data: BTreeMap::new(),
        }
    }

    pub fn completed(data: FetchedFields) -> Self {
        Self {
            status: JobState::Completed,
            data,
        }
    }

    /// Failed record carrying the failure description and its kind
    pub fn failed(error: &FetchError) -> Self {
        let mut data = BTreeMap::new();
        data.insert("error".to_string(), error.to_string());
        data.insert("kind".to_string(), error.kind().to_string());
        Self {
            status: JobState::Failed,
            data,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
