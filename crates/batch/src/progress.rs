//! Per-job progress records persisted as JSON.

use crate::error::Result;
use chrono::{DateTime, Local};
use retemplate_core::ProgressEvent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Lifecycle of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Whether the job has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Snapshot of a job as written to `progress/<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub ts: DateTime<Local>,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default)]
    pub current_file: Option<String>,
    #[serde(default)]
    pub converted_count: usize,
    #[serde(default)]
    pub total_files: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_files: Option<Vec<String>>,
}

impl ProgressRecord {
    pub fn new(status: JobStatus) -> Self {
        Self {
            ts: Local::now(),
            status,
            stage: None,
            current_file: None,
            converted_count: 0,
            total_files: 0,
            converted_files: None,
            error: None,
            other_files: None,
        }
    }

    /// A `processing` record mirroring an applicator progress event.
    pub fn from_event(event: &ProgressEvent) -> Self {
        Self {
            stage: Some(event.stage.as_str().to_string()),
            current_file: Some(event.current_file.clone()),
            converted_count: event.converted_count,
            total_files: event.total_files,
            error: event.error.clone(),
            ..Self::new(JobStatus::Processing)
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(JobStatus::Error)
        }
    }

    pub fn done(converted: Vec<String>) -> Self {
        Self {
            converted_count: converted.len(),
            total_files: converted.len(),
            converted_files: Some(converted),
            ..Self::new(JobStatus::Done)
        }
    }

    pub fn with_other_files(mut self, other: Vec<String>) -> Self {
        self.other_files = Some(other);
        self
    }
}

/// Reads and writes progress records under one folder.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Replace the job's record. Readers never see a partial file.
    pub fn write(&self, id: &str, record: &ProgressRecord) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(record)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// The job's record, or `None` when the job is unknown.
    pub fn read(&self, id: &str) -> Result<Option<ProgressRecord>> {
        read_record(&self.path(id))
    }

    pub fn remove(&self, id: &str) -> std::io::Result<()> {
        match std::fs::remove_file(self.path(id)) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

fn read_record(path: &Path) -> Result<Option<ProgressRecord>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
