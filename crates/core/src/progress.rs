//! Progress events emitted while a batch is converted.

use serde::{Deserialize, Serialize};

/// Stage of the file currently being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Opening,
    ApplyingTemplate,
    Saving,
    Error,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opening => "opening",
            Self::ApplyingTemplate => "applying_template",
            Self::Saving => "saving",
            Self::Error => "error",
        }
    }
}

/// One progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub current_file: String,
    /// Files converted so far, not counting the current one.
    pub converted_count: usize,
    pub total_files: usize,
    /// Set on [`Stage::Error`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
