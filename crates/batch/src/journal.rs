//! Append-only operational log in JSON Lines.

use chrono::Local;
use log::warn;
use serde_json::{Map, Value};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Events written to the operational log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalEvent {
    ConversionStart,
    ConversionError,
    ConversionDone,
    Download,
    CleanupError,
}

impl JournalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConversionStart => "conversion_start",
            Self::ConversionError => "conversion_error",
            Self::ConversionDone => "conversion_done",
            Self::Download => "download",
            Self::CleanupError => "cleanup_error",
        }
    }
}

/// Writer for `logs/conversions.jsonl`.
///
/// Failing to write a line never fails the caller; it is logged instead.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one line with `ts`, `event`, `conversion_id` and `fields`.
    pub fn record(&self, event: JournalEvent, conversion_id: &str, fields: Value) {
        if let Err(e) = self.append(event, conversion_id, fields) {
            warn!("Failed to write {} entry to {}: {}", event.as_str(), self.path.display(), e);
        }
    }

    fn append(&self, event: JournalEvent, conversion_id: &str, fields: Value) -> std::io::Result<()> {
        let mut entry = Map::new();
        entry.insert("ts".to_string(), Value::String(Local::now().to_rfc3339()));
        entry.insert("event".to_string(), Value::String(event.as_str().to_string()));
        entry.insert("conversion_id".to_string(), Value::String(conversion_id.to_string()));
        if let Value::Object(extra) = fields {
            entry.extend(extra);
        }

        let mut line = serde_json::to_string(&Value::Object(entry))?;
        line.push('\n');

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}
