//! Batch conversion jobs over a workspace folder.
//!
//! Intake of uploaded archives, background runs of the template applicator,
//! progress records, the operational log, and collection with cleanup.

pub mod archive;
pub mod error;
pub mod jobs;
pub mod journal;
pub mod progress;
pub mod workspace;

pub use error::{BatchError, Result};
pub use jobs::{HostFactory, JobHandle, Jobs};
pub use journal::{Journal, JournalEvent};
pub use progress::{JobStatus, ProgressRecord, ProgressStore};
pub use workspace::{download_name, sanitize_filename, Workspace};
