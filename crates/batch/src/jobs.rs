//! Background conversion jobs.
//!
//! A job takes an uploaded template and a zip of presentations, runs the
//! applicator over them on its own thread, and leaves a converted archive
//! for collection. Progress is published through the [`ProgressStore`] and
//! milestones through the [`Journal`].

use crate::archive::{extract_presentations, pack, scan};
use crate::error::{BatchError, Result};
use crate::journal::{Journal, JournalEvent};
use crate::progress::{JobStatus, ProgressRecord, ProgressStore};
use crate::workspace::{download_name, sanitize_filename, Workspace};
use log::{info, warn};
use retemplate_core::{is_presentation_file, Host, NormalizeOptions, TemplateApplicator};
use serde_json::json;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Creates a fresh automation host for each job.
pub trait HostFactory: Send + Sync + 'static {
    type Host: Host;

    fn create(&self) -> retemplate_core::Result<Self::Host>;
}

impl<F, H> HostFactory for F
where
    F: Fn() -> retemplate_core::Result<H> + Send + Sync + 'static,
    H: Host,
{
    type Host = H;

    fn create(&self) -> retemplate_core::Result<H> {
        (self)()
    }
}

/// A submitted job.
#[derive(Debug)]
pub struct JobHandle {
    pub id: String,
    thread: JoinHandle<()>,
}

impl JobHandle {
    /// Block until the job thread has finished.
    pub fn wait(self) {
        if self.thread.join().is_err() {
            warn!("Job thread for {} panicked", self.id);
        }
    }
}

struct Shared<F> {
    workspace: Workspace,
    store: ProgressStore,
    journal: Journal,
    options: NormalizeOptions,
    factory: F,
}

/// Submits, tracks and collects conversion jobs in one workspace.
pub struct Jobs<F> {
    shared: Arc<Shared<F>>,
}

impl<F> Clone for Jobs<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

fn is_template_name(name: &str) -> bool {
    is_presentation_file(name)
}

fn is_zip_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".zip")
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn panic_message(cause: &(dyn Any + Send)) -> String {
    cause
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| cause.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn safe_name(original: &str, fallback: &str) -> String {
    let name = sanitize_filename(original);
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

impl<F: HostFactory> Jobs<F> {
    pub fn new(workspace: Workspace, options: NormalizeOptions, factory: F) -> Self {
        let store = ProgressStore::new(workspace.progress_dir());
        let journal = Journal::new(workspace.log_file());
        Self {
            shared: Arc::new(Shared {
                workspace,
                store,
                journal,
                options,
                factory,
            }),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.shared.workspace
    }

    /// Validate and copy the uploads, record the job as queued and start it.
    pub fn submit(&self, template: &Path, archive: &Path) -> Result<JobHandle> {
        let template_name = upload_name(template);
        let archive_name = upload_name(archive);
        if !is_template_name(&template_name) {
            return Err(BatchError::InvalidTemplate(template_name));
        }
        if !is_zip_name(&archive_name) {
            return Err(BatchError::InvalidArchive(archive_name));
        }

        let shared = &self.shared;
        shared.workspace.ensure()?;
        let id = shared.workspace.claim_job_id()?;
        let upload_dir = shared.workspace.job_upload_dir(&id);

        shared.journal.record(
            JournalEvent::ConversionStart,
            &id,
            json!({ "template": template_name, "zip": archive_name }),
        );

        let template_path = upload_dir.join(safe_name(&template_name, "template.pptx"));
        let archive_path = upload_dir.join(safe_name(&archive_name, "presentations.zip"));
        std::fs::copy(template, &template_path)?;
        std::fs::copy(archive, &archive_path)?;
        std::fs::create_dir_all(shared.workspace.presentations_dir(&id))?;
        std::fs::create_dir_all(shared.workspace.output_dir(&id))?;

        shared.store.write(&id, &ProgressRecord::new(JobStatus::Queued))?;
        info!("Queued job {}", id);

        let worker = Arc::clone(shared);
        let job_id = id.clone();
        let thread = std::thread::Builder::new()
            .name(format!("job-{}", id))
            .spawn(move || worker.run(&job_id, &template_path, &archive_path))?;

        Ok(JobHandle { id, thread })
    }

    /// The job's current record, or `None` for an unknown job.
    pub fn progress(&self, id: &str) -> Result<Option<ProgressRecord>> {
        self.shared.store.read(id)
    }

    /// Copy the converted archive into `dest` and clean the job up.
    pub fn collect(&self, id: &str, dest: &Path) -> Result<PathBuf> {
        let archive = self.shared.workspace.output_archive(id);
        if !archive.is_file() {
            return Err(BatchError::ResultNotFound(id.to_string()));
        }
        std::fs::create_dir_all(dest)?;
        let target = dest.join(download_name(id));
        std::fs::copy(&archive, &target)?;
        self.shared.journal.record(JournalEvent::Download, id, json!({}));
        self.cleanup(id);
        Ok(target)
    }

    /// Remove everything the job left in the workspace.
    pub fn cleanup(&self, id: &str) {
        self.shared.cleanup(id)
    }
}

impl<F: HostFactory> Shared<F> {
    fn run(&self, id: &str, template: &Path, archive: &Path) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.execute(id, template, archive)))
            .unwrap_or_else(|cause| Err(BatchError::Panicked(panic_message(cause.as_ref()))));
        match outcome {
            Ok(converted) => {
                info!("Job {} converted {} file(s)", id, converted.len());
                self.journal.record(
                    JournalEvent::ConversionDone,
                    id,
                    json!({ "total": converted.len(), "files": converted }),
                );
                self.publish(id, &ProgressRecord::done(converted));
            }
            Err(e) => {
                warn!("Job {} failed: {}", id, e);
                let message = e.to_string();
                let (record, fields) = match e {
                    BatchError::NoPresentationsInArchive { other_files } => (
                        ProgressRecord::failed(&message).with_other_files(other_files.clone()),
                        json!({ "error": message, "other_files": other_files }),
                    ),
                    _ => (ProgressRecord::failed(&message), json!({ "error": message })),
                };
                self.journal.record(JournalEvent::ConversionError, id, fields);
                self.publish(id, &record);
            }
        }
    }

    fn execute(&self, id: &str, template: &Path, archive: &Path) -> Result<Vec<String>> {
        self.publish(id, &ProgressRecord::new(JobStatus::Processing));

        let contents = scan(archive)?;
        if !contents.has_presentations() {
            return Err(BatchError::NoPresentationsInArchive {
                other_files: contents.others,
            });
        }

        let presentations = self.workspace.presentations_dir(id);
        let output = self.workspace.output_dir(id);
        extract_presentations(archive, &presentations)?;

        let mut host = self.factory.create()?;
        let applicator = TemplateApplicator::new().with_options(self.options.clone());
        let converted = applicator.convert_with_progress(&mut host, template, &presentations, &output, |event| {
            self.publish(id, &ProgressRecord::from_event(event))
        })?;
        if converted.is_empty() {
            return Err(BatchError::NothingConverted);
        }

        pack(&output, &converted, &self.workspace.output_archive(id))?;
        Ok(converted)
    }

    fn publish(&self, id: &str, record: &ProgressRecord) {
        if let Err(e) = self.store.write(id, record) {
            warn!("Failed to write progress for {}: {}", id, e);
        }
    }

    fn cleanup(&self, id: &str) {
        let dirs = [self.workspace.job_upload_dir(id), self.workspace.output_dir(id)];
        let mut failures = Vec::new();

        for dir in &dirs {
            if dir.exists() {
                if let Err(e) = std::fs::remove_dir_all(dir) {
                    failures.push(format!("{}: {}", dir.display(), e));
                }
            }
        }
        let archive = self.workspace.output_archive(id);
        if archive.exists() {
            if let Err(e) = std::fs::remove_file(&archive) {
                failures.push(format!("{}: {}", archive.display(), e));
            }
        }
        if let Err(e) = self.store.remove(id) {
            failures.push(format!("progress record: {}", e));
        }

        if !failures.is_empty() {
            let error = failures.join("; ");
            warn!("Cleanup of {} incomplete: {}", id, error);
            self.journal.record(JournalEvent::CleanupError, id, json!({ "error": error }));
        }
    }
}
