//! On-disk layout of the job workspace and upload name handling.

use chrono::Local;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// Folder layout under the workspace base:
///
/// ```text
/// uploads/<id>/                 template, archive, presentations/
/// downloads/<id>/               converted files
/// downloads/<id>_converted.zip  output archive
/// progress/<id>.json            progress record
/// logs/conversions.jsonl        operational log
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    pub fn progress_dir(&self) -> PathBuf {
        self.root.join("progress")
    }

    pub fn log_file(&self) -> PathBuf {
        self.root.join("logs").join("conversions.jsonl")
    }

    pub fn job_upload_dir(&self, id: &str) -> PathBuf {
        self.uploads_dir().join(id)
    }

    pub fn presentations_dir(&self, id: &str) -> PathBuf {
        self.job_upload_dir(id).join("presentations")
    }

    pub fn output_dir(&self, id: &str) -> PathBuf {
        self.downloads_dir().join(id)
    }

    pub fn output_archive(&self, id: &str) -> PathBuf {
        self.downloads_dir().join(format!("{}_converted.zip", id))
    }

    /// Create the shared folders.
    pub fn ensure(&self) -> std::io::Result<()> {
        for dir in [self.uploads_dir(), self.downloads_dir(), self.progress_dir()] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(logs) = self.log_file().parent() {
            std::fs::create_dir_all(logs)?;
        }
        Ok(())
    }

    /// Claim a fresh job id, `conversion_YYYYMMDD_HHMMSS`, suffixed `_N`
    /// when that id is taken. The id's upload folder is created here, so two
    /// concurrent claims never get the same id.
    pub fn claim_job_id(&self) -> io::Result<String> {
        std::fs::create_dir_all(self.uploads_dir())?;
        let base = format!("conversion_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let mut n = 1;
        loop {
            let id = if n == 1 { base.clone() } else { format!("{}_{}", base, n) };
            match std::fs::create_dir(self.job_upload_dir(&id)) {
                Ok(()) => return Ok(id),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

/// File name the download is offered under.
pub fn download_name(id: &str) -> String {
    format!("converted_presentations_{}.zip", id)
}

/// Reduce an uploaded file name to a safe single path component.
///
/// Keeps ASCII letters, digits, `_`, `.` and `-`; spaces become `_`, other
/// characters are dropped, leading dots are trimmed.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let spaced = base.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&spaced, "");
    cleaned.trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Aula 01 - Introdução.pptx"), "Aula_01_-_Introduo.pptx");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\x\\modelo.pptx"), "modelo.pptx");
        assert_eq!(sanitize_filename(".hidden.zip"), "hidden.zip");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_layout() {
        let ws = Workspace::new("/data");
        assert_eq!(ws.output_archive("j1"), PathBuf::from("/data/downloads/j1_converted.zip"));
        assert_eq!(ws.presentations_dir("j1"), PathBuf::from("/data/uploads/j1/presentations"));
        assert_eq!(ws.log_file(), PathBuf::from("/data/logs/conversions.jsonl"));
        assert_eq!(download_name("j1"), "converted_presentations_j1.zip");
    }

    #[test]
    fn test_job_id_collision() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let first = ws.claim_job_id().unwrap();
        assert!(first.starts_with("conversion_"));
        assert!(ws.job_upload_dir(&first).is_dir());
        let second = ws.claim_job_id().unwrap();
        assert_ne!(first, second);
        assert!(second.starts_with("conversion_"));
        assert!(ws.job_upload_dir(&second).is_dir());
    }

    #[test]
    fn test_concurrent_claims_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let mut ids: Vec<String> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8).map(|_| scope.spawn(|| ws.claim_job_id().unwrap())).collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }
}
