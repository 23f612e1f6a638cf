//! Job archives: scanning and extracting the upload, packing the result.

use crate::error::Result;
use log::{debug, warn};
use retemplate_core::is_presentation_file;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entry names of an archive split into presentations and everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveScan {
    pub presentations: Vec<String>,
    pub others: Vec<String>,
}

impl ArchiveScan {
    pub fn has_presentations(&self) -> bool {
        !self.presentations.is_empty()
    }
}

/// List the file entries of `archive`, at any depth.
pub fn scan(archive: &Path) -> Result<ArchiveScan> {
    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    let mut scan = ArchiveScan::default();

    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if is_presentation_file(&name) {
            scan.presentations.push(name);
        } else {
            scan.others.push(name);
        }
    }

    Ok(scan)
}

/// Extract the presentation entries of `archive` flat into `dest`.
///
/// Other entries are ignored, entries whose names would escape `dest` are
/// skipped, and on duplicate base names the first entry wins. Returns the
/// extracted file names.
pub fn extract_presentations(archive: &Path, dest: &Path) -> Result<Vec<String>> {
    std::fs::create_dir_all(dest)?;
    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    let mut seen = HashSet::new();
    let mut extracted = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() || !is_presentation_file(entry.name()) {
            continue;
        }
        let Some(base) = entry
            .enclosed_name()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(str::to_string)
        else {
            warn!("Skipping unsafe archive entry '{}'", entry.name());
            continue;
        };
        if !seen.insert(base.clone()) {
            warn!("Skipping '{}': a file named '{}' was already extracted", entry.name(), base);
            continue;
        }

        let mut out = File::create(dest.join(&base))?;
        std::io::copy(&mut entry, &mut out)?;
        debug!("Extracted {} -> {}", entry.name(), base);
        extracted.push(base);
    }

    Ok(extracted)
}

/// Pack `files` from `dir` at the root of a deflated archive at `output`.
pub fn pack(dir: &Path, files: &[String], output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut zip = ZipWriter::new(File::create(output)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for name in files {
        let data = std::fs::read(dir.join(name))?;
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&data)?;
    }

    zip.finish()?;
    Ok(())
}
