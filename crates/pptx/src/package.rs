//! In-memory `.pptx` package.

use crate::error::{PptxError, Result};
use crate::opc::{
    parse_rels, rel_types, rels_path_for, resolve_target, write_rels, ContentTypes, Relationship,
    CONTENT_TYPES_PART,
};
use crate::xml::strip_bom;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// All parts of an OPC package, keyed by part name.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Load a package from a file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.insert(name, data);
        }

        if !parts.contains_key(CONTENT_TYPES_PART) {
            return Err(PptxError::InvalidPackage(
                "missing [Content_Types].xml".to_string(),
            ));
        }

        Ok(Self { parts })
    }

    /// Build a package from raw parts.
    pub fn from_parts(parts: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            parts: parts.into_iter().collect(),
        }
    }

    /// Write the package to any seekable writer.
    ///
    /// `[Content_Types].xml` goes first, as some consumers expect.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        if let Some(data) = self.parts.get(CONTENT_TYPES_PART) {
            zip.start_file(CONTENT_TYPES_PART, options)?;
            zip.write_all(data)?;
        }
        for (name, data) in &self.parts {
            if name == CONTENT_TYPES_PART {
                continue;
            }
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Save the package to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(|d| d.as_slice())
    }

    /// A part decoded as UTF-8 XML text.
    pub fn xml(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| PptxError::MissingPart(name.to_string()))?;
        let text = std::str::from_utf8(data)
            .map_err(|e| PptxError::InvalidPackage(format!("'{}' is not UTF-8: {}", name, e)))?;
        Ok(strip_bom(text))
    }

    pub fn set_part(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.parts.insert(name.into(), data.into());
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|k| k.as_str())
    }

    /// Relationships owned by `part`; empty when it has no `.rels` part.
    pub fn rels(&self, part: &str) -> Result<Vec<Relationship>> {
        let path = rels_path_for(part);
        if !self.contains(&path) {
            return Ok(Vec::new());
        }
        parse_rels(self.xml(&path)?)
    }

    /// Replace the relationships owned by `part`.
    pub fn set_rels(&mut self, part: &str, rels: &[Relationship]) {
        self.set_part(rels_path_for(part), write_rels(rels));
    }

    /// Internal relationship targets of `part` whose type ends with `suffix`,
    /// resolved to part names, in relationship order.
    pub fn related_parts(&self, part: &str, suffix: &str) -> Result<Vec<String>> {
        Ok(self
            .rels(part)?
            .into_iter()
            .filter(|r| !r.external && r.is(suffix))
            .map(|r| resolve_target(part, &r.target))
            .collect())
    }

    pub fn content_types(&self) -> Result<ContentTypes> {
        ContentTypes::parse(self.xml(CONTENT_TYPES_PART)?)
    }

    pub fn set_content_types(&mut self, types: &ContentTypes) {
        self.set_part(CONTENT_TYPES_PART, types.to_xml());
    }

    /// Name of the main presentation part (normally `ppt/presentation.xml`).
    pub fn main_part(&self) -> Result<String> {
        self.related_parts("", rel_types::OFFICE_DOCUMENT)?
            .into_iter()
            .next()
            .ok_or_else(|| PptxError::InvalidPackage("no officeDocument relationship".to_string()))
    }
}
