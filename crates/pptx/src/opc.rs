//! Open Packaging Conventions plumbing: part names, relationships and
//! content types.
//!
//! Part names are kept without their leading slash (`ppt/slides/slide1.xml`),
//! the way they appear as ZIP entry names.

use crate::error::{PptxError, Result};
use crate::xml::{attr, local_name, strip_bom};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Relationship type suffixes used by presentations.
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str = "/officeDocument";
    pub const SLIDE: &str = "/slide";
    pub const SLIDE_LAYOUT: &str = "/slideLayout";
    pub const SLIDE_MASTER: &str = "/slideMaster";
    pub const THEME: &str = "/theme";

    /// Full transitional type URI for a suffix.
    pub fn transitional(suffix: &str) -> String {
        format!(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships{}",
            suffix
        )
    }
}

/// Path of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// One relationship of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends with `suffix` (e.g. `/slideLayout`).
    ///
    /// Matching on the suffix accepts both transitional and strict URIs.
    pub fn is(&self, suffix: &str) -> bool {
        self.rel_type.ends_with(suffix)
    }
}

/// Path of the relationships part belonging to `part`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

fn parent_dir(part: &str) -> &str {
    part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the part that owns the relationship.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_segments(absolute.split('/'));
    }
    normalize_segments(parent_dir(source_part).split('/').chain(target.split('/')))
}

fn normalize_segments<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in parts {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Relative target from `source_part` to `target_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let from: Vec<&str> = parent_dir(source_part)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let to: Vec<&str> = target_part.split('/').collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count()
        // Keep at least the file name in `to`.
        .min(to.len().saturating_sub(1));

    let mut out: Vec<&str> = Vec::new();
    for _ in common..from.len() {
        out.push("..");
    }
    out.extend(&to[common..]);
    out.join("/")
}

/// Parse a `.rels` part.
pub fn parse_rels(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(strip_bom(xml));
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let id = attr(e, b"Id").unwrap_or_default();
                let rel_type = attr(e, b"Type").unwrap_or_default();
                let target = attr(e, b"Target").unwrap_or_default();
                let external = attr(e, b"TargetMode")
                    .map(|m| m.eq_ignore_ascii_case("External"))
                    .unwrap_or(false);
                rels.push(Relationship {
                    id,
                    rel_type,
                    target,
                    external,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PptxError::InvalidPackage(format!(
                    "Error parsing relationships: {}",
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Serialize relationships into a `.rels` part.
pub fn write_rels(rels: &[Relationship]) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
    );
    for rel in rels {
        out.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"{}/>",
            escape(&rel.id),
            escape(&rel.rel_type),
            escape(&rel.target),
            if rel.external { " TargetMode=\"External\"" } else { "" }
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// Next free `rIdN` identifier.
pub fn next_rel_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

/// The `[Content_Types].xml` part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// (extension, content type), extension lowercase.
    defaults: Vec<(String, String)>,
    /// (part name without leading slash, content type).
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse `[Content_Types].xml`.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(strip_bom(xml));
        reader.trim_text(true);
        let mut types = Self::default();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match local_name(e.name().as_ref()) {
                        b"Default" => {
                            if let (Some(ext), Some(ct)) = (attr(e, b"Extension"), attr(e, b"ContentType")) {
                                types.defaults.push((ext.to_lowercase(), ct));
                            }
                        }
                        b"Override" => {
                            if let (Some(part), Some(ct)) = (attr(e, b"PartName"), attr(e, b"ContentType")) {
                                types.overrides.push((part.trim_start_matches('/').to_string(), ct));
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(PptxError::InvalidPackage(format!(
                        "Error parsing content types: {}",
                        e
                    )))
                }
                _ => {}
            }
        }

        Ok(types)
    }

    fn default_for(&self, part: &str) -> Option<&str> {
        let ext = part.rsplit_once('.').map(|(_, e)| e.to_lowercase())?;
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }

    /// Content type of a part: its override, else its extension default.
    pub fn content_type_of(&self, part: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(part))
            .map(|(_, ct)| ct.as_str())
            .or_else(|| self.default_for(part))
    }

    /// Drop the override of a part, if any.
    pub fn remove_override(&mut self, part: &str) {
        self.overrides.retain(|(p, _)| !p.eq_ignore_ascii_case(part));
    }

    /// Make `part` resolve to `content_type`, adding an override only when
    /// the extension default does not already give that type.
    pub fn register(&mut self, part: &str, content_type: &str) {
        self.remove_override(part);
        if self.default_for(part) == Some(content_type) {
            return;
        }
        let ext = part.rsplit_once('.').map(|(_, e)| e.to_lowercase());
        match ext {
            Some(ext) if self.defaults.iter().all(|(e, _)| *e != ext) && !content_type.ends_with("+xml") => {
                self.defaults.push((ext, content_type.to_string()));
            }
            _ => self.overrides.push((part.to_string(), content_type.to_string())),
        }
    }

    /// Serialize to `[Content_Types].xml`.
    pub fn to_xml(&self) -> String {
        let mut out = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">",
        );
        for (ext, ct) in &self.defaults {
            out.push_str(&format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                escape(ext),
                escape(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            out.push_str(&format!(
                "<Override PartName=\"/{}\" ContentType=\"{}\"/>",
                escape(part),
                escape(ct)
            ));
        }
        out.push_str("</Types>");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_path_for("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
        assert_eq!(rels_path_for(""), "_rels/.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../slideLayouts/slideLayout2.xml"),
            "ppt/slideLayouts/slideLayout2.xml"
        );
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
        assert_eq!(resolve_target("ppt/slides/slide1.xml", "/ppt/media/a.png"), "ppt/media/a.png");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(
            relative_target("ppt/slides/slide1.xml", "ppt/slideLayouts/slideLayout2.xml"),
            "../slideLayouts/slideLayout2.xml"
        );
        assert_eq!(
            relative_target("ppt/presentation.xml", "ppt/slideMasters/slideMaster1.xml"),
            "slideMasters/slideMaster1.xml"
        );
        assert_eq!(relative_target("", "ppt/presentation.xml"), "ppt/presentation.xml");
        assert_eq!(
            relative_target("ppt/slideLayouts/slideLayout1.xml", "ppt/slideLayouts/slideLayout2.xml"),
            "slideLayout2.xml"
        );
    }

    #[test]
    fn test_parse_and_write_rels() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;
        let rels = parse_rels(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert!(rels[0].is(rel_types::SLIDE_LAYOUT));
        assert!(!rels[0].is(rel_types::SLIDE));
        assert!(rels[1].external);
        assert_eq!(rels[1].target, "https://example.com/?a=1&b=2");
        assert_eq!(next_rel_id(&rels), "rId4");

        let reparsed = parse_rels(&write_rels(&rels)).unwrap();
        assert_eq!(reparsed, rels);
    }

    #[test]
    fn test_content_types_register() {
        let xml = r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
</Types>"#;
        let mut ct = ContentTypes::parse(xml).unwrap();
        assert_eq!(
            ct.content_type_of("ppt/slides/slide1.xml"),
            Some("application/vnd.openxmlformats-officedocument.presentationml.slide+xml")
        );
        assert_eq!(ct.content_type_of("ppt/other.xml"), Some("application/xml"));

        ct.register("ppt/media/image9.png", "image/png");
        assert_eq!(ct.content_type_of("ppt/media/image3.png"), Some("image/png"));

        let layout = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
        ct.register("ppt/slideLayouts/slideLayout4.xml", layout);
        assert_eq!(ct.content_type_of("ppt/slideLayouts/slideLayout4.xml"), Some(layout));

        ct.remove_override("ppt/slides/slide1.xml");
        assert_eq!(ct.content_type_of("ppt/slides/slide1.xml"), Some("application/xml"));

        let reparsed = ContentTypes::parse(&ct.to_xml()).unwrap();
        assert_eq!(reparsed, ct);
    }
}
