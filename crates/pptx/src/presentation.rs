//! Read-side queries over a presentation package: slide order, masters,
//! layouts, title placeholders and shape text.

use crate::error::{PptxError, Result};
use crate::opc::{rel_types, resolve_target};
use crate::package::Package;
use crate::xml::{attr, local_name, rel_id_attr};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Placeholder types that count as a slide title.
const TITLE_PLACEHOLDER_TYPES: &[&str] = &["title", "ctrTitle"];

/// `r:id` values of the `item` children of `list`, in document order,
/// together with their plain `id` attribute when present.
fn id_list(xml: &str, list: &[u8], item: &[u8]) -> Result<Vec<(Option<String>, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut in_list = false;
    let mut out = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == list => in_list = true,
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == list => in_list = false,
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if in_list && local_name(e.name().as_ref()) == item =>
            {
                if let Some(rid) = rel_id_attr(e) {
                    out.push((attr(e, b"id"), rid));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(PptxError::Xml(e)),
            _ => {}
        }
    }

    Ok(out)
}

/// Map relationship ids of `part` to resolved part names.
fn rel_targets(pkg: &Package, part: &str) -> Result<HashMap<String, String>> {
    Ok(pkg
        .rels(part)?
        .into_iter()
        .filter(|r| !r.external)
        .map(|r| (r.id.clone(), resolve_target(part, &r.target)))
        .collect())
}

fn ordered_parts(pkg: &Package, part: &str, list: &[u8], item: &[u8]) -> Result<Vec<String>> {
    let targets = rel_targets(pkg, part)?;
    let ids = id_list(pkg.xml(part)?, list, item)?;
    ids.into_iter()
        .map(|(_, rid)| {
            targets.get(&rid).cloned().ok_or_else(|| {
                PptxError::InvalidPackage(format!("'{}' refers to unknown relationship {}", part, rid))
            })
        })
        .collect()
}

/// Slide parts in presentation order.
pub fn slide_parts(pkg: &Package, main: &str) -> Result<Vec<String>> {
    ordered_parts(pkg, main, b"sldIdLst", b"sldId")
}

/// Slide master parts in presentation order.
pub fn master_parts(pkg: &Package, main: &str) -> Result<Vec<String>> {
    ordered_parts(pkg, main, b"sldMasterIdLst", b"sldMasterId")
}

/// `(id, r:id)` entries of the presentation's `p:sldMasterIdLst`.
pub fn master_id_entries(pkg: &Package, main: &str) -> Result<Vec<(Option<String>, String)>> {
    id_list(pkg.xml(main)?, b"sldMasterIdLst", b"sldMasterId")
}

/// Layout parts of a slide master, in the master's layout order.
pub fn layout_parts(pkg: &Package, master: &str) -> Result<Vec<String>> {
    ordered_parts(pkg, master, b"sldLayoutIdLst", b"sldLayoutId")
}

/// Identity of a layout as far as remapping is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutKey {
    /// `type` attribute of `p:sldLayout` (e.g. `title`, `obj`, `cust`).
    pub kind: Option<String>,
    /// `name` attribute of `p:cSld`.
    pub name: String,
}

/// Read the type and name of a layout part.
pub fn layout_key(pkg: &Package, layout: &str) -> Result<LayoutKey> {
    let mut reader = Reader::from_str(pkg.xml(layout)?);
    reader.trim_text(true);
    let mut key = LayoutKey::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"sldLayout" => key.kind = attr(e, b"type"),
                b"cSld" => {
                    key.name = attr(e, b"name").unwrap_or_default();
                    break;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(PptxError::Xml(e)),
            _ => {}
        }
    }

    Ok(key)
}

/// The layout part a slide is attached to.
pub fn slide_layout_part(pkg: &Package, slide: &str) -> Result<Option<String>> {
    Ok(pkg
        .related_parts(slide, rel_types::SLIDE_LAYOUT)?
        .into_iter()
        .next())
}

/// Whether slide XML carries a title placeholder.
pub fn has_title_placeholder(xml: &str) -> Result<bool> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"ph" => {
                if let Some(kind) = attr(e, b"type") {
                    if TITLE_PLACEHOLDER_TYPES.contains(&kind.as_str()) {
                        return Ok(true);
                    }
                }
            }
            Ok(Event::Eof) => return Ok(false),
            Err(e) => return Err(PptxError::Xml(e)),
            _ => {}
        }
    }
}

/// Text of every shape with a text body, in document order.
///
/// Paragraphs are joined with `\n`; shapes whose text is blank are left out.
pub fn shape_texts(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut texts = Vec::new();
    let mut in_shape = false;
    let mut in_text_body = false;
    let mut in_run_text = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    in_shape = true;
                    current_text.clear();
                }
                b"txBody" if in_shape => in_text_body = true,
                b"p" if in_text_body => {
                    if !current_text.is_empty() {
                        current_text.push('\n');
                    }
                }
                b"t" if in_text_body => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if in_text_body && local_name(e.name().as_ref()) == b"br" {
                    current_text.push('\n');
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_run_text {
                    let text = e.unescape().unwrap_or_default();
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    let text = current_text.trim();
                    if in_shape && !text.is_empty() {
                        texts.push(text.to_string());
                    }
                    current_text.clear();
                    in_shape = false;
                    in_text_body = false;
                    in_run_text = false;
                }
                b"txBody" => in_text_body = false,
                b"t" => in_run_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(PptxError::Xml(e)),
            _ => {}
        }
    }

    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DeckBuilder, SlideSpec};

    #[test]
    fn test_slide_and_layout_order() {
        let pkg = DeckBuilder::new("Office")
            .layout("Title Slide", "title")
            .layout("Title and Content", "obj")
            .slide(SlideSpec::titled("One").on_layout(1))
            .slide(SlideSpec::untitled(&["two"]).on_layout(2))
            .build();
        let main = pkg.main_part().unwrap();

        let slides = slide_parts(&pkg, &main).unwrap();
        assert_eq!(slides, vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]);

        let masters = master_parts(&pkg, &main).unwrap();
        assert_eq!(masters, vec!["ppt/slideMasters/slideMaster1.xml"]);

        let layouts = layout_parts(&pkg, &masters[0]).unwrap();
        assert_eq!(layouts.len(), 2);
        let key = layout_key(&pkg, &layouts[1]).unwrap();
        assert_eq!(key.kind.as_deref(), Some("obj"));
        assert_eq!(key.name, "Title and Content");

        assert_eq!(
            slide_layout_part(&pkg, &slides[1]).unwrap().as_deref(),
            Some(layouts[1].as_str())
        );
    }

    #[test]
    fn test_has_title_placeholder() {
        let titled = r#"<p:sld xmlns:p="p"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr></p:sp></p:spTree></p:cSld></p:sld>"#;
        let body_only = r#"<p:sld xmlns:p="p"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr></p:sp></p:spTree></p:cSld></p:sld>"#;
        assert!(has_title_placeholder(titled).unwrap());
        assert!(!has_title_placeholder(body_only).unwrap());
        assert!(has_title_placeholder("<p:sld><unclosed").is_err());
    }

    #[test]
    fn test_shape_texts() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
<p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:t>Refer</a:t></a:r><a:r><a:t>ências</a:t></a:r></a:p><a:p><a:r><a:t>Livro &amp; artigo</a:t></a:r><a:br/><a:r><a:t>Site</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:txBody><a:p><a:r><a:t>   </a:t></a:r></a:p></p:txBody></p:sp>
<p:pic><p:blipFill/></p:pic>
</p:spTree></p:cSld></p:sld>"#;
        let texts = shape_texts(xml).unwrap();
        assert_eq!(texts, vec!["Referências\nLivro & artigo\nSite"]);
    }
}
