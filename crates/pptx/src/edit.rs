//! Targeted rewrites of presentation XML parts.
//!
//! Each rewrite streams the part through quick-xml and passes every event
//! through untouched except the ones it is about.

use crate::error::{PptxError, Result};
use crate::opc::{rel_types, relative_target, Relationship};
use crate::package::Package;
use crate::xml::{attr, local_name, prefix_of};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| PptxError::InvalidPackage(format!("rewritten XML is not UTF-8: {}", e)))
}

/// Replace all children of the first `list` element with empty `item`
/// elements carrying the given attributes. The list element keeps its
/// namespace prefix, which the new items reuse.
pub fn replace_children(xml: &str, list: &[u8], item: &str, entries: &[Vec<(&str, &str)>]) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut skip_depth = 0usize;
    let mut replaced = false;

    let write_items = |writer: &mut Writer<Vec<u8>>, prefix: &str| -> Result<()> {
        for attrs in entries {
            let mut e = BytesStart::new(format!("{}{}", prefix, item));
            for (k, v) in attrs {
                e.push_attribute((*k, *v));
            }
            writer.write_event(Event::Empty(e))?;
        }
        Ok(())
    };

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) if skip_depth > 0 => {
                drop(e);
                skip_depth += 1;
            }
            Event::End(e) if skip_depth > 0 => {
                skip_depth -= 1;
                if skip_depth == 0 {
                    writer.write_event(Event::End(e))?;
                }
            }
            _ if skip_depth > 0 => {}
            Event::Start(e) if !replaced && local_name(e.name().as_ref()) == list => {
                let prefix = prefix_of(e.name().as_ref());
                writer.write_event(Event::Start(e))?;
                write_items(&mut writer, &prefix)?;
                skip_depth = 1;
                replaced = true;
            }
            Event::Empty(e) if !replaced && local_name(e.name().as_ref()) == list => {
                let prefix = prefix_of(e.name().as_ref());
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                writer.write_event(Event::Start(e))?;
                write_items(&mut writer, &prefix)?;
                writer.write_event(Event::End(BytesEnd::new(name)))?;
                replaced = true;
            }
            event => writer.write_event(event)?,
        }
    }

    if !replaced {
        return Err(PptxError::InvalidPackage(format!(
            "element '{}' not found",
            String::from_utf8_lossy(list)
        )));
    }
    finish(writer)
}

/// Drop the slide's own `p:bg` so it follows the master background.
pub fn strip_background(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(_) if skip_depth > 0 => skip_depth += 1,
            Event::End(_) if skip_depth > 0 => skip_depth -= 1,
            _ if skip_depth > 0 => {}
            Event::Start(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                let parent_is_csld = stack.last().map(|p| p.as_slice() == b"cSld").unwrap_or(false);
                if parent_is_csld && local == b"bg" {
                    skip_depth = 1;
                    continue;
                }
                stack.push(local);
                writer.write_event(Event::Start(e))?;
            }
            Event::Empty(e) => {
                let parent_is_csld = stack.last().map(|p| p.as_slice() == b"cSld").unwrap_or(false);
                if parent_is_csld && local_name(e.name().as_ref()) == b"bg" {
                    continue;
                }
                writer.write_event(Event::Empty(e))?;
            }
            Event::End(e) => {
                stack.pop();
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
    }

    finish(writer)
}

/// Point the slide's layout relationship at `layout`.
pub fn set_slide_layout(pkg: &mut Package, slide: &str, layout: &str) -> Result<()> {
    let mut rels = pkg.rels(slide)?;
    let target = relative_target(slide, layout);
    match rels.iter_mut().find(|r| !r.external && r.is(rel_types::SLIDE_LAYOUT)) {
        Some(rel) => rel.target = target,
        None => {
            let id = crate::opc::next_rel_id(&rels);
            rels.push(Relationship {
                id,
                rel_type: rel_types::transitional(rel_types::SLIDE_LAYOUT),
                target,
                external: false,
            });
        }
    }
    pkg.set_rels(slide, &rels);
    Ok(())
}

/// Which placeholder of a slide to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The `title` or `ctrTitle` placeholder.
    Title,
    /// The placeholder with the given `idx`.
    Index(u32),
}

impl Placeholder {
    fn matches(&self, ph: &BytesStart) -> bool {
        match self {
            Self::Title => matches!(attr(ph, b"type").as_deref(), Some("title") | Some("ctrTitle")),
            Self::Index(i) => attr(ph, b"idx").and_then(|v| v.parse::<u32>().ok()) == Some(*i),
        }
    }
}

/// 1-based ordinal of the first `p:sp` holding the placeholder.
fn find_placeholder_shape(xml: &str, placeholder: Placeholder) -> Result<Option<usize>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut shape = 0usize;
    let mut in_shape = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"sp" => {
                shape += 1;
                in_shape = true;
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"sp" => in_shape = false,
            Event::Start(e) | Event::Empty(e) if in_shape && local_name(e.name().as_ref()) == b"ph" => {
                if placeholder.matches(&e) {
                    return Ok(Some(shape));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn write_paragraphs(writer: &mut Writer<Vec<u8>>, lines: &[&str]) -> Result<()> {
    if lines.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("a:p")))?;
        return Ok(());
    }
    for line in lines {
        writer.write_event(Event::Start(BytesStart::new("a:p")))?;
        writer.write_event(Event::Start(BytesStart::new("a:r")))?;
        writer.write_event(Event::Start(BytesStart::new("a:t")))?;
        writer.write_event(Event::Text(BytesText::new(line)))?;
        writer.write_event(Event::End(BytesEnd::new("a:t")))?;
        writer.write_event(Event::End(BytesEnd::new("a:r")))?;
        writer.write_event(Event::End(BytesEnd::new("a:p")))?;
    }
    Ok(())
}

/// Replace the text of a placeholder; each `\n` starts a new paragraph.
///
/// Returns `None` when the slide has no such placeholder. Body properties
/// and list styles of the text body are kept, paragraphs are replaced.
pub fn set_placeholder_text(xml: &str, placeholder: Placeholder, text: &str) -> Result<Option<String>> {
    let Some(target) = find_placeholder_shape(xml, placeholder)? else {
        return Ok(None);
    };
    let lines: Vec<&str> = text.split('\n').collect();

    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut shape = 0usize;
    let mut in_target = false;
    let mut in_body = false;
    let mut saw_body = false;
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(_) if skip_depth > 0 => skip_depth += 1,
            Event::End(_) if skip_depth > 0 => skip_depth -= 1,
            _ if skip_depth > 0 => {}
            Event::Start(e) if local_name(e.name().as_ref()) == b"sp" => {
                shape += 1;
                in_target = shape == target;
                saw_body = false;
                writer.write_event(Event::Start(e))?;
            }
            Event::Start(e) if in_target && local_name(e.name().as_ref()) == b"txBody" => {
                in_body = true;
                saw_body = true;
                writer.write_event(Event::Start(e))?;
            }
            Event::Start(e) if in_body && local_name(e.name().as_ref()) == b"p" => {
                drop(e);
                skip_depth = 1;
            }
            Event::Empty(e) if in_body && local_name(e.name().as_ref()) == b"p" => drop(e),
            Event::End(e) if in_body && local_name(e.name().as_ref()) == b"txBody" => {
                write_paragraphs(&mut writer, &lines)?;
                in_body = false;
                writer.write_event(Event::End(e))?;
            }
            Event::End(e) if in_target && local_name(e.name().as_ref()) == b"sp" => {
                if !saw_body {
                    writer.write_event(Event::Start(BytesStart::new("p:txBody")))?;
                    writer.write_event(Event::Empty(BytesStart::new("a:bodyPr")))?;
                    writer.write_event(Event::Empty(BytesStart::new("a:lstStyle")))?;
                    write_paragraphs(&mut writer, &lines)?;
                    writer.write_event(Event::End(BytesEnd::new("p:txBody")))?;
                }
                in_target = false;
                writer.write_event(Event::End(e))?;
            }
            event => writer.write_event(event)?,
        }
    }

    finish(writer).map(Some)
}
