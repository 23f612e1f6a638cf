//! Read-only summary of a deck: custom layouts and per-slide contents.

use crate::error::Result;
use crate::host::PptxDocument;
use retemplate_core::{Document, LayoutInfo};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideSummary {
    pub number: usize,
    pub has_title: bool,
    pub layout: Option<String>,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    pub layouts: Vec<LayoutInfo>,
    pub slides: Vec<SlideSummary>,
}

/// Inspect the `.pptx` file at `path`.
pub fn inspect(path: &Path) -> Result<Inspection> {
    let doc = PptxDocument::open(path)?;
    let layouts = doc.layouts()?;
    let mut slides = Vec::new();

    for number in 1..=doc.slide_total() {
        slides.push(SlideSummary {
            number,
            has_title: !doc.probe_title(number).lacks_title(),
            layout: doc.layout_name(number)?,
            texts: doc.texts(number)?,
        });
    }

    Ok(Inspection { layouts, slides })
}
