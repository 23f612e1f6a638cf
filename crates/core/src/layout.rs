//! Conservative "no-section" layout fallback.
//!
//! After a template is applied, slides that had no title in the original
//! deck are usually covers, section breaks or closing slides. Only the ones
//! with the strongest signal (trailing position or a closing keyword) are
//! moved to the template's "no-section" layout, and only when the template
//! defines one.

use crate::host::Document;
use crate::text::{contains_keyword, name_matches};
use crate::{LayoutInfo, NoTitleSet, Result};
use serde::{Deserialize, Serialize};

/// Name variants accepted for the fallback layout.
pub const FALLBACK_LAYOUT_NAMES: &[&str] = &[
    "sem_seção",
    "sem secao",
    "sem_sessao",
    "sem-sessao",
    "sem-secao",
    "sem sessao",
];

/// Keyword stems marking closing slides (references, credits, bibliography,
/// sources, acknowledgements).
pub const CLOSING_KEYWORDS: &[&str] = &["refer", "crédit", "credito", "bibliograf", "fontes", "agradec"];

/// Tuning for the layout fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeOptions {
    /// How many trailing slides are eligible regardless of their text.
    pub trailing_window: usize,

    /// Whether slides outside the window may qualify through keywords.
    pub use_keywords: bool,

    /// Keywords matched against slide text.
    pub keywords: Vec<String>,

    /// Accepted names of the fallback layout.
    pub fallback_layout_names: Vec<String>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            trailing_window: 3,
            use_keywords: true,
            keywords: CLOSING_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            fallback_layout_names: FALLBACK_LAYOUT_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the trailing window size.
    pub fn with_trailing_window(mut self, n: usize) -> Self {
        self.trailing_window = n;
        self
    }

    /// Enable or disable keyword matching.
    pub fn with_keywords_enabled(mut self, enabled: bool) -> Self {
        self.use_keywords = enabled;
        self
    }
}

/// Probe every slide of `doc` and collect the title-less positions.
///
/// Probe failures count as title-less.
pub fn collect_no_title<D: Document>(doc: &D) -> Result<NoTitleSet> {
    let count = doc.slide_count()?;
    let mut indices = Vec::new();
    for i in 1..=count {
        match doc.probe_title(i) {
            crate::TitleProbe::Present => {}
            crate::TitleProbe::Absent => indices.push(i),
            crate::TitleProbe::Failed(reason) => {
                log::debug!("Title probe failed on slide {}: {}", i, reason);
                indices.push(i);
            }
        }
    }
    Ok(NoTitleSet::from_indices(indices))
}

/// Find the first layout, in master order, whose name matches any of `names`.
pub fn find_layout_by_names<S: AsRef<str>>(layouts: &[LayoutInfo], names: &[S]) -> Option<LayoutInfo> {
    layouts
        .iter()
        .find(|layout| names.iter().any(|n| name_matches(&layout.name, n.as_ref())))
        .cloned()
}

/// First position of the trailing window for a deck of `count` slides.
fn trailing_start(count: usize, window: usize) -> usize {
    (count + 1).saturating_sub(window).max(1)
}

/// Whether any text-bearing shape on the slide carries a keyword.
fn slide_has_keywords<D: Document>(doc: &D, slide: usize, keywords: &[String]) -> bool {
    match doc.shape_texts(slide) {
        Ok(texts) => texts.iter().any(|t| contains_keyword(t, keywords)),
        Err(e) => {
            log::debug!("Could not read text of slide {}: {}", slide, e);
            false
        }
    }
}

/// Move eligible title-less slides to the fallback layout.
///
/// Returns the positions that were reassigned. An `Err` means the pass was
/// cut short; callers treat it as best-effort and keep the file.
pub fn normalize_layouts<D: Document>(
    doc: &mut D,
    no_title: &NoTitleSet,
    options: &NormalizeOptions,
) -> Result<Vec<usize>> {
    let count = doc.slide_count()?;
    if count == 0 || no_title.is_empty() {
        return Ok(Vec::new());
    }

    let layouts = doc.custom_layouts()?;
    let fallback = match find_layout_by_names(&layouts, &options.fallback_layout_names) {
        Some(layout) => layout,
        None => {
            log::debug!("No fallback layout in template; leaving layouts untouched");
            return Ok(Vec::new());
        }
    };

    let window_start = trailing_start(count, options.trailing_window);
    let mut reassigned = Vec::new();

    for i in no_title.iter() {
        if i < 1 || i > count {
            continue;
        }

        let mut eligible = i >= window_start;
        if !eligible && options.use_keywords {
            eligible = slide_has_keywords(doc, i, &options.keywords);
        }
        if !eligible {
            continue;
        }

        match doc.assign_layout(i, &fallback) {
            Ok(()) => {
                log::debug!("Slide {} -> layout '{}'", i, fallback.name);
                reassigned.push(i);
            }
            Err(e) => log::warn!("Could not reassign slide {}: {}", i, e),
        }
    }

    Ok(reassigned)
}
