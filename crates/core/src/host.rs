//! Capability interface over the presentation automation host.
//!
//! The applicator only ever talks to a host through these two traits, so the
//! layout heuristics run the same against a desktop editor binding, the OOXML
//! host or the in-memory fake.

use crate::{LayoutInfo, Result};
use std::path::Path;

/// Outcome of probing a slide for a title placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleProbe {
    /// The slide has a title placeholder.
    Present,
    /// The slide has no title placeholder.
    Absent,
    /// The probe itself failed. Treated as "no title".
    Failed(String),
}

impl TitleProbe {
    /// Whether the slide counts as title-less.
    pub fn lacks_title(&self) -> bool {
        !matches!(self, Self::Present)
    }
}

/// An automation host able to open presentations.
pub trait Host {
    /// Handle to one open presentation.
    type Document: Document;

    /// Open the presentation at `path` for editing.
    fn open(&mut self, path: &Path) -> Result<Self::Document>;
}

/// One open presentation.
///
/// Slide positions are 1-based.
pub trait Document {
    /// Number of slides currently in the presentation.
    fn slide_count(&self) -> Result<usize>;

    /// Probe whether the slide at `slide` has a title placeholder.
    fn probe_title(&self, slide: usize) -> TitleProbe;

    /// Text of every text-bearing shape on the slide, in shape order.
    fn shape_texts(&self, slide: usize) -> Result<Vec<String>>;

    /// Apply the template at `template`, replacing masters, theme and layout
    /// assignments wholesale.
    fn apply_template(&mut self, template: &Path) -> Result<()>;

    /// Custom layouts of the presentation's (first) slide master.
    fn custom_layouts(&self) -> Result<Vec<LayoutInfo>>;

    /// Give the slide the layout and make it follow the master background.
    fn assign_layout(&mut self, slide: usize, layout: &LayoutInfo) -> Result<()>;

    /// Save the presentation to `path`.
    fn save_as(&mut self, path: &Path) -> Result<()>;

    /// Release the presentation.
    fn close(self) -> Result<()>;
}
