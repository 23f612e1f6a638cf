//! In-memory automation host.
//!
//! Holds decks and templates as plain data so the applicator and the job
//! runner can be exercised without a real presentation editor. Failures can
//! be injected per path or per slide.

use crate::host::{Document, Host, TitleProbe};
use crate::{Error, LayoutInfo, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// A slide of an in-memory deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySlide {
    /// Title placeholder text; `None` when the slide has no title placeholder.
    pub title: Option<String>,
    /// Text of the other text-bearing shapes.
    pub texts: Vec<String>,
    /// Name of the assigned layout.
    pub layout: Option<String>,
    /// Whether the slide follows the master background.
    pub follow_master_background: bool,
    /// Make the title probe fail for this slide.
    pub probe_fails: bool,
}

impl MemorySlide {
    /// A slide with a title placeholder.
    pub fn titled(title: &str, texts: &[&str]) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::untitled(texts)
        }
    }

    /// A slide without a title placeholder.
    pub fn untitled(texts: &[&str]) -> Self {
        Self {
            title: None,
            texts: texts.iter().map(|t| t.to_string()).collect(),
            layout: None,
            follow_master_background: false,
            probe_fails: false,
        }
    }

    /// A slide whose title probe fails.
    pub fn unprobeable() -> Self {
        Self {
            probe_fails: true,
            ..Self::untitled(&[])
        }
    }
}

/// An in-memory presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDeck {
    pub slides: Vec<MemorySlide>,
    /// Custom layout names of the deck's master.
    pub layouts: Vec<String>,
}

impl MemoryDeck {
    /// A deck using a stock two-layout master; every slide starts on the
    /// content layout.
    pub fn new(slides: Vec<MemorySlide>) -> Self {
        let layouts = vec!["Title Slide".to_string(), "Title and Content".to_string()];
        let slides = slides
            .into_iter()
            .map(|mut s| {
                if s.layout.is_none() {
                    s.layout = Some(layouts[1].clone());
                }
                s
            })
            .collect();
        Self { slides, layouts }
    }
}

#[derive(Debug, Default)]
struct State {
    decks: HashMap<PathBuf, MemoryDeck>,
    templates: HashMap<PathBuf, Vec<String>>,
    saved: HashMap<PathBuf, MemoryDeck>,
    fail_open: HashSet<PathBuf>,
    fail_apply: HashSet<PathBuf>,
    fail_layouts: HashSet<PathBuf>,
    retitle: HashMap<PathBuf, Vec<(usize, Option<String>)>>,
    opened: usize,
    closed: usize,
}

/// Entry for `path`, falling back to one registered under its bare file name.
fn lookup<'a, V>(map: &'a HashMap<PathBuf, V>, path: &Path) -> Option<&'a V> {
    map.get(path)
        .or_else(|| path.file_name().and_then(|name| map.get(Path::new(name))))
}

fn listed(set: &HashSet<PathBuf>, path: &Path) -> bool {
    set.contains(path) || path.file_name().is_some_and(|name| set.contains(Path::new(name)))
}

/// Shared in-memory host. Clones see the same decks.
///
/// Paths given to the registration methods may be bare file names, which
/// then match that name in any folder.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    state: Arc<Mutex<State>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not hide the state from the others.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a deck at `path`.
    pub fn add_deck(&self, path: impl Into<PathBuf>, deck: MemoryDeck) {
        self.lock().decks.insert(path.into(), deck);
    }

    /// Register a template at `path` defining the given layouts.
    pub fn add_template(&self, path: impl Into<PathBuf>, layouts: &[&str]) {
        let layouts = layouts.iter().map(|s| s.to_string()).collect();
        self.lock().templates.insert(path.into(), layouts);
    }

    /// Make opening `path` fail.
    pub fn fail_open(&self, path: impl Into<PathBuf>) {
        self.lock().fail_open.insert(path.into());
    }

    /// Make applying a template to the deck at `path` fail.
    pub fn fail_apply(&self, path: impl Into<PathBuf>) {
        self.lock().fail_apply.insert(path.into());
    }

    /// Make listing the custom layouts of the deck at `path` fail.
    pub fn fail_layouts(&self, path: impl Into<PathBuf>) {
        self.lock().fail_layouts.insert(path.into());
    }

    /// When a template is applied to the deck at `path`, give `slide` the
    /// title `title`, or remove its title placeholder when `None`.
    pub fn retitle_on_apply(&self, path: impl Into<PathBuf>, slide: usize, title: Option<&str>) {
        self.lock()
            .retitle
            .entry(path.into())
            .or_default()
            .push((slide, title.map(str::to_string)));
    }

    /// The deck last saved at `path`.
    pub fn saved(&self, path: impl AsRef<Path>) -> Option<MemoryDeck> {
        self.lock().saved.get(path.as_ref()).cloned()
    }

    /// Number of successful opens and of closes so far.
    pub fn open_close_counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.opened, state.closed)
    }
}

impl Host for MemoryHost {
    type Document = MemoryDocument;

    fn open(&mut self, path: &Path) -> Result<MemoryDocument> {
        let mut state = self.lock();
        if listed(&state.fail_open, path) {
            return Err(Error::host("open", format!("cannot open {}", path.display())));
        }
        let deck = lookup(&state.decks, path)
            .cloned()
            .ok_or_else(|| Error::host("open", format!("no such presentation: {}", path.display())))?;
        state.opened += 1;
        Ok(MemoryDocument {
            source: path.to_path_buf(),
            deck,
            fail_assign: HashSet::new(),
            host: self.clone(),
        })
    }
}

/// A deck opened from a [`MemoryHost`].
#[derive(Debug)]
pub struct MemoryDocument {
    source: PathBuf,
    deck: MemoryDeck,
    fail_assign: HashSet<usize>,
    host: MemoryHost,
}

impl MemoryDocument {
    fn slide(&self, slide: usize) -> Result<&MemorySlide> {
        slide
            .checked_sub(1)
            .and_then(|i| self.deck.slides.get(i))
            .ok_or_else(|| Error::host("slide", format!("slide {} out of range", slide)))
    }

    /// Layout name currently assigned to a slide.
    pub fn layout_of(&self, slide: usize) -> Option<String> {
        self.slide(slide).ok().and_then(|s| s.layout.clone())
    }

    /// Whether a slide follows the master background.
    pub fn follows_master_background(&self, slide: usize) -> bool {
        self.slide(slide).map(|s| s.follow_master_background).unwrap_or(false)
    }

    /// Make assigning a layout to `slide` fail.
    pub fn fail_assign_on(&mut self, slide: usize) {
        self.fail_assign.insert(slide);
    }
}

impl Document for MemoryDocument {
    fn slide_count(&self) -> Result<usize> {
        Ok(self.deck.slides.len())
    }

    fn probe_title(&self, slide: usize) -> TitleProbe {
        match self.slide(slide) {
            Ok(s) if s.probe_fails => TitleProbe::Failed("title lookup raised".to_string()),
            Ok(s) if s.title.is_some() => TitleProbe::Present,
            Ok(_) => TitleProbe::Absent,
            Err(e) => TitleProbe::Failed(e.to_string()),
        }
    }

    fn shape_texts(&self, slide: usize) -> Result<Vec<String>> {
        let s = self.slide(slide)?;
        Ok(s.title
            .iter()
            .chain(s.texts.iter())
            .filter(|t| !t.is_empty())
            .cloned()
            .collect())
    }

    fn apply_template(&mut self, template: &Path) -> Result<()> {
        let state = self.host.lock();
        if listed(&state.fail_apply, &self.source) {
            return Err(Error::host("apply_template", "template rejected"));
        }
        let layouts = lookup(&state.templates, template)
            .cloned()
            .ok_or_else(|| Error::host("apply_template", format!("no such template: {}", template.display())))?;
        let retitles = lookup(&state.retitle, &self.source).cloned().unwrap_or_default();
        drop(state);

        // Same-name layout if the template has one, otherwise its first layout.
        for slide in &mut self.deck.slides {
            let keep = slide
                .layout
                .as_ref()
                .filter(|name| layouts.contains(name))
                .cloned();
            slide.layout = keep.or_else(|| layouts.first().cloned());
        }
        self.deck.layouts = layouts;

        for (slide, title) in retitles {
            if let Some(s) = slide.checked_sub(1).and_then(|i| self.deck.slides.get_mut(i)) {
                s.title = title;
            }
        }
        Ok(())
    }

    fn custom_layouts(&self) -> Result<Vec<LayoutInfo>> {
        if listed(&self.host.lock().fail_layouts, &self.source) {
            return Err(Error::host("custom_layouts", "layout list unavailable"));
        }
        Ok(self
            .deck
            .layouts
            .iter()
            .enumerate()
            .map(|(i, name)| LayoutInfo::new(i + 1, name.clone()))
            .collect())
    }

    fn assign_layout(&mut self, slide: usize, layout: &LayoutInfo) -> Result<()> {
        if self.fail_assign.contains(&slide) {
            return Err(Error::host("assign_layout", format!("slide {} is locked", slide)));
        }
        let name = self
            .deck
            .layouts
            .get(layout.index.wrapping_sub(1))
            .cloned()
            .ok_or_else(|| Error::host("assign_layout", format!("no layout {}", layout.index)))?;
        let s = slide
            .checked_sub(1)
            .and_then(|i| self.deck.slides.get_mut(i))
            .ok_or_else(|| Error::host("assign_layout", format!("slide {} out of range", slide)))?;
        s.layout = Some(name);
        s.follow_master_background = true;
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<()> {
        let summary = format!("memory deck: {} slides\n", self.deck.slides.len());
        std::fs::write(path, summary).map_err(|e| Error::host("save_as", e))?;
        self.host.lock().saved.insert(path.to_path_buf(), self.deck.clone());
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.host.lock().closed += 1;
        Ok(())
    }
}
