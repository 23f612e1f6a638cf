//! [`Host`] implementation working on `.pptx` packages directly.

use crate::edit::{set_slide_layout, strip_background};
use crate::error::{PptxError, Result};
use crate::package::Package;
use crate::presentation::{
    has_title_placeholder, layout_key, layout_parts, master_parts, shape_texts, slide_layout_part, slide_parts,
};
use crate::template::apply_template;
use log::debug;
use retemplate_core::{Document, Error, Host, LayoutInfo, PresentationFormat, TitleProbe};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Opens `.pptx` files from disk. Legacy `.ppt` files are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxHost;

impl PptxHost {
    pub fn new() -> Self {
        Self
    }
}

fn open_package(path: &Path) -> Result<Package> {
    let mut magic = [0u8; 8];
    let read = std::fs::File::open(path)?.read(&mut magic)?;
    if PresentationFormat::from_magic(&magic[..read]) == Some(PresentationFormat::Ppt) {
        return Err(PptxError::LegacyFormat(path.display().to_string()));
    }
    Package::open(path)
}

impl Host for PptxHost {
    type Document = PptxDocument;

    fn open(&mut self, path: &Path) -> retemplate_core::Result<PptxDocument> {
        PptxDocument::open(path).map_err(|e| Error::host("open", e))
    }
}

/// An open `.pptx` presentation held in memory until saved.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    path: PathBuf,
    package: Package,
    main: String,
    slides: Vec<String>,
}

impl PptxDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let package = open_package(path)?;
        let main = package.main_part()?;
        let slides = slide_parts(&package, &main)?;
        debug!("Opened {} with {} slide(s)", path.display(), slides.len());
        Ok(Self {
            path: path.to_path_buf(),
            package,
            main,
            slides,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    fn slide_part(&self, slide: usize) -> Result<&str> {
        slide
            .checked_sub(1)
            .and_then(|i| self.slides.get(i))
            .map(String::as_str)
            .ok_or(PptxError::SlideOutOfRange(slide))
    }

    /// Layout parts of the first slide master, in layout order.
    fn layout_part_names(&self) -> Result<Vec<String>> {
        let masters = master_parts(&self.package, &self.main)?;
        match masters.first() {
            Some(master) => layout_parts(&self.package, master),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn slide_total(&self) -> usize {
        self.slides.len()
    }

    pub(crate) fn texts(&self, slide: usize) -> Result<Vec<String>> {
        shape_texts(self.package.xml(self.slide_part(slide)?)?)
    }

    /// Name of the layout the slide is attached to.
    pub(crate) fn layout_name(&self, slide: usize) -> Result<Option<String>> {
        match slide_layout_part(&self.package, self.slide_part(slide)?)? {
            Some(part) => Ok(Some(layout_key(&self.package, &part)?.name)),
            None => Ok(None),
        }
    }

    pub(crate) fn layouts(&self) -> Result<Vec<LayoutInfo>> {
        self.layout_part_names()?
            .iter()
            .enumerate()
            .map(|(i, part)| Ok(LayoutInfo::new(i + 1, layout_key(&self.package, part)?.name)))
            .collect()
    }

    fn assign(&mut self, slide: usize, layout: &LayoutInfo) -> Result<()> {
        let slide_part = self.slide_part(slide)?.to_string();
        let layouts = self.layout_part_names()?;
        let layout_part = layout
            .index
            .checked_sub(1)
            .and_then(|i| layouts.get(i))
            .ok_or(PptxError::LayoutNotFound(layout.index))?;

        set_slide_layout(&mut self.package, &slide_part, layout_part)?;
        let xml = strip_background(self.package.xml(&slide_part)?)?;
        self.package.set_part(slide_part, xml);
        Ok(())
    }

    fn apply(&mut self, template: &Path) -> Result<()> {
        let template = open_package(template)?;
        apply_template(&mut self.package, &template)?;
        self.slides = slide_parts(&self.package, &self.main)?;
        Ok(())
    }
}

impl Document for PptxDocument {
    fn slide_count(&self) -> retemplate_core::Result<usize> {
        Ok(self.slides.len())
    }

    fn probe_title(&self, slide: usize) -> TitleProbe {
        let probe = self
            .slide_part(slide)
            .and_then(|part| self.package.xml(part))
            .and_then(has_title_placeholder);
        match probe {
            Ok(true) => TitleProbe::Present,
            Ok(false) => TitleProbe::Absent,
            Err(e) => TitleProbe::Failed(e.to_string()),
        }
    }

    fn shape_texts(&self, slide: usize) -> retemplate_core::Result<Vec<String>> {
        self.texts(slide).map_err(|e| Error::host("shape_texts", e))
    }

    fn apply_template(&mut self, template: &Path) -> retemplate_core::Result<()> {
        self.apply(template).map_err(|e| Error::host("apply_template", e))
    }

    fn custom_layouts(&self) -> retemplate_core::Result<Vec<LayoutInfo>> {
        self.layouts().map_err(|e| Error::host("custom_layouts", e))
    }

    fn assign_layout(&mut self, slide: usize, layout: &LayoutInfo) -> retemplate_core::Result<()> {
        self.assign(slide, layout).map_err(|e| Error::host("assign_layout", e))
    }

    fn save_as(&mut self, path: &Path) -> retemplate_core::Result<()> {
        self.package.save(path).map_err(|e| Error::host("save_as", e))
    }

    fn close(self) -> retemplate_core::Result<()> {
        debug!("Closed {}", self.path.display());
        Ok(())
    }
}
