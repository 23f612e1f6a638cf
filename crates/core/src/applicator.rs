//! Batch application of one template across a folder of presentations.

use crate::host::{Document, Host};
use crate::layout::{collect_no_title, normalize_layouts, NormalizeOptions};
use crate::progress::{ProgressEvent, Stage};
use crate::types::is_presentation_file;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Applies a template to every presentation of a folder.
#[derive(Debug, Clone, Default)]
pub struct TemplateApplicator {
    options: NormalizeOptions,
}

impl TemplateApplicator {
    /// Create an applicator with the default layout fallback settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom layout fallback settings.
    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Convert every presentation of `source_dir` into `output_dir`.
    pub fn convert<H: Host>(
        &self,
        host: &mut H,
        template: &Path,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<Vec<String>> {
        self.convert_with_progress(host, template, source_dir, output_dir, |_| {})
    }

    /// Convert every presentation of `source_dir` into `output_dir`,
    /// reporting each stage to `progress`.
    ///
    /// Returns the names of the files that were converted, in processing
    /// order. A file that fails is reported through `progress` and the log,
    /// then skipped; only precondition failures end the batch with `Err`.
    pub fn convert_with_progress<H, F>(
        &self,
        host: &mut H,
        template: &Path,
        source_dir: &Path,
        output_dir: &Path,
        mut progress: F,
    ) -> Result<Vec<String>>
    where
        H: Host,
        F: FnMut(&ProgressEvent),
    {
        let template = absolute(template);
        let source_dir = absolute(source_dir);
        let output_dir = absolute(output_dir);

        if !template.exists() {
            return Err(Error::TemplateNotFound(template));
        }

        let files = list_presentations(&source_dir)?;
        if files.is_empty() {
            return Err(Error::NoPresentationsFound(source_dir));
        }
        std::fs::create_dir_all(&output_dir)?;

        let total_files = files.len();
        let mut converted: Vec<String> = Vec::with_capacity(total_files);

        for name in &files {
            let converted_count = converted.len();
            let mut emit = |stage: Stage, error: Option<String>| {
                progress(&ProgressEvent {
                    stage,
                    current_file: name.clone(),
                    converted_count,
                    total_files,
                    error,
                });
            };

            let source = source_dir.join(name);
            let target = output_dir.join(name);
            match self.convert_file(host, &template, &source, &target, &mut emit) {
                Ok(()) => {
                    log::info!("Converted {}", name);
                    converted.push(name.clone());
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", name, e);
                    emit(Stage::Error, Some(e.to_string()));
                }
            }
        }

        Ok(converted)
    }

    /// Open, retemplate, normalize and save one file. The document is always
    /// closed before returning.
    fn convert_file<H, E>(
        &self,
        host: &mut H,
        template: &Path,
        source: &Path,
        target: &Path,
        emit: &mut E,
    ) -> Result<()>
    where
        H: Host,
        E: FnMut(Stage, Option<String>),
    {
        emit(Stage::Opening, None);
        let mut doc = host.open(source)?;

        let result = self.process(&mut doc, template, target, emit);

        if let Err(e) = doc.close() {
            log::debug!("Ignoring close failure for {}: {}", source.display(), e);
        }
        result
    }

    fn process<D, E>(&self, doc: &mut D, template: &Path, target: &Path, emit: &mut E) -> Result<()>
    where
        D: Document,
        E: FnMut(Stage, Option<String>),
    {
        // Captured from the original deck; applying the template must not change it.
        let no_title = collect_no_title(doc)?;
        log::debug!("{} title-less slide(s) before template", no_title.len());

        emit(Stage::ApplyingTemplate, None);
        doc.apply_template(template)?;

        match normalize_layouts(doc, &no_title, &self.options) {
            Ok(moved) if !moved.is_empty() => {
                log::debug!("Moved slides {:?} to the fallback layout", moved)
            }
            Ok(_) => {}
            Err(e) => log::warn!("Layout normalization aborted: {}", e),
        }

        emit(Stage::Saving, None);
        doc.save_as(target)
    }
}

/// List presentation files directly inside `dir`, sorted by name.
pub fn list_presentations(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|source| Error::SourceFolderUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::SourceFolderUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if is_presentation_file(&name) => names.push(name),
            Ok(_) => {}
            Err(raw) => log::warn!("Skipping non UTF-8 file name {:?}", raw),
        }
    }
    names.sort();
    Ok(names)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDeck, MemoryHost, MemorySlide};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        template: PathBuf,
        source: PathBuf,
        output: PathBuf,
        host: MemoryHost,
    }

    fn fixture(files: &[&str]) -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = absolute(dir.path());
        let template = root.join("modelo.pptx");
        let source = root.join("in");
        let output = root.join("out");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(&template, b"template").unwrap();

        let host = MemoryHost::new();
        host.add_template(&template, &["Capa", "Conteúdo", "Sem_Seção"]);
        for name in files {
            let path = source.join(name);
            std::fs::write(&path, b"deck").unwrap();
            host.add_deck(
                path,
                MemoryDeck::new(vec![
                    MemorySlide::untitled(&["capa"]),
                    MemorySlide::titled("Tema", &["texto"]),
                    MemorySlide::untitled(&["Referências"]),
                ]),
            );
        }

        Fixture {
            _dir: dir,
            template,
            source,
            output,
            host,
        }
    }

    #[test]
    fn test_failed_open_is_skipped() {
        let names = ["a.pptx", "b.pptx", "c.pptx", "d.pptx", "e.pptx"];
        let mut fx = fixture(&names);
        fx.host.fail_open(fx.source.join("c.pptx"));

        let mut events = Vec::new();
        let converted = TemplateApplicator::new()
            .convert_with_progress(&mut fx.host, &fx.template, &fx.source, &fx.output, |e| {
                events.push(e.clone())
            })
            .unwrap();

        assert_eq!(converted, vec!["a.pptx", "b.pptx", "d.pptx", "e.pptx"]);
        assert!(!fx.output.join("c.pptx").exists());
        assert!(fx.output.join("e.pptx").exists());

        let error = events.iter().find(|e| e.stage == Stage::Error).unwrap();
        assert_eq!(error.current_file, "c.pptx");
        assert_eq!(error.converted_count, 2);
        assert!(error.error.as_deref().unwrap().contains("cannot open"));
    }

    #[test]
    fn test_stages_in_order() {
        let mut fx = fixture(&["only.pptx"]);
        let mut stages = Vec::new();
        TemplateApplicator::new()
            .convert_with_progress(&mut fx.host, &fx.template, &fx.source, &fx.output, |e| {
                stages.push(e.stage)
            })
            .unwrap();
        assert_eq!(stages, vec![Stage::Opening, Stage::ApplyingTemplate, Stage::Saving]);
    }

    #[test]
    fn test_normalization_applied_before_save() {
        let mut fx = fixture(&["deck.pptx"]);
        let options = NormalizeOptions::default().with_trailing_window(0);
        TemplateApplicator::new()
            .with_options(options)
            .convert(&mut fx.host, &fx.template, &fx.source, &fx.output)
            .unwrap();

        let saved = fx.host.saved(fx.output.join("deck.pptx")).unwrap();
        // Slide 1 has no title but no keyword either; slide 3 matches "refer".
        assert_eq!(saved.slides[0].layout.as_deref(), Some("Capa"));
        assert_eq!(saved.slides[1].layout.as_deref(), Some("Capa"));
        assert_eq!(saved.slides[2].layout.as_deref(), Some("Sem_Seção"));
    }

    #[test]
    fn test_document_closed_after_failure() {
        let mut fx = fixture(&["a.pptx", "b.pptx"]);
        fx.host.fail_apply(fx.source.join("a.pptx"));

        let converted = TemplateApplicator::new()
            .convert(&mut fx.host, &fx.template, &fx.source, &fx.output)
            .unwrap();

        assert_eq!(converted, vec!["b.pptx"]);
        assert_eq!(fx.host.open_close_counts(), (2, 2));
    }

    #[test]
    fn test_title_set_taken_before_template() {
        let mut fx = fixture(&["deck.pptx"]);
        let deck = fx.source.join("deck.pptx");
        // The template gives slide 1 a title and takes slide 2's away.
        fx.host.retitle_on_apply(&deck, 1, Some("Novo título"));
        fx.host.retitle_on_apply(&deck, 2, None);

        TemplateApplicator::new()
            .convert(&mut fx.host, &fx.template, &fx.source, &fx.output)
            .unwrap();

        let saved = fx.host.saved(fx.output.join("deck.pptx")).unwrap();
        assert_eq!(saved.slides[0].title.as_deref(), Some("Novo título"));
        assert_eq!(saved.slides[1].title, None);
        assert_eq!(saved.slides[0].layout.as_deref(), Some("Sem_Seção"));
        assert_eq!(saved.slides[1].layout.as_deref(), Some("Capa"));
        assert!(!saved.slides[1].follow_master_background);
        assert_eq!(saved.slides[2].layout.as_deref(), Some("Sem_Seção"));
    }

    #[test]
    fn test_normalization_failure_keeps_file() {
        let mut fx = fixture(&["a.pptx", "b.pptx"]);
        fx.host.fail_layouts(fx.source.join("a.pptx"));

        let mut stages = Vec::new();
        let converted = TemplateApplicator::new()
            .convert_with_progress(&mut fx.host, &fx.template, &fx.source, &fx.output, |e| {
                stages.push(e.stage)
            })
            .unwrap();

        assert_eq!(converted, vec!["a.pptx", "b.pptx"]);
        assert!(!stages.contains(&Stage::Error));
        let saved = fx.host.saved(fx.output.join("a.pptx")).unwrap();
        assert!(saved.slides.iter().all(|s| s.layout.as_deref() == Some("Capa")));
        let other = fx.host.saved(fx.output.join("b.pptx")).unwrap();
        assert_eq!(other.slides[2].layout.as_deref(), Some("Sem_Seção"));
    }

    #[test]
    fn test_missing_template() {
        let mut fx = fixture(&["a.pptx"]);
        let missing = fx.source.join("nope.pptx");
        let err = TemplateApplicator::new()
            .convert(&mut fx.host, &missing, &fx.source, &fx.output)
            .unwrap_err();
        assert!(matches!(err, Error::TemplateNotFound(_)));
    }

    #[test]
    fn test_unreadable_source_folder() {
        let mut fx = fixture(&[]);
        let missing = fx.source.join("missing");
        let err = TemplateApplicator::new()
            .convert(&mut fx.host, &fx.template, &missing, &fx.output)
            .unwrap_err();
        assert!(matches!(err, Error::SourceFolderUnreadable { .. }));
    }

    #[test]
    fn test_no_presentations_found() {
        let mut fx = fixture(&[]);
        std::fs::write(fx.source.join("readme.txt"), b"hi").unwrap();
        std::fs::create_dir(fx.source.join("nested.pptx")).unwrap();
        let err = TemplateApplicator::new()
            .convert(&mut fx.host, &fx.template, &fx.source, &fx.output)
            .unwrap_err();
        assert!(matches!(err, Error::NoPresentationsFound(_)));
    }

    #[test]
    fn test_list_presentations_sorted_and_filtered() {
        let fx = fixture(&["b.PPTX", "a.ppt"]);
        std::fs::write(fx.source.join("z.zip"), b"").unwrap();
        assert_eq!(list_presentations(&fx.source).unwrap(), vec!["a.ppt", "b.PPTX"]);
    }
}
