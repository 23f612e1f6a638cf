//! Fill the slides of an existing template with text from a content file.

use crate::edit::{set_placeholder_text, Placeholder};
use crate::error::Result;
use crate::package::Package;
use crate::presentation::slide_parts;
use log::{debug, info};
use std::path::Path;

/// Placeholder index that holds a slide's body text.
const BODY_PLACEHOLDER_IDX: u32 = 1;

/// A titled block of text destined for one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

/// Split content on `#` into sections.
///
/// Every non-empty chunk keeps its position, so a chunk with fewer than
/// two lines yields `None` and still consumes a slide.
pub fn parse_sections(raw: &str) -> Vec<Option<Section>> {
    raw.split('#')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let lines: Vec<&str> = chunk.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
            if lines.len() < 2 {
                return None;
            }
            Some(Section {
                title: lines[0].to_string(),
                body: lines[1..].join("\n"),
            })
        })
        .collect()
}

/// What a fill run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// 1-based positions of slides that received text.
    pub filled: Vec<usize>,
    /// Sections skipped for having fewer than two lines.
    pub skipped: usize,
}

/// Pair slide *i* with section *i* and write title and body text.
pub fn fill_package(pkg: &mut Package, sections: &[Option<Section>]) -> Result<FillReport> {
    let main = pkg.main_part()?;
    let slides = slide_parts(pkg, &main)?;
    let mut report = FillReport::default();

    for (i, (slide, section)) in slides.iter().zip(sections).enumerate() {
        let Some(section) = section else {
            report.skipped += 1;
            continue;
        };

        let mut xml = pkg.xml(slide)?.to_string();
        let mut touched = false;
        for (placeholder, text) in [
            (Placeholder::Title, &section.title),
            (Placeholder::Index(BODY_PLACEHOLDER_IDX), &section.body),
        ] {
            match set_placeholder_text(&xml, placeholder, text)? {
                Some(updated) => {
                    xml = updated;
                    touched = true;
                }
                None => debug!("Slide {} has no {:?} placeholder", i + 1, placeholder),
            }
        }

        if touched {
            pkg.set_part(slide.clone(), xml);
            report.filled.push(i + 1);
        }
    }

    Ok(report)
}

/// Fill `template` with the sections of `content` and save as `output`.
pub fn fill_file(template: &Path, content: &Path, output: &Path) -> Result<FillReport> {
    let raw = std::fs::read_to_string(content)?;
    let sections = parse_sections(&raw);
    let mut pkg = Package::open(template)?;
    let report = fill_package(&mut pkg, &sections)?;
    pkg.save(output)?;
    info!(
        "Filled {} slide(s) of {} into {}",
        report.filled.len(),
        template.display(),
        output.display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::shape_texts;
    use crate::testing::{DeckBuilder, SlideSpec};

    #[test]
    fn test_parse_sections() {
        let raw = "# Abertura\nBem-vindos\n\n  segunda linha \n#Sozinho\n#\n# Fim\nObrigado";
        let sections = parse_sections(raw);
        assert_eq!(sections.len(), 3);
        assert_eq!(
            sections[0],
            Some(Section {
                title: "Abertura".to_string(),
                body: "Bem-vindos\nsegunda linha".to_string(),
            })
        );
        assert_eq!(sections[1], None);
        assert_eq!(sections[2].as_ref().map(|s| s.title.as_str()), Some("Fim"));
    }

    #[test]
    fn test_fill_package_is_positional() {
        let mut pkg = DeckBuilder::new("Office")
            .layout("Title and Content", "obj")
            .slide(SlideSpec::titled("A").with_body("a"))
            .slide(SlideSpec::titled("B").with_body("b"))
            .slide(SlideSpec::titled("C"))
            .build();
        let sections = parse_sections("#Um\num corpo\n#curto\n#Três\nlinha 1\nlinha 2\n#Quatro\nsobra");

        let report = fill_package(&mut pkg, &sections).unwrap();
        assert_eq!(report.filled, vec![1, 3]);
        assert_eq!(report.skipped, 1);

        let main = pkg.main_part().unwrap();
        let slides = slide_parts(&pkg, &main).unwrap();
        assert_eq!(shape_texts(pkg.xml(&slides[0]).unwrap()).unwrap(), vec!["Um", "um corpo"]);
        assert_eq!(shape_texts(pkg.xml(&slides[1]).unwrap()).unwrap(), vec!["B", "b"]);
        // No body placeholder on slide 3: only the title changes.
        assert_eq!(shape_texts(pkg.xml(&slides[2]).unwrap()).unwrap(), vec!["Três"]);
    }

    #[test]
    fn test_fill_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("modelo.pptx");
        let content = dir.path().join("conteudo.txt");
        let output = dir.path().join("saida.pptx");
        DeckBuilder::new("Office")
            .layout("Title and Content", "obj")
            .slide(SlideSpec::titled("Old").with_body("old"))
            .build()
            .save(&template)
            .unwrap();
        std::fs::write(&content, "# Novo\ncorpo novo").unwrap();

        let report = fill_file(&template, &content, &output).unwrap();
        assert_eq!(report.filled, vec![1]);

        let saved = Package::open(&output).unwrap();
        let xml = saved.xml("ppt/slides/slide1.xml").unwrap();
        assert_eq!(shape_texts(xml).unwrap(), vec!["Novo", "corpo novo"]);
    }
}
