//! Synthetic packages for tests.

use crate::package::Package;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";

/// One slide of a synthetic deck.
#[derive(Debug, Clone, Default)]
pub struct SlideSpec {
    pub title: Option<String>,
    pub texts: Vec<String>,
    pub body: Option<String>,
    pub layout: usize,
    pub background: bool,
    pub image: bool,
}

impl SlideSpec {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            layout: 1,
            ..Self::default()
        }
    }

    pub fn untitled(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            layout: 1,
            ..Self::default()
        }
    }

    pub fn on_layout(mut self, layout: usize) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_body(mut self, text: &str) -> Self {
        self.body = Some(text.to_string());
        self
    }

    pub fn with_background(mut self) -> Self {
        self.background = true;
        self
    }

    pub fn with_image(mut self) -> Self {
        self.image = true;
        self
    }
}

/// Builds a minimal but well-formed presentation package.
#[derive(Debug, Clone)]
pub struct DeckBuilder {
    theme: String,
    theme_part: String,
    layouts: Vec<(String, String)>,
    slides: Vec<SlideSpec>,
    master_image: bool,
    notes_master: bool,
}

fn text_shape(id: usize, ph: Option<&str>, text: &str) -> String {
    let ph = ph.map(|p| format!("<p:ph {}/>", p)).unwrap_or_default();
    let paragraphs: String = text
        .split('\n')
        .map(|line| format!("<a:p><a:r><a:rPr lang=\"pt-BR\"/><a:t>{}</a:t></a:r></a:p>", line))
        .collect();
    format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"Shape {id}\"/><p:cNvSpPr/><p:nvPr>{ph}</p:nvPr></p:nvSpPr>\
         <p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"
    )
}

impl DeckBuilder {
    pub fn new(theme: &str) -> Self {
        Self {
            theme: theme.to_string(),
            theme_part: "ppt/theme/theme1.xml".to_string(),
            layouts: Vec::new(),
            slides: Vec::new(),
            master_image: false,
            notes_master: false,
        }
    }

    pub fn layout(mut self, name: &str, kind: &str) -> Self {
        self.layouts.push((name.to_string(), kind.to_string()));
        self
    }

    pub fn slide(mut self, slide: SlideSpec) -> Self {
        self.slides.push(slide);
        self
    }

    pub fn with_theme_part(mut self, part: &str) -> Self {
        self.theme_part = part.to_string();
        self
    }

    pub fn with_master_image(mut self) -> Self {
        self.master_image = true;
        self
    }

    pub fn with_notes_master(mut self) -> Self {
        self.notes_master = true;
        self
    }

    pub fn build(&self) -> Package {
        let mut parts: Vec<(String, String)> = Vec::new();
        let mut overrides: Vec<(String, String)> = vec![(
            "ppt/presentation.xml".to_string(),
            format!("{}.presentation.main+xml", CT_PML),
        )];
        let theme_file = self.theme_part.rsplit('/').next().unwrap_or("theme1.xml");

        parts.push((
            "_rels/.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL}/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#
            ),
        ));

        // Presentation part and its relationships.
        let n = self.slides.len();
        let mut pres_rels = format!(
            r#"<Relationship Id="rId1" Type="{REL}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
        );
        let mut sld_ids = String::new();
        for i in 1..=n {
            pres_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL}/slide" Target="slides/slide{}.xml"/>"#,
                i + 1,
                i
            ));
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 1));
        }
        pres_rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{REL}/theme" Target="theme/{}"/>"#,
            n + 2,
            theme_file
        ));
        let mut notes_list = String::new();
        if self.notes_master {
            pres_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL}/notesMaster" Target="notesMasters/notesMaster1.xml"/>"#,
                n + 3
            ));
            notes_list = format!(r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId{}"/></p:notesMasterIdLst>"#, n + 3);
        }
        let sld_id_lst = if n > 0 {
            format!("<p:sldIdLst>{}</p:sldIdLst>", sld_ids)
        } else {
            String::new()
        };
        parts.push((
            "ppt/presentation.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {NS}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{notes_list}{sld_id_lst}<p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
            ),
        ));
        parts.push((
            "ppt/_rels/presentation.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{pres_rels}</Relationships>"#
            ),
        ));

        // Master with its layouts and theme.
        let mut master_rels = String::new();
        let mut layout_ids = String::new();
        for (i, (name, kind)) in self.layouts.iter().enumerate() {
            let k = i + 1;
            master_rels.push_str(&format!(
                r#"<Relationship Id="rId{k}" Type="{REL}/slideLayout" Target="../slideLayouts/slideLayout{k}.xml"/>"#
            ));
            layout_ids.push_str(&format!(r#"<p:sldLayoutId id="{}" r:id="rId{k}"/>"#, 2147483648u64 + k as u64));
            parts.push((
                format!("ppt/slideLayouts/slideLayout{k}.xml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><p:sldLayout {NS} type="{kind}" preserve="1"><p:cSld name="{name}"><p:spTree/></p:cSld></p:sldLayout>"#
                ),
            ));
            parts.push((
                format!("ppt/slideLayouts/_rels/slideLayout{k}.xml.rels"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL}/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#
                ),
            ));
            overrides.push((
                format!("ppt/slideLayouts/slideLayout{k}.xml"),
                format!("{}.slideLayout+xml", CT_PML),
            ));
        }
        let l = self.layouts.len();
        master_rels.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{REL}/theme" Target="../theme/{}"/>"#,
            l + 1,
            theme_file
        ));
        let mut master_bg = String::new();
        if self.master_image {
            master_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{REL}/image" Target="../media/image1.png"/>"#,
                l + 2
            ));
            master_bg = format!(
                r#"<p:bg><p:bgPr><a:blipFill><a:blip r:embed="rId{}"/></a:blipFill></p:bgPr></p:bg>"#,
                l + 2
            );
            parts.push(("ppt/media/image1.png".to_string(), "MASTER-PNG".to_string()));
        }
        parts.push((
            "ppt/slideMasters/slideMaster1.xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><p:sldMaster {NS}><p:cSld>{master_bg}<p:spTree/></p:cSld><p:sldLayoutIdLst>{layout_ids}</p:sldLayoutIdLst></p:sldMaster>"#
            ),
        ));
        parts.push((
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{master_rels}</Relationships>"#
            ),
        ));
        overrides.push((
            "ppt/slideMasters/slideMaster1.xml".to_string(),
            format!("{}.slideMaster+xml", CT_PML),
        ));
        parts.push((
            self.theme_part.clone(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="{}"/>"#,
                self.theme
            ),
        ));
        overrides.push((
            self.theme_part.clone(),
            "application/vnd.openxmlformats-officedocument.theme+xml".to_string(),
        ));

        if self.notes_master {
            parts.push((
                "ppt/notesMasters/notesMaster1.xml".to_string(),
                format!(r#"<?xml version="1.0" encoding="UTF-8"?><p:notesMaster {NS}><p:cSld><p:spTree/></p:cSld></p:notesMaster>"#),
            ));
            parts.push((
                "ppt/notesMasters/_rels/notesMaster1.xml.rels".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL}/theme" Target="../theme/theme2.xml"/></Relationships>"#
                ),
            ));
            parts.push((
                "ppt/theme/theme2.xml".to_string(),
                r#"<?xml version="1.0" encoding="UTF-8"?><a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Notes"/>"#.to_string(),
            ));
            overrides.push((
                "ppt/notesMasters/notesMaster1.xml".to_string(),
                format!("{}.notesMaster+xml", CT_PML),
            ));
            overrides.push((
                "ppt/theme/theme2.xml".to_string(),
                "application/vnd.openxmlformats-officedocument.theme+xml".to_string(),
            ));
        }

        // Slides.
        for (i, spec) in self.slides.iter().enumerate() {
            let k = i + 1;
            let mut shapes = String::new();
            let mut id = 2;
            if let Some(title) = &spec.title {
                shapes.push_str(&text_shape(id, Some(r#"type="title""#), title));
                id += 1;
            }
            if let Some(body) = &spec.body {
                shapes.push_str(&text_shape(id, Some(r#"idx="1""#), body));
                id += 1;
            }
            for text in &spec.texts {
                shapes.push_str(&text_shape(id, None, text));
                id += 1;
            }
            let mut rels = format!(
                r#"<Relationship Id="rId1" Type="{REL}/slideLayout" Target="../slideLayouts/slideLayout{}.xml"/>"#,
                spec.layout
            );
            if spec.image {
                rels.push_str(&format!(
                    r#"<Relationship Id="rId2" Type="{REL}/image" Target="../media/image1.png"/>"#
                ));
                shapes.push_str(r#"<p:pic><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>"#);
                parts.push(("ppt/media/image1.png".to_string(), "SLIDE-PNG".to_string()));
            }
            let bg = if spec.background {
                r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill></p:bgPr></p:bg>"#
            } else {
                ""
            };
            parts.push((
                format!("ppt/slides/slide{k}.xml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {NS}><p:cSld>{bg}<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
                ),
            ));
            parts.push((
                format!("ppt/slides/_rels/slide{k}.xml.rels"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
                ),
            ));
            overrides.push((format!("ppt/slides/slide{k}.xml"), format!("{}.slide+xml", CT_PML)));
        }

        let overrides: String = overrides
            .iter()
            .map(|(p, ct)| format!(r#"<Override PartName="/{}" ContentType="{}"/>"#, p, ct))
            .collect();
        parts.push((
            "[Content_Types].xml".to_string(),
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/>{overrides}</Types>"#
            ),
        ));

        Package::from_parts(parts.into_iter().map(|(k, v)| (k, v.into_bytes())))
    }
}
