//! Applying a template package to a presentation package.
//!
//! The deck's slide masters, their layouts and themes are dropped and the
//! template's are copied in, the way "Apply Design Template" works in the
//! desktop editor. Every slide is then re-attached to the closest layout of
//! the new first master.

use crate::edit::{replace_children, set_slide_layout};
use crate::error::{PptxError, Result};
use crate::opc::{next_rel_id, rel_types, rels_path_for, relative_target, resolve_target, Relationship};
use crate::package::Package;
use crate::presentation::{
    layout_key, layout_parts, master_id_entries, master_parts, slide_layout_part, slide_parts, LayoutKey,
};
use retemplate_core::text::name_key;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Part folders that make up a design.
const DESIGN_FOLDERS: &[&str] = &["ppt/slideMasters/", "ppt/slideLayouts/", "ppt/theme/"];

fn is_design_part(part: &str) -> bool {
    DESIGN_FOLDERS.iter().any(|prefix| part.starts_with(prefix))
}

/// Every part reachable from `roots` through internal relationships.
///
/// Order is breadth-first from the roots, which keeps renaming deterministic.
fn closure(pkg: &Package, roots: &[String]) -> Result<Vec<String>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut order = Vec::new();
    let mut queue: VecDeque<String> = roots.iter().cloned().collect();

    while let Some(part) = queue.pop_front() {
        if !pkg.contains(&part) || !seen.insert(part.clone()) {
            continue;
        }
        for rel in pkg.rels(&part)? {
            if !rel.external {
                queue.push_back(resolve_target(&part, &rel.target));
            }
        }
        order.push(part);
    }

    Ok(order)
}

/// Pick a name for `part` that does not clash with `taken`, bumping the
/// trailing number of the file stem (`image1.png` -> `image2.png`).
fn unique_part_name(part: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(part) {
        return part.to_string();
    }
    let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
    let (stem, ext) = match file.rsplit_once('.') {
        Some((s, e)) => (s, format!(".{}", e)),
        None => (file, String::new()),
    };
    let base = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let mut n: u32 = stem[base.len()..].parse().unwrap_or(1);
    loop {
        n += 1;
        let candidate = if dir.is_empty() {
            format!("{}{}{}", base, n, ext)
        } else {
            format!("{}/{}{}{}", dir, base, n, ext)
        };
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

/// Choose the new layout for a slide whose old layout had `old`.
fn pick_layout<'a>(old: Option<&LayoutKey>, layouts: &'a [(String, LayoutKey)]) -> Option<&'a str> {
    if let Some(old) = old {
        if let Some(kind) = old.kind.as_deref().filter(|k| *k != "cust") {
            if let Some((part, _)) = layouts.iter().find(|(_, k)| k.kind.as_deref() == Some(kind)) {
                return Some(part.as_str());
            }
        }
        let wanted = name_key(&old.name);
        if !wanted.is_empty() {
            if let Some((part, _)) = layouts.iter().find(|(_, k)| name_key(&k.name) == wanted) {
                return Some(part.as_str());
            }
        }
    }
    layouts.first().map(|(part, _)| part.as_str())
}

/// Apply the design of `template` to `deck`.
pub fn apply_template(deck: &mut Package, template: &Package) -> Result<()> {
    let deck_main = deck.main_part()?;
    let tpl_main = template.main_part()?;

    let tpl_masters = master_parts(template, &tpl_main)?;
    if tpl_masters.is_empty() {
        return Err(PptxError::InvalidPackage("template has no slide master".to_string()));
    }
    if let Some(missing) = tpl_masters.iter().find(|m| !template.contains(m)) {
        return Err(PptxError::MissingPart(missing.clone()));
    }
    let tpl_design = closure(template, &tpl_masters)?;

    // Remember what every slide was attached to before the old design goes.
    let slides = slide_parts(deck, &deck_main)?;
    let mut old_keys: Vec<Option<LayoutKey>> = Vec::with_capacity(slides.len());
    for slide in &slides {
        let key = slide_layout_part(deck, slide)?.and_then(|layout| layout_key(deck, &layout).ok());
        old_keys.push(key);
    }

    let old_masters = master_parts(deck, &deck_main)?;
    let old_design: BTreeSet<String> = closure(deck, &old_masters)?
        .into_iter()
        .filter(|p| is_design_part(p))
        .collect();

    // Themes still used by notes or handout masters stay.
    let mut protected: HashSet<String> = HashSet::new();
    for part in deck.part_names() {
        if part.ends_with(".rels") || old_design.contains(part) || part == deck_main || slides.iter().any(|s| s == part) {
            continue;
        }
        for rel in deck.rels(part)? {
            if !rel.external && rel.is(rel_types::THEME) {
                protected.insert(resolve_target(part, &rel.target));
            }
        }
    }

    let mut types = deck.content_types()?;
    for part in old_design.iter().filter(|p| !protected.contains(*p)) {
        deck.remove_part(part);
        deck.remove_part(&rels_path_for(part));
        types.remove_override(part);
    }

    // Copy the template design in under collision-free names.
    let mut taken: HashSet<String> = deck.part_names().map(str::to_string).collect();
    let mut renames: BTreeMap<String, String> = BTreeMap::new();
    for part in &tpl_design {
        let name = unique_part_name(part, &taken);
        taken.insert(name.clone());
        renames.insert(part.clone(), name);
    }

    let tpl_types = template.content_types()?;
    for part in &tpl_design {
        let new_name = &renames[part];
        let data = template
            .part(part)
            .ok_or_else(|| PptxError::MissingPart(part.clone()))?
            .to_vec();
        deck.set_part(new_name.clone(), data);
        if let Some(ct) = tpl_types.content_type_of(part) {
            types.register(new_name, ct);
        }

        let rels: Vec<Relationship> = template
            .rels(part)?
            .into_iter()
            .map(|mut rel| {
                if !rel.external {
                    let target = resolve_target(part, &rel.target);
                    let mapped = renames.get(&target).cloned().unwrap_or(target);
                    rel.target = relative_target(new_name, &mapped);
                }
                rel
            })
            .collect();
        if !rels.is_empty() {
            deck.set_rels(new_name, &rels);
        }
    }

    // Presentation relationships: old masters and theme out, new ones in.
    let mut pres_rels = deck.rels(&deck_main)?;
    pres_rels.retain(|r| !(r.is(rel_types::SLIDE_MASTER) || r.is(rel_types::THEME)));

    let tpl_rels = template.rels(&tpl_main)?;
    let mut master_ids: Vec<(String, String)> = Vec::new();
    for (id, rid) in master_id_entries(template, &tpl_main)? {
        let Some(rel) = tpl_rels.iter().find(|r| r.id == rid) else {
            continue;
        };
        let target = resolve_target(&tpl_main, &rel.target);
        let Some(new_name) = renames.get(&target) else {
            continue;
        };
        let new_rid = next_rel_id(&pres_rels);
        pres_rels.push(Relationship {
            id: new_rid.clone(),
            rel_type: rel.rel_type.clone(),
            target: relative_target(&deck_main, new_name),
            external: false,
        });
        master_ids.push((id.unwrap_or_default(), new_rid));
    }
    if let Some(theme_rel) = tpl_rels.iter().find(|r| !r.external && r.is(rel_types::THEME)) {
        let target = resolve_target(&tpl_main, &theme_rel.target);
        if let Some(new_name) = renames.get(&target) {
            let new_rid = next_rel_id(&pres_rels);
            pres_rels.push(Relationship {
                id: new_rid,
                rel_type: theme_rel.rel_type.clone(),
                target: relative_target(&deck_main, new_name),
                external: false,
            });
        }
    }
    deck.set_rels(&deck_main, &pres_rels);

    let entries: Vec<Vec<(&str, &str)>> = master_ids
        .iter()
        .map(|(id, rid)| vec![("id", id.as_str()), ("r:id", rid.as_str())])
        .collect();
    let main_xml = replace_children(deck.xml(&deck_main)?, b"sldMasterIdLst", "sldMasterId", &entries)?;
    deck.set_part(deck_main.clone(), main_xml);
    deck.set_content_types(&types);

    // Re-attach slides to the new first master's layouts.
    let new_master = renames
        .get(&tpl_masters[0])
        .ok_or_else(|| PptxError::MissingPart(tpl_masters[0].clone()))?;
    let mut layouts = Vec::new();
    for part in layout_parts(deck, new_master)? {
        let key = layout_key(deck, &part)?;
        layouts.push((part, key));
    }
    if layouts.is_empty() {
        return Err(PptxError::InvalidPackage("template master has no layouts".to_string()));
    }

    for (slide, old) in slides.iter().zip(old_keys.iter()) {
        if let Some(layout) = pick_layout(old.as_ref(), &layouts) {
            log::debug!("{} -> {}", slide, layout);
            set_slide_layout(deck, slide, layout)?;
        }
    }

    Ok(())
}
