//! The editing façade: extract elements, apply a batch of edits, save.
//!
//! `apply_edits` never fails on a per-slide or per-element problem. A slide
//! that is missing, an element that cannot be matched, or media that cannot
//! be found produces a warning in the report and the pass moves on. Only
//! package-level problems (unreadable archive, unwritable output) are
//! errors.

use crate::error::{DeckError, Result};
use crate::package::{pptx, PptxPackage};
use crate::pml::extract;
use crate::pml::matching;
use crate::pml::normalize::normalize_dimensions;
use crate::pml::settings::EditOptions;
use crate::pml::table;
use crate::pml::text_patch;
use crate::pml::types::{EditReport, ElementKind, Slide, SlideEdit, SlideElement};
use crate::pml::image_patch;
use std::collections::BTreeMap;
use std::path::Path;

/// Image payloads keyed by the `src` name edits refer to.
#[derive(Debug, Default)]
pub struct MediaStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) {
        self.entries.insert(name.to_string(), bytes);
    }

    /// Register a file under its base name.
    pub fn load_file(&mut self, path: &Path) -> Result<String> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DeckError::Media {
                src: path.display().to_string(),
                message: "path has no usable file name".to_string(),
            })?
            .to_string();
        let bytes = std::fs::read(path).map_err(|e| DeckError::Media {
            src: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.entries.insert(name.clone(), bytes);
        Ok(name)
    }

    /// Register every regular file in a directory under its base name.
    /// Returns the names that were added, in directory order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(dir).map_err(|e| DeckError::Media {
            src: dir.display().to_string(),
            message: e.to_string(),
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DeckError::Media {
                src: dir.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if path.is_file() {
                names.push(self.load_file(&path)?);
            }
        }
        Ok(names)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct PptxEditor {
    package: PptxPackage,
    options: EditOptions,
}

impl PptxEditor {
    pub fn new(package: PptxPackage) -> Self {
        Self {
            package,
            options: EditOptions::default(),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(PptxPackage::from_file(path)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(PptxPackage::open(bytes)?))
    }

    pub fn with_options(mut self, options: EditOptions) -> Self {
        self.options = options;
        self
    }

    pub fn package(&self) -> &PptxPackage {
        &self.package
    }

    pub fn extract(&self) -> Vec<Slide> {
        extract::extract_all(&self.package, &self.options)
    }

    pub fn extract_slide(&self, number: usize) -> Result<Slide> {
        extract::extract_slide(&self.package, number, &self.options)
    }

    pub fn apply_edits(&mut self, edits: &[SlideEdit], media: &MediaStore) -> Result<EditReport> {
        let mut report = EditReport::default();
        for edit in edits {
            self.apply_slide_edit(edit, media, &mut report);
        }
        Ok(report)
    }

    /// Append a table to a slide unconditionally, bypassing matching.
    pub fn insert_table(&mut self, slide: usize, element: &SlideElement) -> Result<()> {
        let path = self.package.slide_path(slide);
        let xml = self.package.part_text(&path)?;
        let out = table::insert_table(&xml, slide, element, &self.options)?;
        self.package
            .set_part(&path, normalize_dimensions(&out).into_bytes());
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.package.save_to_file(path)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.package.save()
    }

    fn apply_slide_edit(&mut self, edit: &SlideEdit, media: &MediaStore, report: &mut EditReport) {
        let path = self.package.slide_path(edit.slide);
        let mut xml = match self.package.part_text(&path) {
            Ok(xml) => xml,
            Err(_) => {
                report.warn(format!("slide {} not found; edit skipped", edit.slide));
                return;
            }
        };

        let extracted = match extract::extract_slide(&self.package, edit.slide, &self.options) {
            Ok(slide) => slide.elements,
            Err(e) => {
                report.warn(format!("slide {} could not be read: {}", edit.slide, e));
                return;
            }
        };
        let hits = matching::match_all(&edit.elements, &extracted, &self.options);

        let mut patched = 0usize;
        for (element, hit) in edit.elements.iter().zip(hits) {
            let target = hit.map(|i| &extracted[i]);
            match self.apply_element(edit.slide, &xml, element, target, media, report) {
                Some(new_xml) => {
                    xml = new_xml;
                    patched += 1;
                }
                None => {}
            }
        }

        if patched > 0 {
            let normalized = normalize_dimensions(&xml);
            self.package.set_part(&path, normalized.into_bytes());
            report.slides_patched += 1;
            report.elements_patched += patched;
        }
    }

    /// One element edit against the current slide XML. `Some` carries the
    /// rewritten slide; `None` means nothing changed, with a warning already
    /// recorded if the edit was lost rather than a no-op.
    fn apply_element(
        &mut self,
        slide: usize,
        xml: &str,
        element: &SlideElement,
        target: Option<&SlideElement>,
        media: &MediaStore,
        report: &mut EditReport,
    ) -> Option<String> {
        match &element.kind {
            ElementKind::Text { content, original_content } => {
                let Some(target) = target else {
                    report.warn(format!(
                        "slide {}: no match for text element '{}'; text insertion is not supported",
                        slide, element.id
                    ));
                    return None;
                };
                let needle = if original_content.is_empty() {
                    match &target.kind {
                        ElementKind::Text { content, .. } => content.clone(),
                        _ => return None,
                    }
                } else {
                    original_content.clone()
                };
                if needle == *content || content.is_empty() {
                    return None;
                }
                match text_patch::patch_text(xml, &needle, content) {
                    Some(out) => Some(out),
                    None => {
                        report.warn(format!(
                            "slide {}: original text for '{}' not found in markup",
                            slide, element.id
                        ));
                        None
                    }
                }
            }

            ElementKind::Image { src, .. } => {
                let Some(bytes) = media.get(src) else {
                    // Unchanged images come back with their extracted src;
                    // only treat a missing payload as a loss when the edit
                    // actually points somewhere new.
                    if target.is_some() && Some(src.as_str()) != original_src(target) {
                        report.warn(format!(
                            "slide {}: media '{}' not supplied for element '{}'",
                            slide, src, element.id
                        ));
                    } else if target.is_none() {
                        report.warn(format!(
                            "slide {}: media '{}' not supplied for inserted image '{}'",
                            slide, src, element.id
                        ));
                    }
                    return None;
                };
                let ext = pptx::file_extension(src).unwrap_or_else(|| "png".to_string());
                let mut sized = element.clone();
                if let Some(target) = target {
                    // The matched element's inches came straight from the
                    // slide's EMUs, so writing them back reproduces the
                    // original transform exactly. The edit's own values are
                    // only consulted for a dimension the slide lacked.
                    sized.x = target.x;
                    sized.y = target.y;
                    sized.width = target.width;
                    sized.height = target.height;
                    fill_missing_extent(&mut sized, element);
                }
                if sized.width <= 0.0 {
                    sized.width = self.options.default_extent;
                }
                if sized.height <= 0.0 {
                    sized.height = self.options.default_extent;
                }
                let result = match target {
                    Some(_) => image_patch::replace_image(
                        &mut self.package,
                        slide,
                        xml,
                        &sized,
                        bytes,
                        &ext,
                        &self.options,
                    )
                    .or_else(|e| {
                        // A picture that can't be updated in place (gone,
                        // or with no blip to retarget) is inserted fresh.
                        log::debug!("slide {}: in-place replace failed ({}), inserting", slide, e);
                        image_patch::insert_image(
                            &mut self.package,
                            slide,
                            xml,
                            &sized,
                            bytes,
                            &ext,
                        )
                    }),
                    None => image_patch::insert_image(
                        &mut self.package,
                        slide,
                        xml,
                        &sized,
                        bytes,
                        &ext,
                    ),
                };
                match result {
                    Ok(out) => Some(out),
                    Err(e) => {
                        report.warn(format!(
                            "slide {}: image edit '{}' failed: {}",
                            slide, element.id, e
                        ));
                        None
                    }
                }
            }

            ElementKind::Table { rows } => {
                let result = match target {
                    Some(_) => table::replace_table(xml, slide, element, rows, &self.options),
                    None => table::insert_table(xml, slide, element, &self.options),
                };
                match result {
                    Ok(out) => Some(out),
                    Err(e) => {
                        report.warn(format!(
                            "slide {}: table edit '{}' failed: {}",
                            slide, element.id, e
                        ));
                        None
                    }
                }
            }

            ElementKind::Shape => None,
        }
    }
}

/// Fills in size fields `element` lacks. A single missing dimension is
/// derived from `source`'s aspect ratio so proportions are kept; both
/// missing copies `source`'s size outright.
fn fill_missing_extent(element: &mut SlideElement, source: &SlideElement) {
    if element.width <= 0.0 && element.height <= 0.0 {
        element.width = source.width;
        element.height = source.height;
    } else if element.width <= 0.0 && source.height > 0.0 {
        element.width = element.height * source.width / source.height;
    } else if element.height <= 0.0 && source.width > 0.0 {
        element.height = element.width * source.height / source.width;
    }
}

fn original_src(target: Option<&SlideElement>) -> Option<&str> {
    match target.map(|t| &t.kind) {
        Some(ElementKind::Image { src, .. }) => Some(src.as_str()),
        _ => None,
    }
}

/// Pretty JSON for the extracted model, the exchange format edits come
/// back in.
pub fn slides_to_json(slides: &[Slide]) -> Result<String> {
    Ok(serde_json::to_string_pretty(slides)?)
}

pub fn edits_from_json(json: &str) -> Result<Vec<SlideEdit>> {
    Ok(serde_json::from_str(json)?)
}
