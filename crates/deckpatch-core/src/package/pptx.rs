use crate::error::{DeckError, Result};
use crate::package::content_types::{image_content_type, ContentTypes};
use crate::package::relationships::{
    self, relationship_types, Relationship,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";
const SLIDE_SUFFIX: &str = ".xml";

/// The open archive: a flat map from normalized part path to bytes.
///
/// Owned by one request, mutated in place as patches land, serialized once
/// at the end. `BTreeMap` keeps the save order structure-deterministic.
#[derive(Debug)]
pub struct PptxPackage {
    parts: BTreeMap<String, Vec<u8>>,
}

impl PptxPackage {
    pub fn new() -> Self {
        Self {
            parts: BTreeMap::new(),
        }
    }

    /// Load an uploaded archive. Failure here is request-fatal; everything
    /// downstream degrades per part instead.
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let cursor = Cursor::new(bytes);
        let mut archive = ZipArchive::new(cursor).map_err(|e| DeckError::InvalidPackage {
            message: format!("not a readable zip archive: {}", e),
        })?;

        let mut parts = BTreeMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            parts.insert(name, content);
        }

        Ok(Self { parts })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::open(&bytes)
    }

    /// Serialize back into a deflate-compressed archive. Byte-exact
    /// reproduction is not promised (zip metadata may vary), structural
    /// reproduction is.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let mut writer = ZipWriter::new(&mut buffer);

        for (path, content) in &self.parts {
            let options: zip::write::FileOptions<'_, ()> =
                zip::write::FileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(path, options)?;
            writer.write_all(content)?;
        }

        writer.finish()?;
        Ok(buffer.into_inner())
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.save()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn get_part(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(|v| v.as_slice())
    }

    pub fn part_text(&self, path: &str) -> Result<String> {
        let bytes = self.get_part(path).ok_or_else(|| DeckError::MissingPart {
            part_path: path.to_string(),
        })?;
        String::from_utf8(bytes.to_vec()).map_err(|e| DeckError::XmlParse {
            message: e.to_string(),
            location: path.to_string(),
        })
    }

    pub fn set_part(&mut self, path: &str, content: Vec<u8>) {
        self.parts.insert(path.to_string(), content);
    }

    pub fn has_part(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    pub fn remove_part(&mut self, path: &str) {
        self.parts.remove(path);
    }

    pub fn part_names(&self) -> impl Iterator<Item = &String> {
        self.parts.keys()
    }

    // ---- slide discovery ----

    /// Slide numbers present in the archive, sorted numerically.
    ///
    /// The set is authoritative and may have gaps; `slide10.xml` sorts
    /// after `slide9.xml` because numbers are parsed, not compared as text.
    pub fn slide_numbers(&self) -> Vec<usize> {
        let mut numbers: Vec<usize> = self
            .parts
            .keys()
            .filter_map(|path| parse_slide_number(path))
            .collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn slide_path(&self, number: usize) -> String {
        format!("{}{}{}", SLIDE_PREFIX, number, SLIDE_SUFFIX)
    }

    pub fn slide_rels_path(&self, number: usize) -> String {
        format!("ppt/slides/_rels/slide{}.xml.rels", number)
    }

    // ---- relationships ----

    /// Entries of a `.rels` part. A missing or unparsable part is a soft
    /// failure: logged, empty result.
    pub fn relationships(&self, rels_path: &str) -> Vec<Relationship> {
        let Some(bytes) = self.get_part(rels_path) else {
            log::debug!("relationship part {} not present", rels_path);
            return Vec::new();
        };
        match relationships::parse_rels(bytes) {
            Ok(rels) => rels,
            Err(e) => {
                log::warn!("failed to parse {}: {}", rels_path, e);
                Vec::new()
            }
        }
    }

    pub fn write_relationships(&mut self, rels_path: &str, rels: &[Relationship]) -> Result<()> {
        let bytes = relationships::serialize_rels(rels)?;
        self.set_part(rels_path, bytes);
        Ok(())
    }

    /// Merged id -> target table for one slide, from three sources in
    /// priority order: slide rels, presentation rels, slide-layout rels.
    /// An id resolved here is only meaningful for that slide.
    pub fn merged_slide_relationships(&self, number: usize) -> BTreeMap<String, String> {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();

        let slide_rels = self.relationships(&self.slide_rels_path(number));
        for rel in &slide_rels {
            merged.entry(rel.id.clone()).or_insert_with(|| rel.target.clone());
        }

        for rel in self.relationships(PRESENTATION_RELS) {
            merged.entry(rel.id.clone()).or_insert(rel.target);
        }

        for layout_rels_path in self.layout_rels_paths(&slide_rels) {
            for rel in self.relationships(&layout_rels_path) {
                merged.entry(rel.id.clone()).or_insert(rel.target);
            }
        }

        merged
    }

    /// Rels parts of the slide's own layout when it can be resolved,
    /// otherwise every layout rels part in the archive.
    fn layout_rels_paths(&self, slide_rels: &[Relationship]) -> Vec<String> {
        let own_layout = slide_rels
            .iter()
            .find(|rel| rel.rel_type == relationship_types::SLIDE_LAYOUT)
            .map(|rel| resolve_target("ppt/slides", &rel.target))
            .map(|layout_path| rels_path_for(&layout_path))
            .filter(|path| self.has_part(path));

        match own_layout {
            Some(path) => vec![path],
            None => self
                .parts
                .keys()
                .filter(|path| {
                    path.starts_with("ppt/slideLayouts/_rels/") && path.ends_with(".rels")
                })
                .cloned()
                .collect(),
        }
    }

    // ---- media ----

    /// Resolve a relationship target to an actual archive path by probing a
    /// fixed ordered candidate list, then falling back to an extension scan
    /// over media parts.
    pub fn resolve_media_target(&self, target: &str) -> Option<String> {
        for candidate in candidate_paths(target) {
            if self.has_part(&candidate) {
                return Some(candidate);
            }
        }

        let extension = file_extension(target)?;
        self.parts
            .keys()
            .find(|path| {
                path.contains("media/")
                    && file_extension(path).map(|ext| ext.eq_ignore_ascii_case(&extension))
                        == Some(true)
            })
            .cloned()
    }

    /// Write image bytes under a fresh media name and register the content
    /// type. Identical bytes are deduplicated by content hash.
    pub fn add_media(&mut self, bytes: &[u8], extension: &str) -> Result<String> {
        let ext = extension.to_ascii_lowercase();
        let digest = Sha256::digest(bytes);
        let tag = hex::encode(&digest[..6]);

        let mut path = format!("ppt/media/image_{}.{}", tag, ext);
        if let Some(existing) = self.get_part(&path) {
            if existing != bytes {
                // Hash-prefix collision with different content; disambiguate.
                path = format!(
                    "ppt/media/image_{}_{}.{}",
                    tag,
                    uuid::Uuid::new_v4().simple(),
                    ext
                );
            }
        }

        self.set_part(&path, bytes.to_vec());
        self.register_content_type(&ext)?;
        Ok(path)
    }

    fn register_content_type(&mut self, extension: &str) -> Result<()> {
        let Some(bytes) = self.get_part(CONTENT_TYPES_PART) else {
            log::warn!("package has no {}", CONTENT_TYPES_PART);
            return Ok(());
        };
        let mut types = ContentTypes::parse(bytes)?;
        if types.ensure_default(extension, image_content_type(extension)) {
            let serialized = types.serialize()?;
            self.set_part(CONTENT_TYPES_PART, serialized);
        }
        Ok(())
    }
}

impl Default for PptxPackage {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the 1-based slide number out of `ppt/slides/slideN.xml`.
///
/// Slide identity comes from the file name, never from enumeration order;
/// prior edits can leave the numbering non-contiguous.
pub fn parse_slide_number(path: &str) -> Option<usize> {
    let rest = path.strip_prefix(SLIDE_PREFIX)?;
    let digits = rest.strip_suffix(SLIDE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// The `.rels` part path for a given part path.
pub fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Resolve a relationship target relative to a base directory, folding
/// `..` and `.` segments.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };

    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Ordered candidate archive paths for a relationship target.
///
/// The order is an empirical heuristic carried over from production
/// behavior, not a contract; first archive hit wins.
pub fn candidate_paths(target: &str) -> Vec<String> {
    let trimmed = target.trim_start_matches("../").trim_start_matches("./");
    let basename = target.rsplit('/').next().unwrap_or(target);

    let mut candidates = vec![
        resolve_target("ppt/slides", target),
        format!("ppt/{}", trimmed),
        format!("ppt/media/{}", basename),
        target.trim_start_matches('/').to_string(),
        format!("ppt/embeddings/{}", basename),
        format!("media/{}", basename),
    ];

    candidates.dedup_by(|a, b| a == b);
    let mut seen = std::collections::BTreeSet::new();
    candidates.retain(|c| !c.is_empty() && seen.insert(c.clone()));
    candidates
}

pub fn file_extension(path: &str) -> Option<String> {
    let basename = path.rsplit('/').next()?;
    let (_, ext) = basename.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}
