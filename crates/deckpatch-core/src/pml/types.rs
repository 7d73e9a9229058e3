//! The element model crossing the edit boundary.
//!
//! Positions and sizes are inches here; everything inside the archive is
//! integer EMUs. Ids are derived from extraction order and are matching
//! hints only, never stable keys across a parse/edit/reparse cycle.

use serde::{Deserialize, Serialize};

/// One slide as presented to the editing side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// 1-based number parsed from the slide file name, not array position.
    pub number: usize,
    /// Nominal canvas width in inches.
    pub width: f64,
    /// Nominal canvas height in inches.
    pub height: f64,
    pub elements: Vec<SlideElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideElement {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub kind: ElementKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    #[serde(rename_all = "camelCase")]
    Text {
        /// Paragraphs joined with `\n`; runs within a paragraph joined with
        /// no separator.
        content: String,
        /// Snapshot of the extracted content, used for diffing on the way
        /// back in.
        #[serde(default)]
        original_content: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        /// Local file reference (opaque to the engine; resolved by the
        /// session's media store).
        src: String,
        /// Archive path the image was extracted from, for display.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_path: Option<String>,
    },
    Table {
        /// Row-major grid of cell strings. Rows may be ragged when the
        /// source was malformed; consumers must tolerate that.
        rows: Vec<Vec<String>>,
    },
    /// Connector or generic shape with no extractable payload.
    Shape,
}

impl ElementKind {
    pub fn name(&self) -> &'static str {
        match self {
            ElementKind::Text { .. } => "text",
            ElementKind::Image { .. } => "image",
            ElementKind::Table { .. } => "table",
            ElementKind::Shape => "shape",
        }
    }

    pub fn same_kind(&self, other: &ElementKind) -> bool {
        self.name() == other.name()
    }
}

impl SlideElement {
    pub fn new(id: String, x: f64, y: f64, width: f64, height: f64, kind: ElementKind) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            kind,
        }
    }
}

/// An edited slide submitted for regeneration, keyed by slide number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideEdit {
    /// Accepts `number` too, so extracted JSON can be edited and fed
    /// straight back.
    #[serde(alias = "number")]
    pub slide: usize,
    pub elements: Vec<SlideElement>,
}

/// Outcome of one apply pass. Per-slide and per-element failures are
/// collected as warnings, never escalated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReport {
    pub slides_patched: usize,
    pub elements_patched: usize,
    pub warnings: Vec<String>,
}

impl EditReport {
    pub fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}
