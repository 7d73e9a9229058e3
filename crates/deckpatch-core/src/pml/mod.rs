//! PresentationML editing: extraction, matching, and in-place patching.

pub mod editor;
pub mod extract;
pub mod settings;
pub mod types;

pub(crate) mod image_patch;
pub(crate) mod matching;
pub(crate) mod normalize;
pub(crate) mod table;
pub(crate) mod text_patch;

pub use editor::{edits_from_json, slides_to_json, MediaStore, PptxEditor};
pub use settings::EditOptions;
pub use types::{EditReport, ElementKind, Slide, SlideEdit, SlideElement};
