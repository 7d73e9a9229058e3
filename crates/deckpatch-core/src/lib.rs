//! Round-trip editing engine for PresentationML packages.
//!
//! A deck is opened as a [`package::PptxPackage`], its slides distilled into
//! an element model with positions in inches, and a batch of edited elements
//! is patched back into the original markup with the untouched parts
//! preserved byte for byte. [`pml::PptxEditor`] is the front door.

pub mod error;
pub mod package;
pub mod pml;
pub mod units;
pub mod xml;

pub use error::{DeckError, Result};
pub use pml::{
    EditOptions, EditReport, ElementKind, MediaStore, PptxEditor, Slide, SlideEdit, SlideElement,
};
