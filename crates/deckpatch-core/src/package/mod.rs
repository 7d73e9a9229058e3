pub mod content_types;
pub mod pptx;
pub mod relationships;

pub use content_types::ContentTypes;
pub use pptx::PptxPackage;
pub use relationships::{Relationship, TargetMode};
