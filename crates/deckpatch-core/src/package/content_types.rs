use crate::error::Result;
use crate::xml::namespaces::CT;
use crate::xml::{builder, parser, XAttribute, XName, XmlDocument, XmlNodeData};
use std::collections::BTreeMap;

/// Parsed `[Content_Types].xml`.
///
/// Newly written media needs its extension registered here or PowerPoint
/// refuses the package.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = parser::parse_bytes(bytes)?;
        let mut types = Self::default();

        let Some(root) = doc.root() else {
            return Ok(types);
        };

        for node in doc.children(root) {
            let Some(name) = doc.name(node) else { continue };
            match name.local_name.as_str() {
                "Default" => {
                    if let (Some(ext), Some(ct)) = (
                        doc.attribute_local(node, "Extension"),
                        doc.attribute_local(node, "ContentType"),
                    ) {
                        types.defaults.insert(ext.to_ascii_lowercase(), ct.to_string());
                    }
                }
                "Override" => {
                    if let (Some(part), Some(ct)) = (
                        doc.attribute_local(node, "PartName"),
                        doc.attribute_local(node, "ContentType"),
                    ) {
                        types.overrides.insert(part.to_string(), ct.to_string());
                    }
                }
                _ => {}
            }
        }

        Ok(types)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element_with_attrs(
            CT::Types(),
            vec![XAttribute::new(XName::local("xmlns"), CT::NS)],
        ));

        for (ext, ct) in &self.defaults {
            doc.add_child(
                root,
                XmlNodeData::element_with_attrs(
                    CT::Default(),
                    vec![
                        XAttribute::new(XName::local("Extension"), ext),
                        XAttribute::new(XName::local("ContentType"), ct),
                    ],
                ),
            );
        }
        for (part, ct) in &self.overrides {
            doc.add_child(
                root,
                XmlNodeData::element_with_attrs(
                    CT::Override(),
                    vec![
                        XAttribute::new(XName::local("PartName"), part),
                        XAttribute::new(XName::local("ContentType"), ct),
                    ],
                ),
            );
        }

        builder::serialize_bytes(&doc)
    }

    /// Register a default extension mapping; returns true if it was absent.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) -> bool {
        let key = extension.to_ascii_lowercase();
        if self.defaults.contains_key(&key) {
            return false;
        }
        self.defaults.insert(key, content_type.to_string());
        true
    }

    pub fn default_for(&self, extension: &str) -> Option<&str> {
        self.defaults
            .get(&extension.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// MIME content type for an image extension.
pub fn image_content_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

    #[test]
    fn parse_reads_defaults_and_overrides() {
        let types = ContentTypes::parse(SAMPLE.as_bytes()).unwrap();
        assert!(types.default_for("rels").is_some());
        assert!(types.default_for("RELS").is_some());
        assert!(types.default_for("png").is_none());
    }

    #[test]
    fn ensure_default_registers_once() {
        let mut types = ContentTypes::parse(SAMPLE.as_bytes()).unwrap();
        assert!(types.ensure_default("png", "image/png"));
        assert!(!types.ensure_default("png", "image/png"));

        let bytes = types.serialize().unwrap();
        let reparsed = ContentTypes::parse(&bytes).unwrap();
        assert_eq!(reparsed.default_for("png"), Some("image/png"));
    }

    #[test]
    fn image_content_types_cover_common_formats() {
        assert_eq!(image_content_type("PNG"), "image/png");
        assert_eq!(image_content_type("jpeg"), "image/jpeg");
        assert_eq!(image_content_type("unknown"), "image/png");
    }
}
