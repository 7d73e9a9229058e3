use crate::error::Result;
use crate::xml::namespaces::REL;
use crate::xml::{builder, parser, XAttribute, XName, XmlDocument, XmlNodeData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

/// One entry of a `.rels` part: a short id bound to a target path.
///
/// Ids are only meaningful within the part whose rels declared them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    #[serde(default)]
    pub target_mode: TargetMode,
}

impl Relationship {
    pub fn new(id: &str, rel_type: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: TargetMode::Internal,
        }
    }

    /// Numeric suffix of an `rIdN` id, if it has one.
    pub fn numeric_id(&self) -> Option<u32> {
        self.id.strip_prefix("rId")?.parse().ok()
    }
}

pub mod relationship_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
}

/// Parse a `.rels` part into its entries. Entries missing `Id` or `Target`
/// are skipped rather than failing the whole part.
pub fn parse_rels(bytes: &[u8]) -> Result<Vec<Relationship>> {
    let doc = parser::parse_bytes(bytes)?;
    let mut rels = Vec::new();

    let Some(root) = doc.root() else {
        return Ok(rels);
    };

    for node in doc.children(root) {
        let Some(name) = doc.name(node) else { continue };
        if name.local_name != "Relationship" {
            continue;
        }
        let (Some(id), Some(target)) = (
            doc.attribute_local(node, "Id"),
            doc.attribute_local(node, "Target"),
        ) else {
            log::debug!("skipping relationship entry without Id/Target");
            continue;
        };
        let rel_type = doc.attribute_local(node, "Type").unwrap_or_default();
        let mut rel = Relationship::new(id, rel_type, target);
        if doc.attribute_local(node, "TargetMode") == Some("External") {
            rel.target_mode = TargetMode::External;
        }
        rels.push(rel);
    }

    Ok(rels)
}

/// Serialize entries back into a `.rels` document.
pub fn serialize_rels(rels: &[Relationship]) -> Result<Vec<u8>> {
    let mut doc = XmlDocument::new();
    let root = doc.add_root(XmlNodeData::element_with_attrs(
        REL::Relationships(),
        vec![XAttribute::new(XName::local("xmlns"), REL::NS)],
    ));

    for rel in rels {
        let mut attrs = vec![
            XAttribute::new(XName::local("Id"), &rel.id),
            XAttribute::new(XName::local("Type"), &rel.rel_type),
            XAttribute::new(XName::local("Target"), &rel.target),
        ];
        if rel.target_mode == TargetMode::External {
            attrs.push(XAttribute::new(XName::local("TargetMode"), "External"));
        }
        doc.add_child(root, XmlNodeData::element_with_attrs(REL::Relationship(), attrs));
    }

    builder::serialize_bytes(&doc)
}

/// Next unused `rIdN` id given the existing entries.
pub fn next_relationship_id(rels: &[Relationship]) -> String {
    let max = rels.iter().filter_map(|rel| rel.numeric_id()).max().unwrap_or(0);
    format!("rId{}", max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#;

    #[test]
    fn parse_reads_ids_and_targets() {
        let rels = parse_rels(SAMPLE.as_bytes()).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].id, "rId1");
        assert_eq!(rels[1].target, "../media/image1.png");
        assert_eq!(rels[1].rel_type, relationship_types::IMAGE);
    }

    #[test]
    fn serialize_round_trips() {
        let rels = parse_rels(SAMPLE.as_bytes()).unwrap();
        let bytes = serialize_rels(&rels).unwrap();
        let reparsed = parse_rels(&bytes).unwrap();
        assert_eq!(rels, reparsed);
    }

    #[test]
    fn next_id_skips_past_existing_numeric_ids() {
        let rels = vec![
            Relationship::new("rId7", relationship_types::IMAGE, "a.png"),
            Relationship::new("rId2", relationship_types::IMAGE, "b.png"),
            Relationship::new("custom", relationship_types::IMAGE, "c.png"),
        ];
        assert_eq!(next_relationship_id(&rels), "rId8");
        assert_eq!(next_relationship_id(&[]), "rId1");
    }

    #[test]
    fn external_target_mode_survives_round_trip() {
        let mut rel = Relationship::new("rId1", relationship_types::IMAGE, "http://example.com/x.png");
        rel.target_mode = TargetMode::External;
        let bytes = serialize_rels(&[rel.clone()]).unwrap();
        let reparsed = parse_rels(&bytes).unwrap();
        assert_eq!(reparsed[0], rel);
    }
}
