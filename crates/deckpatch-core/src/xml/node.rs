use super::xname::{XAttribute, XName};

/// One node of the parsed slide tree.
///
/// The tagged-variant form replaces ad hoc "does this key exist" probing:
/// every traversal matches exhaustively on the node kind.
#[derive(Clone, Debug)]
pub enum XmlNodeData {
    Element {
        name: XName,
        attributes: Vec<XAttribute>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

impl XmlNodeData {
    pub fn element(name: XName) -> Self {
        Self::Element {
            name,
            attributes: Vec::new(),
        }
    }

    pub fn element_with_attrs(name: XName, attributes: Vec<XAttribute>) -> Self {
        Self::Element { name, attributes }
    }

    pub fn text(content: &str) -> Self {
        Self::Text(content.to_string())
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    pub fn name(&self) -> Option<&XName> {
        match self {
            Self::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self) -> Option<&[XAttribute]> {
        match self {
            Self::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn attributes_mut(&mut self) -> Option<&mut Vec<XAttribute>> {
        match self {
            Self::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::CData(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_node_exposes_its_name() {
        let name = XName::new("urn:test", "sp");
        let node = XmlNodeData::element(name.clone());
        assert!(node.is_element());
        assert_eq!(node.name(), Some(&name));
        assert!(node.text_content().is_none());
    }

    #[test]
    fn text_and_cdata_expose_content() {
        assert_eq!(XmlNodeData::text("Hello").text_content(), Some("Hello"));
        assert_eq!(
            XmlNodeData::CData("raw".to_string()).text_content(),
            Some("raw")
        );
    }
}
