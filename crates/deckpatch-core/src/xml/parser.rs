use super::arena::{XmlDocument, XMLNS_NS};
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::{DeckError, Result};

pub fn parse(xml: &str) -> Result<XmlDocument> {
    let parsed = roxmltree::Document::parse_with_options(
        xml,
        roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        },
    )
    .map_err(|e| DeckError::XmlParse {
        message: e.to_string(),
        location: format!("line {}", e.pos().row),
    })?;

    let mut doc = XmlDocument::new();
    build_tree(parsed.root_element(), &mut doc, None);
    Ok(doc)
}

pub fn parse_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    let text = std::str::from_utf8(bytes).map_err(|e| DeckError::XmlParse {
        message: e.to_string(),
        location: "input".to_string(),
    })?;
    parse(text)
}

fn build_tree(node: roxmltree::Node, doc: &mut XmlDocument, parent: Option<indextree::NodeId>) {
    let node_data = match node.node_type() {
        roxmltree::NodeType::Element => {
            let name = XName::new(
                node.tag_name().namespace().unwrap_or(""),
                node.tag_name().name(),
            );

            let mut attributes: Vec<XAttribute> = node
                .attributes()
                .map(|attr| {
                    XAttribute::new(
                        XName::new(attr.namespace().unwrap_or(""), attr.name()),
                        attr.value(),
                    )
                })
                .collect();

            // roxmltree separates namespace declarations from attributes;
            // fold them back in so round-tripping keeps xmlns:* intact.
            // namespaces() reports everything in scope, so declarations
            // inherited from an ancestor must be skipped or every element
            // would re-declare them.
            for ns in node.namespaces() {
                let inherited = node.parent_element().is_some_and(|parent| {
                    parent
                        .namespaces()
                        .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
                });
                if inherited {
                    continue;
                }
                match ns.name() {
                    Some(prefix) => {
                        attributes.push(XAttribute::new(XName::new(XMLNS_NS, prefix), ns.uri()));
                    }
                    None => {
                        attributes.push(XAttribute::new(XName::local("xmlns"), ns.uri()));
                    }
                }
            }

            XmlNodeData::Element { name, attributes }
        }
        roxmltree::NodeType::Text => match node.text() {
            Some(text) => XmlNodeData::Text(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::Comment => match node.text() {
            Some(text) => XmlNodeData::Comment(text.to_string()),
            None => return,
        },
        roxmltree::NodeType::PI => XmlNodeData::ProcessingInstruction {
            target: node
                .pi()
                .map(|pi| pi.target.to_string())
                .unwrap_or_default(),
            data: node
                .pi()
                .and_then(|pi| pi.value.map(|s| s.to_string()))
                .unwrap_or_default(),
        },
        _ => return,
    };

    let new_id = match parent {
        Some(parent_id) => doc.add_child(parent_id, node_data),
        None => doc.add_root(node_data),
    };

    for child in node.children() {
        build_tree(child, doc, Some(new_id));
    }
}
