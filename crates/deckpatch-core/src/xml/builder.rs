use super::arena::{XmlDocument, XMLNS_NS};
use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use crate::error::{DeckError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::collections::HashMap;
use std::io::Cursor;

/// Serialize with the standard OOXML declaration.
pub fn serialize(doc: &XmlDocument) -> Result<String> {
    let bytes = serialize_bytes(doc)?;
    String::from_utf8(bytes).map_err(|e| DeckError::XmlWrite(e.to_string()))
}

pub fn serialize_bytes(doc: &XmlDocument) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(write_err)?;

    if let Some(root_id) = doc.root() {
        let mut namespace_map = NamespaceMap::new();
        if let Some(attrs) = doc.get(root_id).and_then(|data| data.attributes()) {
            extend_namespace_map(&mut namespace_map, attrs);
        }
        write_node(doc, root_id, &mut writer, &namespace_map)?;
    }

    Ok(writer.into_inner().into_inner())
}

fn write_err<E: std::fmt::Display>(e: E) -> DeckError {
    DeckError::XmlWrite(e.to_string())
}

/// namespace URI -> prefix ("" for the default namespace)
type NamespaceMap = HashMap<String, String>;

fn extend_namespace_map(namespace_map: &mut NamespaceMap, attributes: &[XAttribute]) {
    for attr in attributes {
        match &attr.name.namespace {
            None if attr.name.local_name == "xmlns" => {
                // Default namespace declaration: xmlns="uri".
                namespace_map
                    .entry(attr.value.clone())
                    .or_insert_with(String::new);
            }
            Some(ns) if ns == XMLNS_NS => {
                // Prefixed declaration: xmlns:prefix="uri".
                namespace_map
                    .entry(attr.value.clone())
                    .or_insert_with(|| attr.name.local_name.clone());
            }
            _ => {}
        }
    }
}

fn prefix_for_element<'a>(namespace: &str, namespace_map: &'a NamespaceMap) -> &'a str {
    match namespace_map.get(namespace) {
        Some(prefix) => prefix.as_str(),
        None => fallback_prefix(namespace),
    }
}

fn prefix_for_attribute<'a>(namespace: &str, namespace_map: &'a NamespaceMap) -> &'a str {
    if namespace == XMLNS_NS {
        return "xmlns";
    }
    // An attribute never picks up the default namespace; an empty mapped
    // prefix must fall back to a declared one.
    match namespace_map.get(namespace) {
        Some(prefix) if !prefix.is_empty() => prefix.as_str(),
        _ => fallback_prefix(namespace),
    }
}

fn write_node<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: indextree::NodeId,
    writer: &mut Writer<W>,
    namespace_map: &NamespaceMap,
) -> Result<()> {
    let Some(node_data) = doc.get(node_id) else {
        return Ok(());
    };

    match node_data {
        XmlNodeData::Element { name, attributes } => {
            write_element(doc, node_id, name, attributes, writer, namespace_map)?;
        }
        XmlNodeData::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_err)?;
        }
        XmlNodeData::CData(text) => {
            writer
                .write_event(Event::CData(quick_xml::events::BytesCData::new(text)))
                .map_err(write_err)?;
        }
        XmlNodeData::Comment(text) => {
            writer
                .write_event(Event::Comment(BytesText::new(text)))
                .map_err(write_err)?;
        }
        XmlNodeData::ProcessingInstruction { target, data } => {
            let content = if data.is_empty() {
                target.clone()
            } else {
                format!("{} {}", target, data)
            };
            writer
                .write_event(Event::PI(quick_xml::events::BytesPI::new(&content)))
                .map_err(write_err)?;
        }
    }

    Ok(())
}

fn write_element<W: std::io::Write>(
    doc: &XmlDocument,
    node_id: indextree::NodeId,
    name: &XName,
    attributes: &[XAttribute],
    writer: &mut Writer<W>,
    namespace_map: &NamespaceMap,
) -> Result<()> {
    let mut scoped_map = namespace_map.clone();
    extend_namespace_map(&mut scoped_map, attributes);

    let tag_name = qualified_name(name, &scoped_map, prefix_for_element);
    let mut elem = BytesStart::new(&tag_name);

    for attr in attributes {
        let attr_name = qualified_name(&attr.name, &scoped_map, prefix_for_attribute);
        elem.push_attribute((attr_name.as_str(), attr.value.as_str()));
    }

    let children: Vec<_> = doc.children(node_id).collect();

    if children.is_empty() {
        writer.write_event(Event::Empty(elem)).map_err(write_err)?;
    } else {
        writer.write_event(Event::Start(elem)).map_err(write_err)?;
        for child_id in children {
            write_node(doc, child_id, writer, &scoped_map)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(&tag_name)))
            .map_err(write_err)?;
    }

    Ok(())
}

fn qualified_name(
    name: &XName,
    namespace_map: &NamespaceMap,
    lookup: for<'a> fn(&str, &'a NamespaceMap) -> &'a str,
) -> String {
    match &name.namespace {
        Some(ns) => {
            let prefix = lookup(ns, namespace_map);
            if prefix.is_empty() {
                name.local_name.clone()
            } else {
                format!("{}:{}", prefix, name.local_name)
            }
        }
        None => name.local_name.clone(),
    }
}

/// Conventional prefixes for namespaces a slide may reference without an
/// in-scope declaration. Splicing code declares what it uses, so this is a
/// safety net, not the primary mechanism.
fn fallback_prefix(namespace: &str) -> &'static str {
    match namespace {
        "http://schemas.openxmlformats.org/presentationml/2006/main" => "p",
        "http://schemas.openxmlformats.org/drawingml/2006/main" => "a",
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships" => "r",
        "http://schemas.openxmlformats.org/drawingml/2006/picture" => "pic",
        "http://schemas.openxmlformats.org/drawingml/2006/chart" => "c",
        "http://schemas.openxmlformats.org/markup-compatibility/2006" => "mc",
        "http://www.w3.org/2000/xmlns/" => "xmlns",
        "http://www.w3.org/XML/1998/namespace" => "xml",
        _ => "ns",
    }
}
