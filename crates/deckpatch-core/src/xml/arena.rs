use super::node::XmlNodeData;
use super::xname::{XAttribute, XName};
use indextree::{Arena, NodeId};

pub const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";

/// Arena-backed XML tree.
///
/// All slide patching happens against this structure; node identity is an
/// arena id, so parents, siblings, and in-place edits are cheap.
#[derive(Debug)]
pub struct XmlDocument {
    arena: Arena<XmlNodeData>,
    root: Option<NodeId>,
}

impl XmlDocument {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&XmlNodeData> {
        self.arena.get(id).map(|node| node.get())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut XmlNodeData> {
        self.arena.get_mut(id).map(|node| node.get_mut())
    }

    pub fn add_root(&mut self, data: XmlNodeData) -> NodeId {
        let id = self.arena.new_node(data);
        self.root = Some(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, data: XmlNodeData) -> NodeId {
        let child = self.arena.new_node(data);
        parent.append(child, &mut self.arena);
        child
    }

    pub fn add_before(&mut self, sibling: NodeId, data: XmlNodeData) -> NodeId {
        let new_node = self.arena.new_node(data);
        sibling.insert_before(new_node, &mut self.arena);
        new_node
    }

    pub fn remove(&mut self, node: NodeId) {
        node.remove_subtree(&mut self.arena);
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        parent.children(&self.arena)
    }

    pub fn descendants(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.descendants(&self.arena)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node)?.parent()
    }

    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        node.ancestors(&self.arena)
    }

    /// Name of an element node, if it is one.
    pub fn name(&self, node: NodeId) -> Option<&XName> {
        self.get(node).and_then(|data| data.name())
    }

    pub fn is_named(&self, node: NodeId, name: &XName) -> bool {
        self.name(node) == Some(name)
    }

    /// First direct child element with the given name.
    pub fn find_child(&self, parent: NodeId, name: &XName) -> Option<NodeId> {
        self.children(parent)
            .find(|&child| self.is_named(child, name))
    }

    /// All direct child elements with the given name.
    pub fn children_named<'a>(
        &'a self,
        parent: NodeId,
        name: &'a XName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent)
            .filter(move |&child| self.is_named(child, name))
    }

    /// First descendant element (in document order) with the given name.
    pub fn find_descendant(&self, root: NodeId, name: &XName) -> Option<NodeId> {
        self.descendants(root)
            .find(|&node| self.is_named(node, name))
    }

    /// Attribute value by qualified name.
    pub fn attribute(&self, node: NodeId, name: &XName) -> Option<&str> {
        self.get(node)?
            .attributes()?
            .iter()
            .find(|attr| &attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Attribute value by local name alone, ignoring namespace.
    ///
    /// Relationship markup uses unqualified `Id`/`Target` attributes; shape
    /// transforms use unqualified `x`/`y`/`cx`/`cy`.
    pub fn attribute_local(&self, node: NodeId, local: &str) -> Option<&str> {
        self.get(node)?
            .attributes()?
            .iter()
            .find(|attr| attr.name.local_name == local && attr.name.namespace.is_none())
            .map(|attr| attr.value.as_str())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &XName, value: &str) {
        if let Some(node_data) = self.get_mut(node) {
            if let Some(attrs) = node_data.attributes_mut() {
                if let Some(attr) = attrs.iter_mut().find(|a| &a.name == name) {
                    attr.value = value.to_string();
                } else {
                    attrs.push(XAttribute::new(name.clone(), value));
                }
            }
        }
    }

    /// Concatenated text of all direct text/CData children.
    pub fn element_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            if let Some(text) = self.get(child).and_then(|data| data.text_content()) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace the text content of an element with a single text node.
    pub fn set_element_text(&mut self, node: NodeId, text: &str) {
        let text_children: Vec<NodeId> = self
            .children(node)
            .filter(|&child| {
                self.get(child)
                    .map(|data| data.text_content().is_some())
                    .unwrap_or(false)
            })
            .collect();
        for child in text_children {
            self.remove(child);
        }
        self.add_child(node, XmlNodeData::text(text));
    }

    /// Declare `xmlns:prefix="uri"` on the root if no ancestor declares it,
    /// so freshly spliced subtrees serialize with a resolvable prefix.
    pub fn ensure_namespace(&mut self, prefix: &str, uri: &str) {
        let Some(root) = self.root else { return };
        let declared = self
            .get(root)
            .and_then(|data| data.attributes())
            .map(|attrs| {
                attrs.iter().any(|attr| {
                    attr.name.has_namespace(XMLNS_NS) && attr.name.local_name == prefix
                })
            })
            .unwrap_or(false);
        if !declared {
            self.set_attribute(root, &XName::new(XMLNS_NS, prefix), uri);
        }
    }
}

impl Default for XmlDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(local: &str) -> XName {
        XName::new("urn:test", local)
    }

    #[test]
    fn find_child_matches_qualified_names_only() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(ns("spTree")));
        doc.add_child(root, XmlNodeData::element(XName::local("sp")));
        let qualified = doc.add_child(root, XmlNodeData::element(ns("sp")));

        assert_eq!(doc.find_child(root, &ns("sp")), Some(qualified));
    }

    #[test]
    fn element_text_concatenates_direct_text_children() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(ns("t")));
        doc.add_child(root, XmlNodeData::text("Hello "));
        doc.add_child(root, XmlNodeData::text("World"));

        assert_eq!(doc.element_text(root), "Hello World");
    }

    #[test]
    fn set_element_text_replaces_existing_text_nodes() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(ns("t")));
        doc.add_child(root, XmlNodeData::text("old"));

        doc.set_element_text(root, "new");
        assert_eq!(doc.element_text(root), "new");
        assert_eq!(doc.children(root).count(), 1);
    }

    #[test]
    fn set_attribute_updates_in_place() {
        let mut doc = XmlDocument::new();
        let root = doc.add_root(XmlNodeData::element(ns("off")));
        let x = XName::local("x");

        doc.set_attribute(root, &x, "914400");
        doc.set_attribute(root, &x, "1828800");

        assert_eq!(doc.attribute(root, &x), Some("1828800"));
        assert_eq!(doc.get(root).unwrap().attributes().unwrap().len(), 1);
    }

    #[test]
    fn ensure_namespace_is_idempotent() {
        let mut doc = XmlDocument::new();
        doc.add_root(XmlNodeData::element(ns("sld")));

        doc.ensure_namespace("r", "urn:rels");
        doc.ensure_namespace("r", "urn:rels");

        let root = doc.root().unwrap();
        let count = doc
            .get(root)
            .unwrap()
            .attributes()
            .unwrap()
            .iter()
            .filter(|attr| attr.name.local_name == "r")
            .count();
        assert_eq!(count, 1);
    }
}
