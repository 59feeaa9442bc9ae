#![forbid(unsafe_code)]

//! Owned XML element tree.
//!
//! Every element and attribute carries its resolved namespace URI next to
//! the prefix it was written with, so a subtree can be moved into another
//! document (or canonicalized on its own) without consulting ancestors.

use xmlsign_core::Error;

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: Option<String> },
}

/// An attribute.  `namespace` is `None` for unqualified attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Qualified name as written (`prefix:name` or `name`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A namespace declaration written on an element (`xmlns` / `xmlns:p`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    /// `None` for the default namespace.
    pub prefix: Option<String>,
    pub uri: String,
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub name: String,
    pub namespace_decls: Vec<NamespaceDecl>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            prefix: None,
            name: name.into(),
            namespace_decls: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element in `namespace`, written with the default (unprefixed) form.
    pub fn new_ns(namespace: &str, name: impl Into<String>) -> Self {
        let mut elem = Self::new(name);
        elem.namespace = Some(namespace.to_owned());
        elem
    }

    /// Parse an XML document and return its document element.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        crate::parse::parse_element(xml)
    }

    /// Serialize to XML text.
    pub fn to_xml(&self) -> String {
        crate::writer::write_element(self)
    }

    /// Qualified name as written (`prefix:name` or `name`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{p}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Check namespace and local name.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.push_child(child);
        self
    }

    /// Add an explicit namespace declaration.
    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: &str) {
        self.namespace_decls.retain(|d| d.prefix.as_deref() != prefix);
        self.namespace_decls.push(NamespaceDecl {
            prefix: prefix.map(str::to_owned),
            uri: uri.to_owned(),
        });
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// Value of an unqualified attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set (or replace) an unqualified attribute.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self
            .attributes
            .iter_mut()
            .find(|a| a.namespace.is_none() && a.name == name)
        {
            existing.value = value;
        } else {
            self.attributes.push(Attribute {
                namespace: None,
                prefix: None,
                name: name.to_owned(),
                value,
            });
        }
    }

    // ── Children ─────────────────────────────────────────────────────

    pub fn push_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    pub fn push_node(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Iterate over child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given namespace and local name.
    pub fn find_child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.is(namespace, name))
    }

    /// All child elements with the given namespace and local name.
    pub fn find_children<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.child_elements().filter(move |e| e.is(namespace, name))
    }

    // ── Paths ────────────────────────────────────────────────────────
    //
    // A path is the sequence of indices into `children` leading from this
    // element to a descendant; the empty path is the element itself.

    /// Depth-first search (document order, self first) for an element.
    pub fn find_path(&self, pred: &impl Fn(&Element) -> bool) -> Option<Vec<usize>> {
        if pred(self) {
            return Some(Vec::new());
        }
        for (i, child) in self.children.iter().enumerate() {
            if let Node::Element(e) = child {
                if let Some(mut path) = e.find_path(pred) {
                    path.insert(0, i);
                    return Some(path);
                }
            }
        }
        None
    }

    /// Resolve a path produced by [`Element::find_path`].
    pub fn at_path(&self, path: &[usize]) -> Option<&Element> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self.children.get(*first)? {
            Node::Element(e) => e.at_path(rest),
            _ => None,
        }
    }

    /// Remove and return the node at a non-empty path.
    pub fn remove_at_path(&mut self, path: &[usize]) -> Option<Node> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for idx in parents {
            current = match current.children.get_mut(*idx)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        if *last < current.children.len() {
            Some(current.children.remove(*last))
        } else {
            None
        }
    }

    /// Find an element (self or descendant) carrying the given ID value
    /// in one of `id_attrs`.
    pub fn find_by_id(&self, id: &str, id_attrs: &[&str]) -> Option<&Element> {
        self.at_path(&self.id_path(id, id_attrs)?)
    }

    /// Path to the element carrying the given ID, as for [`Element::find_by_id`].
    pub fn id_path(&self, id: &str, id_attrs: &[&str]) -> Option<Vec<usize>> {
        self.find_path(&|e: &Element| id_attrs.iter().any(|attr| e.attribute(attr) == Some(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_and_lookup() {
        let root = Element::new("root")
            .with_attribute("a", "1")
            .with_child(Element::new_ns("urn:x", "child").with_text("hi"))
            .with_child(Element::new("other").with_attribute("Id", "me"));

        assert_eq!(root.attribute("a"), Some("1"));
        assert_eq!(root.find_child("urn:x", "child").map(|c| c.text()), Some("hi".into()));
        assert!(root.find_child("urn:y", "child").is_none());
        assert_eq!(root.find_by_id("me", &["Id"]).map(|e| e.name.as_str()), Some("other"));
        assert_eq!(root.id_path("me", &["Id"]), Some(vec![1]));
        assert_eq!(root.id_path("me", &["id"]), None);
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut e = Element::new("e");
        e.set_attribute("x", "1");
        e.set_attribute("x", "2");
        assert_eq!(e.attributes.len(), 1);
        assert_eq!(e.attribute("x"), Some("2"));
    }

    #[test]
    fn test_paths() {
        let mut root = Element::new("root")
            .with_text("t")
            .with_child(Element::new("a").with_child(Element::new("target")));

        let path = root.find_path(&|e: &Element| e.name == "target").unwrap();
        assert_eq!(path, vec![1, 0]);
        assert_eq!(root.at_path(&path).unwrap().name, "target");
        assert_eq!(root.find_path(&|e: &Element| e.name == "root"), Some(vec![]));

        let removed = root.remove_at_path(&path);
        assert!(matches!(removed, Some(Node::Element(e)) if e.name == "target"));
        assert!(root.find_path(&|e: &Element| e.name == "target").is_none());
        assert!(root.remove_at_path(&[]).is_none());
    }
}
