#![forbid(unsafe_code)]

//! Sorted namespace and attribute nodes for C14N output.

use std::cmp::Ordering;
use xmlsign_xml::escape;

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    /// The namespace URI ("" undeclares the default namespace).
    pub uri: String,
}

impl NsDecl {
    pub fn render_into(&self, out: &mut Vec<u8>) {
        if self.prefix.is_empty() {
            out.extend_from_slice(b" xmlns=\"");
        } else {
            out.extend_from_slice(b" xmlns:");
            out.extend_from_slice(self.prefix.as_bytes());
            out.extend_from_slice(b"=\"");
        }
        out.extend_from_slice(escape::escape_attr(&self.uri).as_bytes());
        out.push(b'"');
    }
}

impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        // Default namespace first, then by prefix.
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr<'a> {
    /// Namespace URI ("" for no namespace).
    pub ns_uri: &'a str,
    pub local_name: &'a str,
    pub qualified_name: String,
    pub value: &'a str,
}

impl Attr<'_> {
    pub fn render_into(&self, out: &mut Vec<u8>) {
        out.push(b' ');
        out.extend_from_slice(self.qualified_name.as_bytes());
        out.extend_from_slice(b"=\"");
        out.extend_from_slice(escape::escape_attr(self.value).as_bytes());
        out.push(b'"');
    }
}

impl Ord for Attr<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Unqualified attributes first (by local name), then by
        // (namespace URI, local name).
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(other.local_name),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(other.ns_uri)
                .then(self.local_name.cmp(other.local_name)),
        }
    }
}

impl PartialOrd for Attr<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(prefix: &str) -> NsDecl {
        NsDecl {
            prefix: prefix.into(),
            uri: "urn:x".into(),
        }
    }

    #[test]
    fn test_ns_decl_order() {
        let mut decls = vec![decl("b"), decl(""), decl("a")];
        decls.sort();
        let prefixes: Vec<_> = decls.iter().map(|d| d.prefix.as_str()).collect();
        assert_eq!(prefixes, ["", "a", "b"]);
    }

    #[test]
    fn test_attr_order() {
        let attr = |ns_uri, local_name| Attr {
            ns_uri,
            local_name,
            qualified_name: local_name.to_owned(),
            value: "",
        };
        let mut attrs = vec![attr("urn:b", "a"), attr("", "z"), attr("urn:a", "z"), attr("", "a")];
        attrs.sort();
        let order: Vec<_> = attrs.iter().map(|a| (a.ns_uri, a.local_name)).collect();
        assert_eq!(order, [("", "a"), ("", "z"), ("urn:a", "z"), ("urn:b", "a")]);
    }

    #[test]
    fn test_render_escapes() {
        let mut out = Vec::new();
        NsDecl { prefix: String::new(), uri: String::new() }.render_into(&mut out);
        Attr { ns_uri: "", local_name: "v", qualified_name: "v".into(), value: "a\"b" }
            .render_into(&mut out);
        assert_eq!(out, b" xmlns=\"\" v=\"a&quot;b\"");
    }
}
