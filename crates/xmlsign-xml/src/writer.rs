#![forbid(unsafe_code)]

//! Serialization of an [`Element`] tree to XML text.
//!
//! Explicit declarations are written as stored.  When an element or
//! attribute is in a namespace whose prefix is not bound to that URI in
//! the current scope, the writer adds the missing declaration, so trees
//! assembled from parts (a payload moved under a `Signature`, say) always
//! serialize to well-formed, namespace-correct XML.

use crate::element::{Element, Node};
use crate::escape;
use std::collections::BTreeMap;

/// Serialize an element (without an XML declaration).
pub fn write_element(elem: &Element) -> String {
    let mut out = String::new();
    write_into(elem, &BTreeMap::new(), &mut out);
    out
}

fn write_into(elem: &Element, parent_scope: &BTreeMap<String, String>, out: &mut String) {
    let mut scope = parent_scope.clone();
    let qname = elem.qualified_name();

    out.push('<');
    out.push_str(&qname);

    for decl in &elem.namespace_decls {
        let key = decl.prefix.clone().unwrap_or_default();
        push_decl(out, &key, &decl.uri);
        scope.insert(key, decl.uri.clone());
    }

    let elem_key = elem.prefix.clone().unwrap_or_default();
    let elem_uri = elem.namespace.clone().unwrap_or_default();
    if bound(&scope, &elem_key) != elem_uri {
        push_decl(out, &elem_key, &elem_uri);
        scope.insert(elem_key, elem_uri);
    }

    for attr in &elem.attributes {
        let (Some(prefix), Some(uri)) = (&attr.prefix, &attr.namespace) else {
            continue;
        };
        if prefix == "xml" {
            continue;
        }
        if bound(&scope, prefix) != uri.as_str() {
            push_decl(out, prefix, uri);
            scope.insert(prefix.clone(), uri.clone());
        }
    }

    for attr in &elem.attributes {
        out.push(' ');
        out.push_str(&attr.qualified_name());
        out.push_str("=\"");
        out.push_str(&escape::escape_attr(&attr.value));
        out.push('"');
    }

    if elem.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    for child in &elem.children {
        match child {
            Node::Element(e) => write_into(e, &scope, out),
            Node::Text(t) => out.push_str(&escape::escape_text(t)),
            Node::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            Node::ProcessingInstruction { target, data } => {
                out.push_str("<?");
                out.push_str(target);
                if let Some(d) = data.as_deref().filter(|d| !d.is_empty()) {
                    out.push(' ');
                    out.push_str(d);
                }
                out.push_str("?>");
            }
        }
    }

    out.push_str("</");
    out.push_str(&qname);
    out.push('>');
}

fn bound<'a>(scope: &'a BTreeMap<String, String>, prefix: &str) -> &'a str {
    scope.get(prefix).map(String::as_str).unwrap_or("")
}

fn push_decl(out: &mut String, prefix: &str, uri: &str) {
    if prefix.is_empty() {
        out.push_str(" xmlns=\"");
    } else {
        out.push_str(" xmlns:");
        out.push_str(prefix);
        out.push_str("=\"");
    }
    out.push_str(&escape::escape_attr(uri));
    out.push('"');
}
