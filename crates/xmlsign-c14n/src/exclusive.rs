#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only "visibly utilized" namespace declarations are output.  A namespace
//! is visibly utilized if its prefix is used by the element's tag name or
//! by one of its attributes (the default namespace counts as the empty
//! prefix).  Because every node of the owned tree carries its resolved
//! namespace URI, the binding for a utilized prefix is read from the node
//! itself and no ancestor walk is needed.

use crate::render::{Attr, NsDecl};
use std::collections::BTreeMap;
use xmlsign_core::{ns, Error};
use xmlsign_xml::{escape, Element, Node};

/// Canonicalize an element subtree using Exclusive C14N 1.0.
pub fn canonicalize(element: &Element, with_comments: bool) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    process_element(element, with_comments, &mut output, &BTreeMap::new())?;
    Ok(output)
}

fn process_element(
    elem: &Element,
    with_comments: bool,
    output: &mut Vec<u8>,
    rendered_ns: &BTreeMap<String, String>,
) -> Result<(), Error> {
    let utilized = utilized_namespaces(elem)?;

    let mut ns_decls: Vec<NsDecl> = Vec::new();
    for (prefix, uri) in &utilized {
        let previously_rendered = rendered_ns.get(prefix).map(String::as_str).unwrap_or("");
        if previously_rendered != uri {
            ns_decls.push(NsDecl {
                prefix: prefix.clone(),
                uri: uri.clone(),
            });
        }
    }
    ns_decls.sort();

    let mut attrs: Vec<Attr<'_>> = elem
        .attributes
        .iter()
        .map(|a| Attr {
            ns_uri: a.namespace.as_deref().unwrap_or(""),
            local_name: &a.name,
            qualified_name: a.qualified_name(),
            value: &a.value,
        })
        .collect();
    attrs.sort();

    let elem_name = elem.qualified_name();

    output.push(b'<');
    output.extend_from_slice(elem_name.as_bytes());
    for decl in &ns_decls {
        decl.render_into(output);
    }
    for attr in &attrs {
        attr.render_into(output);
    }
    output.push(b'>');

    let mut child_rendered_ns = rendered_ns.clone();
    for decl in ns_decls {
        child_rendered_ns.insert(decl.prefix, decl.uri);
    }

    for child in &elem.children {
        match child {
            Node::Element(e) => process_element(e, with_comments, output, &child_rendered_ns)?,
            Node::Text(text) => output.extend_from_slice(escape::escape_text(text).as_bytes()),
            Node::Comment(text) => {
                if with_comments {
                    output.extend_from_slice(b"<!--");
                    output.extend_from_slice(text.as_bytes());
                    output.extend_from_slice(b"-->");
                }
            }
            Node::ProcessingInstruction { target, data } => {
                output.extend_from_slice(b"<?");
                output.extend_from_slice(target.as_bytes());
                if let Some(value) = data.as_deref().filter(|v| !v.is_empty()) {
                    output.push(b' ');
                    output.extend_from_slice(escape::escape_pi(value).as_bytes());
                }
                output.extend_from_slice(b"?>");
            }
        }
    }

    output.extend_from_slice(b"</");
    output.extend_from_slice(elem_name.as_bytes());
    output.push(b'>');
    Ok(())
}

/// Prefix → URI bindings visibly utilized by an element, validating the
/// element along the way.  The `xml` prefix is never declared.
fn utilized_namespaces(elem: &Element) -> Result<BTreeMap<String, String>, Error> {
    if elem.name.is_empty() {
        return Err(Error::Canonicalization("element with empty name".into()));
    }

    let mut utilized = BTreeMap::new();
    match (&elem.prefix, &elem.namespace) {
        (Some(prefix), None) => {
            return Err(Error::Canonicalization(format!(
                "element {prefix}:{} has a prefix but no namespace",
                elem.name
            )));
        }
        (prefix, namespace) => {
            utilized.insert(
                prefix.clone().unwrap_or_default(),
                namespace.clone().unwrap_or_default(),
            );
        }
    }

    for attr in &elem.attributes {
        if attr.name.is_empty() {
            return Err(Error::Canonicalization(format!(
                "attribute with empty name on {}",
                elem.name
            )));
        }
        let Some(uri) = &attr.namespace else {
            continue;
        };
        let Some(prefix) = attr.prefix.as_deref().filter(|p| !p.is_empty()) else {
            return Err(Error::Canonicalization(format!(
                "attribute {} is namespaced but has no prefix",
                attr.name
            )));
        };
        if prefix == "xml" || uri == ns::XML {
            continue;
        }
        match utilized.get(prefix) {
            Some(bound) if bound != uri => {
                return Err(Error::Canonicalization(format!(
                    "prefix {prefix} bound to both {bound} and {uri}"
                )));
            }
            Some(_) => {}
            None => {
                utilized.insert(prefix.to_owned(), uri.clone());
            }
        }
    }
    Ok(utilized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmlsign_xml::Attribute;

    fn c14n(xml: &str, with_comments: bool) -> String {
        let elem = Element::parse(xml).unwrap();
        String::from_utf8(canonicalize(&elem, with_comments).unwrap()).unwrap()
    }

    #[test]
    fn test_unused_namespaces_dropped() {
        assert_eq!(
            c14n(r#"<a:r xmlns:a="urn:a" xmlns:b="urn:b"><c/></a:r>"#, false),
            r#"<a:r xmlns:a="urn:a"><c></c></a:r>"#
        );
    }

    #[test]
    fn test_redundant_declaration_not_repeated() {
        assert_eq!(
            c14n(r#"<a:r xmlns:a="urn:a"><a:c xmlns:a="urn:a"/></a:r>"#, false),
            r#"<a:r xmlns:a="urn:a"><a:c></a:c></a:r>"#
        );
    }

    #[test]
    fn test_aliased_prefixes_kept_as_written() {
        assert_eq!(
            c14n(r#"<r xmlns:a="urn:same" xmlns:b="urn:same" b:x="1" a:y="2"/>"#, false),
            r#"<r xmlns:a="urn:same" xmlns:b="urn:same" b:x="1" a:y="2"></r>"#
        );
    }

    #[test]
    fn test_subtree_declares_utilized_namespaces() {
        let root = Element::parse(r#"<r xmlns="urn:d" xmlns:x="urn:x"><x:c attr="1"/></r>"#).unwrap();
        let child = root.child_elements().next().unwrap();
        let out = canonicalize(child, false).unwrap();
        assert_eq!(out, br#"<x:c xmlns:x="urn:x" attr="1"></x:c>"#);
    }

    #[test]
    fn test_attribute_and_namespace_ordering() {
        assert_eq!(
            c14n(r#"<e xmlns:y="urn:y" xmlns:x="urn:x" b="2" y:q="4" x:z="3" a="1"/>"#, false),
            r#"<e xmlns:x="urn:x" xmlns:y="urn:y" a="1" b="2" x:z="3" y:q="4"></e>"#
        );
    }

    #[test]
    fn test_default_namespace_undeclared() {
        assert_eq!(
            c14n(r#"<r xmlns="urn:d"><c xmlns=""/></r>"#, false),
            r#"<r xmlns="urn:d"><c xmlns=""></c></r>"#
        );
    }

    #[test]
    fn test_comments_and_pis() {
        let xml = "<r><!--note--><?pi  data?>x&amp;y</r>";
        assert_eq!(c14n(xml, false), "<r><?pi data?>x&amp;y</r>");
        assert_eq!(c14n(xml, true), "<r><!--note--><?pi data?>x&amp;y</r>");
    }

    #[test]
    fn test_object_wrapper_declares_dsig_namespace() {
        let object = Element::new_ns(ns::DSIG, "Object")
            .with_attribute("Id", "object")
            .with_text("hello");
        let out = canonicalize(&object, false).unwrap();
        assert_eq!(
            out,
            br#"<Object xmlns="http://www.w3.org/2000/09/xmldsig#" Id="object">hello</Object>"#
        );
    }

    #[test]
    fn test_input_not_mutated() {
        let elem = Element::parse(r#"<r xmlns:u="urn:u" b="1" a="2"/>"#).unwrap();
        let before = elem.clone();
        canonicalize(&elem, true).unwrap();
        assert_eq!(elem, before);
    }

    #[test]
    fn test_malformed_trees_rejected() {
        let mut prefixed = Element::new("e");
        prefixed.prefix = Some("p".into());
        assert!(matches!(canonicalize(&prefixed, false), Err(Error::Canonicalization(_))));

        let mut unprefixed_attr = Element::new("e");
        unprefixed_attr.attributes.push(Attribute {
            namespace: Some("urn:a".into()),
            prefix: None,
            name: "a".into(),
            value: "v".into(),
        });
        assert!(matches!(
            canonicalize(&unprefixed_attr, false),
            Err(Error::Canonicalization(_))
        ));

        assert!(matches!(
            canonicalize(&Element::new(""), false),
            Err(Error::Canonicalization(_))
        ));
    }
}
