#![forbid(unsafe_code)]

//! Conversion from a `roxmltree` document to an owned [`Element`] tree.

use crate::element::{Attribute, Element, NamespaceDecl, Node};
use xmlsign_core::{ns, Error};

/// Parse XML text and return the document element.
///
/// Comments and processing instructions outside the document element
/// are not retained.
pub fn parse_element(xml: &str) -> Result<Element, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, crate::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    Ok(convert(doc.root_element(), doc.input_text()))
}

fn convert(node: roxmltree::Node<'_, '_>, input: &str) -> Element {
    let mut elem = Element::new(node.tag_name().name());
    elem.namespace = node.tag_name().namespace().map(str::to_owned);
    elem.prefix = element_prefix(node, input);
    elem.namespace_decls = declared_namespaces(node);

    for attr in node.attributes() {
        let namespace = attr.namespace();
        let prefix = match namespace {
            Some(ns::XML) => Some("xml".to_owned()),
            Some(uri) => attribute_prefix(node, &attr, uri, input),
            None => None,
        };
        elem.attributes.push(Attribute {
            namespace: namespace.map(str::to_owned),
            prefix,
            name: attr.name().to_owned(),
            value: attr.value().to_owned(),
        });
    }

    for child in node.children() {
        match child.node_type() {
            roxmltree::NodeType::Element => elem.push_child(convert(child, input)),
            roxmltree::NodeType::Text => {
                if let Some(text) = child.text() {
                    elem.push_text(text);
                }
            }
            roxmltree::NodeType::Comment => {
                elem.push_node(Node::Comment(child.text().unwrap_or("").to_owned()));
            }
            roxmltree::NodeType::PI => {
                if let Some(pi) = child.pi() {
                    elem.push_node(Node::ProcessingInstruction {
                        target: pi.target.to_owned(),
                        data: pi.value.map(str::to_owned),
                    });
                }
            }
            roxmltree::NodeType::Root => {}
        }
    }
    elem
}

/// Recover the prefix of an element's tag from the source text.
///
/// roxmltree only exposes the resolved namespace, and a document may bind
/// the same URI to several prefixes, so the prefix is read from the start tag.
fn element_prefix(node: roxmltree::Node<'_, '_>, input: &str) -> Option<String> {
    let start = node.range().start;
    let tag = input.get(start + 1..)?;
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len());
    let (prefix, _) = tag[..end].split_once(':')?;
    Some(prefix.to_owned())
}

/// Recover the prefix of a qualified attribute from the source text.
///
/// Falls back to any non-default prefix bound to `uri` when the source
/// range is unavailable.
fn attribute_prefix(
    node: roxmltree::Node<'_, '_>,
    attr: &roxmltree::Attribute<'_, '_>,
    uri: &str,
    input: &str,
) -> Option<String> {
    if let Some((prefix, _)) = input.get(attr.range_qname()).and_then(|qname| qname.split_once(':')) {
        return Some(prefix.to_owned());
    }
    node.namespaces()
        .find(|n| n.uri() == uri && n.name().is_some())
        .and_then(|n| n.name())
        .map(str::to_owned)
}

/// Namespace bindings introduced on this element (not inherited unchanged).
fn declared_namespaces(node: roxmltree::Node<'_, '_>) -> Vec<NamespaceDecl> {
    let parent = node.parent_element();
    node.namespaces()
        .filter(|n| n.name() != Some("xml"))
        .filter(|n| {
            parent.map_or(true, |p| {
                !p.namespaces().any(|pn| pn.name() == n.name() && pn.uri() == n.uri())
            })
        })
        .map(|n| NamespaceDecl {
            prefix: n.name().map(str::to_owned),
            uri: n.uri().to_owned(),
        })
        .collect()
}
