#![forbid(unsafe_code)]

//! XML tree abstraction for the xmlsign library.
//!
//! Provides an owned, mutable element tree.  Documents are parsed with
//! `roxmltree` and converted into [`Element`] values, which the signer can
//! then extend (append a `Signature`, wrap a payload in an `Object`) and
//! serialize back to text.

pub mod element;
pub mod escape;
pub mod parse;
pub mod writer;

pub use element::{Attribute, Element, NamespaceDecl, Node};

/// Return roxmltree parsing options that allow DTD.
///
/// roxmltree does not expand external entities, so internal DTD subsets
/// are safe to accept.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}
