#![forbid(unsafe_code)]

//! The `<Reference>` element and its URI and transform rules.
//!
//! | mode      | comments | URI                          | transforms                         |
//! |-----------|----------|------------------------------|------------------------------------|
//! | enveloped | no       | `""`                         | enveloped-signature, exc-c14n      |
//! | enveloped | yes      | `#xpointer(/)`               | enveloped-signature, exc-c14n#WC   |
//! | detached  | no       | `#object`                    | exc-c14n                           |
//! | detached  | yes      | `#xpointer(id('object'))`    | exc-c14n#WC                        |
//!
//! Dereferencing an empty or bare-name URI strips comments, so signatures
//! that cover comments must use the XPointer forms.

use crate::context::Payload;
use xmlsign_c14n::{C14nMode, CanonicalForm};
use xmlsign_core::{algorithm, ns, Error};
use xmlsign_crypto::{digest::digest_with, DigestMethod, HashFactory};
use xmlsign_xml::Element;

/// A transform listed under `<Transforms>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    EnvelopedSignature,
    Canonicalize(C14nMode),
}

impl Transform {
    pub fn uri(&self) -> &'static str {
        match self {
            Self::EnvelopedSignature => algorithm::ENVELOPED_SIGNATURE,
            Self::Canonicalize(mode) => mode.uri(),
        }
    }

    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        if uri == algorithm::ENVELOPED_SIGNATURE {
            return Ok(Self::EnvelopedSignature);
        }
        C14nMode::from_uri(uri)
            .map(Self::Canonicalize)
            .map_err(|_| Error::UnsupportedAlgorithm(format!("transform: {uri}")))
    }
}

/// What a reference URI points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// The document element (`""` or `#xpointer(/)`).
    Document,
    /// The element carrying this ID (`#id` or `#xpointer(id('id'))`).
    Id(String),
}

/// A parsed reference URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceUri {
    pub target: ReferenceTarget,
    /// XPointer forms keep comments; empty and bare-name URIs drop them.
    pub xpointer: bool,
}

impl ReferenceUri {
    pub fn parse(uri: &str) -> Result<Self, Error> {
        if uri.is_empty() {
            return Ok(Self { target: ReferenceTarget::Document, xpointer: false });
        }
        let Some(fragment) = uri.strip_prefix('#') else {
            return Err(Error::structure(format!("unresolvable reference URI: {uri}")));
        };
        if fragment == "xpointer(/)" {
            return Ok(Self { target: ReferenceTarget::Document, xpointer: true });
        }
        if let Some(inner) = fragment
            .strip_prefix("xpointer(id(")
            .and_then(|s| s.strip_suffix("))"))
        {
            let id = inner
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
                .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
                .filter(|id| !id.is_empty())
                .ok_or_else(|| Error::structure(format!("malformed XPointer: {uri}")))?;
            return Ok(Self { target: ReferenceTarget::Id(id.to_owned()), xpointer: true });
        }
        if fragment.is_empty() || fragment.contains(['(', ')', '/']) {
            return Err(Error::structure(format!("unresolvable reference URI: {uri}")));
        }
        Ok(Self { target: ReferenceTarget::Id(fragment.to_owned()), xpointer: false })
    }
}

/// A `<Reference>`: URI, transforms, digest method and base64 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub uri: String,
    pub transforms: Vec<Transform>,
    pub digest_method: DigestMethod,
    pub digest_value: String,
}

impl Reference {
    /// The reference a signer emits for the given mode.
    pub fn for_mode(
        enveloped: bool,
        with_comments: bool,
        digest_method: DigestMethod,
        digest_value: String,
    ) -> Self {
        let uri = match (enveloped, with_comments) {
            (true, false) => String::new(),
            (true, true) => "#xpointer(/)".to_owned(),
            (false, false) => format!("#{}", ns::OBJECT_ID),
            (false, true) => format!("#xpointer(id('{}'))", ns::OBJECT_ID),
        };
        let mut transforms = Vec::with_capacity(2);
        if enveloped {
            transforms.push(Transform::EnvelopedSignature);
        }
        transforms.push(Transform::Canonicalize(C14nMode::new(with_comments)));
        Self {
            uri,
            transforms,
            digest_method,
            digest_value,
        }
    }

    pub fn is_enveloped(&self) -> bool {
        self.transforms.contains(&Transform::EnvelopedSignature)
    }

    /// The canonicalization applied to the dereferenced element; exclusive
    /// without comments when no canonicalization transform is listed.
    pub fn c14n_mode(&self) -> C14nMode {
        self.transforms
            .iter()
            .rev()
            .find_map(|t| match t {
                Transform::Canonicalize(mode) => Some(*mode),
                Transform::EnvelopedSignature => None,
            })
            .unwrap_or(C14nMode::Exclusive)
    }

    pub fn to_element(&self) -> Element {
        let mut reference = Element::new_ns(ns::DSIG, ns::node::REFERENCE);
        reference.set_attribute(ns::attr::URI, self.uri.clone());
        if !self.transforms.is_empty() {
            let mut transforms = Element::new_ns(ns::DSIG, ns::node::TRANSFORMS);
            for transform in &self.transforms {
                transforms.push_child(
                    Element::new_ns(ns::DSIG, ns::node::TRANSFORM)
                        .with_attribute(ns::attr::ALGORITHM, transform.uri()),
                );
            }
            reference.push_child(transforms);
        }
        reference.push_child(
            Element::new_ns(ns::DSIG, ns::node::DIGEST_METHOD)
                .with_attribute(ns::attr::ALGORITHM, self.digest_method.uri()),
        );
        reference.push_child(
            Element::new_ns(ns::DSIG, ns::node::DIGEST_VALUE).with_text(self.digest_value.clone()),
        );
        reference
    }

    pub fn from_element(elem: &Element) -> Result<Self, Error> {
        let uri = elem
            .attribute(ns::attr::URI)
            .ok_or_else(|| Error::structure("Reference has no URI"))?;

        let mut transforms = Vec::new();
        if let Some(list) = elem.find_child(ns::DSIG, ns::node::TRANSFORMS) {
            for transform in list.find_children(ns::DSIG, ns::node::TRANSFORM) {
                let algorithm = transform
                    .attribute(ns::attr::ALGORITHM)
                    .ok_or_else(|| Error::structure("Transform has no Algorithm"))?;
                transforms.push(Transform::from_uri(algorithm)?);
            }
        }

        let digest_uri = elem
            .find_child(ns::DSIG, ns::node::DIGEST_METHOD)
            .ok_or_else(|| Error::structure("Reference has no DigestMethod"))?
            .attribute(ns::attr::ALGORITHM)
            .ok_or_else(|| Error::structure("DigestMethod has no Algorithm"))?;
        let digest_method = DigestMethod::from_uri(digest_uri)?;

        let digest_value = elem
            .find_child(ns::DSIG, ns::node::DIGEST_VALUE)
            .ok_or_else(|| Error::structure("Reference has no DigestValue"))?
            .text();

        Ok(Self {
            uri: uri.to_owned(),
            transforms,
            digest_method,
            digest_value: digest_value.trim().to_owned(),
        })
    }
}

/// Wrap a detached payload in `<Object Id="object">`.
pub fn wrap_in_object(payload: Payload) -> Element {
    let object = Element::new_ns(ns::DSIG, ns::node::OBJECT).with_attribute(ns::attr::ID, ns::OBJECT_ID);
    match payload {
        Payload::Element(element) => object.with_child(element),
        Payload::Text(text) => object.with_text(text),
    }
}

/// Canonicalize a dereferenced element and digest it.
pub fn digest_target(
    target: &Element,
    with_comments: bool,
    method: DigestMethod,
    factory: Option<&dyn HashFactory>,
) -> Result<(CanonicalForm, Vec<u8>), Error> {
    let canonical = xmlsign_c14n::canonicalize(target, with_comments)?;
    let digest = digest_with(canonical.as_bytes(), method, factory);
    Ok((canonical, digest))
}
