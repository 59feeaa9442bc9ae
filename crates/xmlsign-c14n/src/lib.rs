#![forbid(unsafe_code)]

//! XML Canonicalization for the xmlsign library.
//!
//! Implements Exclusive Canonical XML 1.0, with and without comments, over
//! the owned [`Element`] tree from `xmlsign-xml`.

pub mod exclusive;
pub mod render;

use xmlsign_core::{algorithm, Error};
use xmlsign_xml::Element;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum C14nMode {
    /// Exclusive Canonical XML 1.0
    Exclusive,
    /// Exclusive Canonical XML 1.0 with comments
    ExclusiveWithComments,
}

impl C14nMode {
    /// Select the mode for a comment-handling choice.
    pub fn new(with_comments: bool) -> Self {
        if with_comments {
            Self::ExclusiveWithComments
        } else {
            Self::Exclusive
        }
    }

    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Exclusive => algorithm::EXC_C14N,
            Self::ExclusiveWithComments => algorithm::EXC_C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        match uri {
            algorithm::EXC_C14N => Ok(Self::Exclusive),
            algorithm::EXC_C14N_WITH_COMMENTS => Ok(Self::ExclusiveWithComments),
            other => Err(Error::UnsupportedAlgorithm(format!(
                "canonicalization method {other}"
            ))),
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::ExclusiveWithComments)
    }
}

/// Canonical bytes of a subtree.  Created once, never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm(Vec<u8>);

impl CanonicalForm {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for CanonicalForm {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Canonicalize an element subtree with Exclusive C14N.
pub fn canonicalize(element: &Element, with_comments: bool) -> Result<CanonicalForm, Error> {
    exclusive::canonicalize(element, with_comments).map(CanonicalForm)
}

/// Canonicalize an element subtree in the given mode.
pub fn canonicalize_mode(element: &Element, mode: C14nMode) -> Result<CanonicalForm, Error> {
    canonicalize(element, mode.with_comments())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_uri_round_trip() {
        for mode in [C14nMode::Exclusive, C14nMode::ExclusiveWithComments] {
            assert_eq!(C14nMode::from_uri(mode.uri()).unwrap(), mode);
        }
        assert_eq!(C14nMode::new(true), C14nMode::ExclusiveWithComments);
        assert!(!C14nMode::new(false).with_comments());
    }

    #[test]
    fn test_inclusive_c14n_unsupported() {
        let err = C14nMode::from_uri("http://www.w3.org/2006/12/xml-c14n11").unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }

    #[test]
    fn test_canonical_form_accessors() {
        let form = canonicalize(&Element::new("a"), false).unwrap();
        assert_eq!(form.as_bytes(), b"<a></a>");
        assert_eq!(form.len(), 7);
        assert!(!form.is_empty());
        assert_eq!(form.into_bytes(), b"<a></a>".to_vec());
    }
}
