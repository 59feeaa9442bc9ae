#![forbid(unsafe_code)]

//! Per-call configuration for signing and verification.

use std::sync::Arc;
use xmlsign_core::Error;
use xmlsign_crypto::{DigestMethod, HashFactory, SignatureAlgorithm};
use xmlsign_keys::KeyInput;
use xmlsign_xml::Element;

/// What gets signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// An XML element (required for enveloped signatures).
    Element(Element),
    /// Opaque text, carried as the text of the `Object` wrapper.
    Text(String),
}

impl From<Element> for Payload {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Everything one signing call needs.  Consumed by the signer.
///
/// Defaults: `sha1` digest, `dsa-sha1` signature, detached, comments
/// stripped, no hash factory.
pub struct SigningRequest {
    pub payload: Payload,
    pub key: KeyInput,
    pub digest_method: DigestMethod,
    pub signature_algorithm: SignatureAlgorithm,
    pub enveloped: bool,
    pub with_comments: bool,
    /// Replaces the hash implied by `digest_method` for the reference digest.
    pub hash_factory: Option<Arc<dyn HashFactory>>,
}

impl SigningRequest {
    pub fn new(payload: impl Into<Payload>, key: impl Into<KeyInput>) -> Self {
        Self {
            payload: payload.into(),
            key: key.into(),
            digest_method: DigestMethod::default(),
            signature_algorithm: SignatureAlgorithm::default(),
            enveloped: false,
            with_comments: false,
            hash_factory: None,
        }
    }

    pub fn with_digest_method(mut self, method: DigestMethod) -> Self {
        self.digest_method = method;
        self
    }

    /// Select the digest by short name (`"sha256"`).
    pub fn with_digest_name(self, name: &str) -> Result<Self, Error> {
        Ok(self.with_digest_method(DigestMethod::from_name(name)?))
    }

    pub fn with_signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.signature_algorithm = algorithm;
        self
    }

    /// Select the signature algorithm by short name (`"rsa-sha256"`).
    pub fn with_signature_name(self, name: &str) -> Result<Self, Error> {
        Ok(self.with_signature_algorithm(SignatureAlgorithm::from_name(name)?))
    }

    pub fn enveloped(mut self, enveloped: bool) -> Self {
        self.enveloped = enveloped;
        self
    }

    pub fn with_comments(mut self, with_comments: bool) -> Self {
        self.with_comments = with_comments;
        self
    }

    pub fn with_hash_factory(mut self, factory: Arc<dyn HashFactory>) -> Self {
        self.hash_factory = Some(factory);
        self
    }
}

/// Options for one verification call.
#[derive(Default)]
pub struct VerifyOptions {
    /// Key to verify with.  Always takes precedence over `KeyInfo`.
    pub key: Option<KeyInput>,
    /// Accept the public key embedded in `KeyInfo` when no key is supplied.
    /// Anyone can put a key there, so this is an explicit opt-in.
    pub trust_key_info: bool,
    /// Replaces the hash implied by `DigestMethod` for the reference digest.
    pub hash_factory: Option<Arc<dyn HashFactory>>,
}

impl VerifyOptions {
    /// Verify with a caller-supplied key.
    pub fn with_key(key: impl Into<KeyInput>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Verify with whatever public key the document's `KeyInfo` carries.
    pub fn trusting_key_info() -> Self {
        Self {
            trust_key_info: true,
            ..Self::default()
        }
    }

    pub fn with_hash_factory(mut self, factory: Arc<dyn HashFactory>) -> Self {
        self.hash_factory = Some(factory);
        self
    }
}
