#![forbid(unsafe_code)]

//! XML Digital Signatures over exclusively canonicalized XML.
//!
//! ```no_run
//! use xmlsign::{dsig, KeyMaterial, SignatureAlgorithm, DigestMethod};
//!
//! let key = KeyMaterial::Hmac(b"secret".to_vec());
//! let request = dsig::SigningRequest::new("hello", key.clone())
//!     .with_signature_algorithm(SignatureAlgorithm::Hmac(DigestMethod::Sha256));
//! let signature = dsig::sign_with_os_rng(request)?;
//! dsig::verify_element(&signature, &dsig::VerifyOptions::with_key(key))?;
//! # Ok::<(), xmlsign::Error>(())
//! ```

pub use xmlsign_c14n as c14n;
pub use xmlsign_core as core;
pub use xmlsign_crypto as crypto;
pub use xmlsign_dsig as dsig;
pub use xmlsign_keys as keys;
pub use xmlsign_xml as xml;

pub use xmlsign_core::{Error, InvalidSignature, Result};
pub use xmlsign_crypto::{DigestMethod, DsaHash, KeyFamily, KeyMaterial, SignatureAlgorithm};
pub use xmlsign_dsig::{sign, sign_with_os_rng, verify, verify_element};
pub use xmlsign_dsig::{KeySource, Payload, SigningRequest, VerifiedSignature, VerifyOptions};
pub use xmlsign_keys::{KeyInput, KeyValue};
pub use xmlsign_xml::Element;
