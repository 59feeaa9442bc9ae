#![forbid(unsafe_code)]

//! `<KeyInfo>` encoding and decoding.
//!
//! Public keys travel as `KeyInfo/KeyValue/RSAKeyValue` (Modulus, Exponent)
//! or `KeyInfo/KeyValue/DSAKeyValue` (P, Q, G, Y).  Each integer is the
//! minimal unsigned big-endian encoding, base64 in the document.

use base64::Engine;
use rsa::traits::PublicKeyParts;
use xmlsign_core::{ns, Error};
use xmlsign_crypto::{KeyFamily, KeyMaterial};
use xmlsign_xml::Element;

/// Public key material carried in `<KeyValue>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    Rsa {
        modulus: Vec<u8>,
        exponent: Vec<u8>,
    },
    Dsa {
        p: Vec<u8>,
        q: Vec<u8>,
        g: Vec<u8>,
        y: Vec<u8>,
    },
}

impl KeyValue {
    /// Extract the public part of a key.  HMAC secrets have none.
    pub fn from_key(key: &KeyMaterial) -> Option<Self> {
        match key {
            KeyMaterial::Hmac(_) => None,
            KeyMaterial::Rsa(private_key) => Some(Self::from_rsa(&private_key.to_public_key())),
            KeyMaterial::RsaPublic(public_key) => Some(Self::from_rsa(public_key)),
            KeyMaterial::Dsa(signing_key) => Some(Self::from_dsa(signing_key.verifying_key())),
            KeyMaterial::DsaPublic(verifying_key) => Some(Self::from_dsa(verifying_key)),
        }
    }

    fn from_rsa(key: &rsa::RsaPublicKey) -> Self {
        Self::Rsa {
            modulus: key.n().to_bytes_be(),
            exponent: key.e().to_bytes_be(),
        }
    }

    fn from_dsa(key: &dsa::VerifyingKey) -> Self {
        let components = key.components();
        Self::Dsa {
            p: components.p().to_bytes_be(),
            q: components.q().to_bytes_be(),
            g: components.g().to_bytes_be(),
            y: key.y().to_bytes_be(),
        }
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Rsa { .. } => KeyFamily::Rsa,
            Self::Dsa { .. } => KeyFamily::Dsa,
        }
    }

    /// Rebuild a public key usable for verification.
    pub fn to_verification_key(&self) -> Result<KeyMaterial, Error> {
        match self {
            Self::Rsa { modulus, exponent } => {
                let n = rsa::BigUint::from_bytes_be(modulus);
                let e = rsa::BigUint::from_bytes_be(exponent);
                let public = rsa::RsaPublicKey::new(n, e)
                    .map_err(|err| Error::KeyImport(format!("invalid RSA public key: {err}")))?;
                Ok(KeyMaterial::RsaPublic(public))
            }
            Self::Dsa { p, q, g, y } => {
                let components = dsa::Components::from_components(
                    dsa::BigUint::from_bytes_be(p),
                    dsa::BigUint::from_bytes_be(q),
                    dsa::BigUint::from_bytes_be(g),
                )
                .map_err(|e| Error::KeyImport(format!("invalid DSA components: {e}")))?;
                let vk = dsa::VerifyingKey::from_components(components, dsa::BigUint::from_bytes_be(y))
                    .map_err(|e| Error::KeyImport(format!("invalid DSA public key: {e}")))?;
                Ok(KeyMaterial::DsaPublic(vk))
            }
        }
    }

    /// Build the `<KeyInfo>` element.
    pub fn encode(&self) -> Element {
        encode(self)
    }

    /// Read a `<KeyInfo>` element.
    pub fn decode(key_info: &Element) -> Result<Self, Error> {
        decode(key_info)
    }
}

/// Build `<KeyInfo><KeyValue>…</KeyValue></KeyInfo>` in the XML-DSig namespace.
pub fn encode(value: &KeyValue) -> Element {
    let inner = match value {
        KeyValue::Rsa { modulus, exponent } => Element::new_ns(ns::DSIG, ns::node::RSA_KEY_VALUE)
            .with_child(binary_element(ns::node::RSA_MODULUS, modulus))
            .with_child(binary_element(ns::node::RSA_EXPONENT, exponent)),
        KeyValue::Dsa { p, q, g, y } => Element::new_ns(ns::DSIG, ns::node::DSA_KEY_VALUE)
            .with_child(binary_element(ns::node::DSA_P, p))
            .with_child(binary_element(ns::node::DSA_Q, q))
            .with_child(binary_element(ns::node::DSA_G, g))
            .with_child(binary_element(ns::node::DSA_Y, y)),
    };
    Element::new_ns(ns::DSIG, ns::node::KEY_INFO)
        .with_child(Element::new_ns(ns::DSIG, ns::node::KEY_VALUE).with_child(inner))
}

fn binary_element(name: &str, bytes: &[u8]) -> Element {
    let engine = base64::engine::general_purpose::STANDARD;
    Element::new_ns(ns::DSIG, name).with_text(engine.encode(bytes))
}

/// Read the key value from a `<KeyInfo>` element.
pub fn decode(key_info: &Element) -> Result<KeyValue, Error> {
    if !key_info.is(ns::DSIG, ns::node::KEY_INFO) {
        return Err(Error::structure(format!("expected KeyInfo, found {}", key_info.name)));
    }
    let key_value = key_info
        .find_child(ns::DSIG, ns::node::KEY_VALUE)
        .ok_or_else(|| Error::structure("KeyInfo has no KeyValue"))?;

    if let Some(rsa_kv) = key_value.find_child(ns::DSIG, ns::node::RSA_KEY_VALUE) {
        return Ok(KeyValue::Rsa {
            modulus: decode_binary(rsa_kv, ns::node::RSA_MODULUS)?,
            exponent: decode_binary(rsa_kv, ns::node::RSA_EXPONENT)?,
        });
    }
    if let Some(dsa_kv) = key_value.find_child(ns::DSIG, ns::node::DSA_KEY_VALUE) {
        return Ok(KeyValue::Dsa {
            p: decode_binary(dsa_kv, ns::node::DSA_P)?,
            q: decode_binary(dsa_kv, ns::node::DSA_Q)?,
            g: decode_binary(dsa_kv, ns::node::DSA_G)?,
            y: decode_binary(dsa_kv, ns::node::DSA_Y)?,
        });
    }
    Err(Error::structure("KeyValue has neither RSAKeyValue nor DSAKeyValue"))
}

/// Decode a base64 CryptoBinary child, normalizing leading zero bytes.
fn decode_binary(parent: &Element, name: &str) -> Result<Vec<u8>, Error> {
    let elem = parent
        .find_child(ns::DSIG, name)
        .ok_or_else(|| Error::structure(format!("{} has no {name}", parent.name)))?;
    let clean: String = elem.text().chars().filter(|c| !c.is_whitespace()).collect();
    if clean.is_empty() {
        return Err(Error::structure(format!("{name} is empty")));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&clean)
        .map_err(|e| Error::structure(format!("{name}: invalid base64: {e}")))?;
    Ok(strip_leading_zeros(bytes))
}

fn strip_leading_zeros(bytes: Vec<u8>) -> Vec<u8> {
    match bytes.iter().position(|&b| b != 0) {
        Some(0) => bytes,
        Some(start) => bytes[start..].to_vec(),
        None => vec![0],
    }
}
