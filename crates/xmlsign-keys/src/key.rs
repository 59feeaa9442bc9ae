#![forbid(unsafe_code)]

//! Key input accepted by signing and verification.

use crate::loader;
use xmlsign_core::Error;
use xmlsign_crypto::{KeyFamily, KeyMaterial};

/// A key as supplied by the caller: ready key material, or PEM text to be
/// imported for the family the algorithm needs.
#[derive(Clone)]
pub enum KeyInput {
    Material(KeyMaterial),
    Pem {
        pem: String,
        passphrase: Option<String>,
    },
}

impl KeyInput {
    /// PEM text without a passphrase.
    pub fn pem(pem: impl Into<String>) -> Self {
        Self::Pem {
            pem: pem.into(),
            passphrase: None,
        }
    }

    /// Passphrase-protected PEM text.
    pub fn encrypted_pem(pem: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self::Pem {
            pem: pem.into(),
            passphrase: Some(passphrase.into()),
        }
    }

    /// Resolve to key material of the given family.
    pub fn resolve(&self, family: KeyFamily) -> Result<KeyMaterial, Error> {
        match self {
            Self::Material(key) => Ok(key.clone()),
            Self::Pem { pem, passphrase } => loader::import_pem(pem, passphrase.as_deref(), family),
        }
    }

    /// The family this key actually belongs to, or `None` when it cannot
    /// be imported at all.
    pub fn detect_family(&self) -> Option<KeyFamily> {
        match self {
            Self::Material(key) => Some(key.family()),
            Self::Pem { .. } => [KeyFamily::Rsa, KeyFamily::Dsa]
                .into_iter()
                .find(|&family| self.resolve(family).is_ok()),
        }
    }
}

impl From<KeyMaterial> for KeyInput {
    fn from(key: KeyMaterial) -> Self {
        Self::Material(key)
    }
}

impl std::fmt::Debug for KeyInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Material(key) => f.debug_tuple("Material").field(key).finish(),
            Self::Pem { passphrase, .. } => f
                .debug_struct("Pem")
                .field("encrypted", &passphrase.is_some())
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_resolves_as_is() {
        let input = KeyInput::from(KeyMaterial::Hmac(b"k".to_vec()));
        let key = input.resolve(KeyFamily::Hmac).unwrap();
        assert!(matches!(key, KeyMaterial::Hmac(k) if k == b"k"));
    }

    #[test]
    fn test_detect_family() {
        let rsa = KeyInput::pem(include_str!("../../../testdata/rsa-1024-pub.pem"));
        let dsa = KeyInput::pem(include_str!("../../../testdata/dsa-2048.pem"));
        let encrypted = KeyInput::encrypted_pem(include_str!("../../../testdata/rsa-1024-enc.pem"), "secret123");
        assert_eq!(rsa.detect_family(), Some(KeyFamily::Rsa));
        assert_eq!(dsa.detect_family(), Some(KeyFamily::Dsa));
        assert_eq!(encrypted.detect_family(), Some(KeyFamily::Rsa));
        assert_eq!(KeyInput::pem("garbage").detect_family(), None);
        assert_eq!(
            KeyInput::from(KeyMaterial::Hmac(b"k".to_vec())).detect_family(),
            Some(KeyFamily::Hmac)
        );
    }

    #[test]
    fn test_debug_hides_passphrase() {
        let input = KeyInput::encrypted_pem("-----BEGIN X-----", "hunter2");
        let shown = format!("{input:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("encrypted: true"));
    }
}
