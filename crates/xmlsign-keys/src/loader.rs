#![forbid(unsafe_code)]

//! PEM key import.
//!
//! Supported encodings:
//! - `PRIVATE KEY` (PKCS#8): RSA and DSA
//! - `ENCRYPTED PRIVATE KEY` (PKCS#8 / PBES2): RSA and DSA
//! - `RSA PRIVATE KEY` (PKCS#1)
//! - `PUBLIC KEY` (SPKI): RSA and DSA, for verification
//! - `RSA PUBLIC KEY` (PKCS#1)

use pkcs8::der::Decode;
use pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use xmlsign_core::Error;
use xmlsign_crypto::{KeyFamily, KeyMaterial};

/// Import a PEM-encoded key of the given family.
///
/// An encrypted key without a passphrase is an `InvalidInput` error; a
/// malformed key, a key of another family or a wrong passphrase is a
/// `KeyImport` error.
pub fn import_pem(pem: &str, passphrase: Option<&str>, family: KeyFamily) -> Result<KeyMaterial, Error> {
    if family == KeyFamily::Hmac {
        return hmac_not_pem();
    }

    let label = pem_rfc7468::decode_label(pem.as_bytes())
        .map_err(|e| Error::KeyImport(format!("invalid PEM: {e}")))?;

    match label {
        "ENCRYPTED PRIVATE KEY" => {
            let passphrase = passphrase.ok_or_else(|| {
                Error::InvalidInput("encrypted private key requires a passphrase".into())
            })?;
            let der = decode_pem(pem)?;
            let encrypted = pkcs8::EncryptedPrivateKeyInfo::from_der(&der)
                .map_err(|e| Error::KeyImport(format!("invalid encrypted PKCS#8: {e}")))?;
            let decrypted = encrypted
                .decrypt(passphrase)
                .map_err(|e| Error::KeyImport(format!("cannot decrypt private key: {e}")))?;
            private_from_pkcs8_der(decrypted.as_bytes(), family)
        }
        "PRIVATE KEY" => private_from_pkcs8_der(&decode_pem(pem)?, family),
        "RSA PRIVATE KEY" => {
            expect_family(family, KeyFamily::Rsa, label)?;
            rsa::RsaPrivateKey::from_pkcs1_pem(pem)
                .map(KeyMaterial::Rsa)
                .map_err(|e| Error::KeyImport(format!("invalid PKCS#1 RSA private key: {e}")))
        }
        "PUBLIC KEY" => {
            let der = decode_pem(pem)?;
            match family {
                KeyFamily::Rsa => rsa::RsaPublicKey::from_public_key_der(&der)
                    .map(KeyMaterial::RsaPublic)
                    .map_err(|e| Error::KeyImport(format!("not an RSA public key: {e}"))),
                KeyFamily::Dsa => dsa::VerifyingKey::from_public_key_der(&der)
                    .map(KeyMaterial::DsaPublic)
                    .map_err(|e| Error::KeyImport(format!("not a DSA public key: {e}"))),
                KeyFamily::Hmac => hmac_not_pem(),
            }
        }
        "RSA PUBLIC KEY" => {
            expect_family(family, KeyFamily::Rsa, label)?;
            rsa::RsaPublicKey::from_pkcs1_pem(pem)
                .map(KeyMaterial::RsaPublic)
                .map_err(|e| Error::KeyImport(format!("invalid PKCS#1 RSA public key: {e}")))
        }
        other => Err(Error::KeyImport(format!("unsupported PEM label: {other}"))),
    }
}

fn decode_pem(pem: &str) -> Result<Vec<u8>, Error> {
    pem_rfc7468::decode_vec(pem.as_bytes())
        .map(|(_label, der)| der)
        .map_err(|e| Error::KeyImport(format!("invalid PEM: {e}")))
}

fn private_from_pkcs8_der(der: &[u8], family: KeyFamily) -> Result<KeyMaterial, Error> {
    match family {
        KeyFamily::Rsa => rsa::RsaPrivateKey::from_pkcs8_der(der)
            .map(KeyMaterial::Rsa)
            .map_err(|e| Error::KeyImport(format!("not an RSA private key: {e}"))),
        KeyFamily::Dsa => dsa::SigningKey::from_pkcs8_der(der)
            .map(KeyMaterial::Dsa)
            .map_err(|e| Error::KeyImport(format!("not a DSA private key: {e}"))),
        KeyFamily::Hmac => hmac_not_pem(),
    }
}

fn expect_family(requested: KeyFamily, found: KeyFamily, label: &str) -> Result<(), Error> {
    if requested == found {
        Ok(())
    } else {
        Err(Error::KeyImport(format!(
            "{label} cannot be used as a {requested} key"
        )))
    }
}

fn hmac_not_pem() -> Result<KeyMaterial, Error> {
    Err(Error::InvalidInput("HMAC keys are raw shared secrets, not PEM".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_PEM: &str = include_str!("../../../testdata/rsa-1024.pem");
    const RSA_PKCS1_PEM: &str = include_str!("../../../testdata/rsa-1024-pkcs1.pem");
    const RSA_PUB_PEM: &str = include_str!("../../../testdata/rsa-1024-pub.pem");
    const RSA_ENC_PEM: &str = include_str!("../../../testdata/rsa-1024-enc.pem");
    const DSA_PEM: &str = include_str!("../../../testdata/dsa-2048.pem");
    const DSA_PUB_PEM: &str = include_str!("../../../testdata/dsa-2048-pub.pem");

    fn rsa_public(key: &KeyMaterial) -> rsa::RsaPublicKey {
        match key {
            KeyMaterial::Rsa(k) => k.to_public_key(),
            KeyMaterial::RsaPublic(k) => k.clone(),
            other => panic!("expected RSA key, got {other:?}"),
        }
    }

    #[test]
    fn test_rsa_encodings_agree() {
        let pkcs8 = import_pem(RSA_PEM, None, KeyFamily::Rsa).unwrap();
        let pkcs1 = import_pem(RSA_PKCS1_PEM, None, KeyFamily::Rsa).unwrap();
        let spki = import_pem(RSA_PUB_PEM, None, KeyFamily::Rsa).unwrap();
        assert!(pkcs8.is_private());
        assert!(!spki.is_private());
        assert_eq!(rsa_public(&pkcs8), rsa_public(&pkcs1));
        assert_eq!(rsa_public(&pkcs8), rsa_public(&spki));
    }

    #[test]
    fn test_encrypted_pkcs8() {
        let key = import_pem(RSA_ENC_PEM, Some("secret123"), KeyFamily::Rsa).unwrap();
        let plain = import_pem(RSA_PEM, None, KeyFamily::Rsa).unwrap();
        assert_eq!(rsa_public(&key), rsa_public(&plain));
    }

    #[test]
    fn test_encrypted_without_passphrase_is_invalid_input() {
        assert!(matches!(
            import_pem(RSA_ENC_PEM, None, KeyFamily::Rsa),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wrong_passphrase_is_key_import() {
        assert!(matches!(
            import_pem(RSA_ENC_PEM, Some("nope"), KeyFamily::Rsa),
            Err(Error::KeyImport(_))
        ));
    }

    #[test]
    fn test_dsa_keys() {
        let private = import_pem(DSA_PEM, None, KeyFamily::Dsa).unwrap();
        let public = import_pem(DSA_PUB_PEM, None, KeyFamily::Dsa).unwrap();
        match (private, public) {
            (KeyMaterial::Dsa(sk), KeyMaterial::DsaPublic(vk)) => {
                assert_eq!(sk.verifying_key(), &vk);
            }
            other => panic!("unexpected keys {other:?}"),
        }
    }

    #[test]
    fn test_family_mismatch_and_garbage() {
        assert!(matches!(
            import_pem(RSA_PEM, None, KeyFamily::Dsa),
            Err(Error::KeyImport(_))
        ));
        assert!(matches!(
            import_pem(RSA_PKCS1_PEM, None, KeyFamily::Dsa),
            Err(Error::KeyImport(_))
        ));
        assert!(matches!(
            import_pem("not a key", None, KeyFamily::Rsa),
            Err(Error::KeyImport(_))
        ));
        assert!(matches!(
            import_pem(RSA_PEM, None, KeyFamily::Hmac),
            Err(Error::InvalidInput(_))
        ));
    }
}
