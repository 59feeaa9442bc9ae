#![forbid(unsafe_code)]

//! Signature algorithm implementations (HMAC, RSA PKCS#1 v1.5, DSA).

use crate::digest::DigestMethod;
use digest::Digest;
use rand_core::CryptoRngCore;
use signature::SignatureEncoding;
use xmlsign_core::{algorithm, Error};

/// Signature algorithm family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Hmac,
    Rsa,
    Dsa,
}

impl std::fmt::Display for KeyFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Hmac => "HMAC",
            Self::Rsa => "RSA",
            Self::Dsa => "DSA",
        })
    }
}

/// Key material for signature operations.
#[derive(Clone)]
pub enum KeyMaterial {
    /// Shared secret.
    Hmac(Vec<u8>),
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    Dsa(dsa::SigningKey),
    DsaPublic(dsa::VerifyingKey),
}

impl KeyMaterial {
    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Hmac(_) => KeyFamily::Hmac,
            Self::Rsa(_) | Self::RsaPublic(_) => KeyFamily::Rsa,
            Self::Dsa(_) | Self::DsaPublic(_) => KeyFamily::Dsa,
        }
    }

    /// Whether this key can produce signatures (not just check them).
    pub fn is_private(&self) -> bool {
        matches!(self, Self::Hmac(_) | Self::Rsa(_) | Self::Dsa(_))
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Hmac(_) => "Hmac",
            Self::Rsa(_) => "Rsa",
            Self::RsaPublic(_) => "RsaPublic",
            Self::Dsa(_) => "Dsa",
            Self::DsaPublic(_) => "DsaPublic",
        };
        f.debug_tuple(kind).finish_non_exhaustive()
    }
}

/// Hashes usable with DSA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DsaHash {
    Sha1,
    Sha256,
}

impl DsaHash {
    pub fn digest_method(&self) -> DigestMethod {
        match self {
            Self::Sha1 => DigestMethod::Sha1,
            Self::Sha256 => DigestMethod::Sha256,
        }
    }
}

/// A supported `SignatureMethod`: family plus hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    Hmac(DigestMethod),
    Rsa(DigestMethod),
    Dsa(DsaHash),
}

impl Default for SignatureAlgorithm {
    fn default() -> Self {
        Self::Dsa(DsaHash::Sha1)
    }
}

impl SignatureAlgorithm {
    /// Look up a short name such as `"rsa-sha256"`.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        crate::registry::signature_by_name(name)
    }

    /// Look up a `SignatureMethod` URI.
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        crate::registry::signature_by_uri(uri)
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            Self::Hmac(_) => KeyFamily::Hmac,
            Self::Rsa(_) => KeyFamily::Rsa,
            Self::Dsa(_) => KeyFamily::Dsa,
        }
    }

    pub fn hash(&self) -> DigestMethod {
        match self {
            Self::Hmac(h) | Self::Rsa(h) => *h,
            Self::Dsa(h) => h.digest_method(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Hmac(DigestMethod::Sha1) => "hmac-sha1",
            Self::Hmac(DigestMethod::Sha224) => "hmac-sha224",
            Self::Hmac(DigestMethod::Sha256) => "hmac-sha256",
            Self::Hmac(DigestMethod::Sha384) => "hmac-sha384",
            Self::Hmac(DigestMethod::Sha512) => "hmac-sha512",
            Self::Rsa(DigestMethod::Sha1) => "rsa-sha1",
            Self::Rsa(DigestMethod::Sha224) => "rsa-sha224",
            Self::Rsa(DigestMethod::Sha256) => "rsa-sha256",
            Self::Rsa(DigestMethod::Sha384) => "rsa-sha384",
            Self::Rsa(DigestMethod::Sha512) => "rsa-sha512",
            Self::Dsa(DsaHash::Sha1) => "dsa-sha1",
            Self::Dsa(DsaHash::Sha256) => "dsa-sha256",
        }
    }

    pub fn uri(&self) -> &'static str {
        match self {
            Self::Hmac(DigestMethod::Sha1) => algorithm::HMAC_SHA1,
            Self::Hmac(DigestMethod::Sha224) => algorithm::HMAC_SHA224,
            Self::Hmac(DigestMethod::Sha256) => algorithm::HMAC_SHA256,
            Self::Hmac(DigestMethod::Sha384) => algorithm::HMAC_SHA384,
            Self::Hmac(DigestMethod::Sha512) => algorithm::HMAC_SHA512,
            Self::Rsa(DigestMethod::Sha1) => algorithm::RSA_SHA1,
            Self::Rsa(DigestMethod::Sha224) => algorithm::RSA_SHA224,
            Self::Rsa(DigestMethod::Sha256) => algorithm::RSA_SHA256,
            Self::Rsa(DigestMethod::Sha384) => algorithm::RSA_SHA384,
            Self::Rsa(DigestMethod::Sha512) => algorithm::RSA_SHA512,
            Self::Dsa(DsaHash::Sha1) => algorithm::DSA_SHA1,
            Self::Dsa(DsaHash::Sha256) => algorithm::DSA_SHA256,
        }
    }

    /// Whether `key` belongs to this algorithm's family.
    pub fn accepts(&self, key: &KeyMaterial) -> bool {
        self.family() == key.family()
    }

    /// Sign `data`.  `rng` supplies DSA's per-signature secret and RSA
    /// blinding; HMAC ignores it.
    pub fn sign(
        &self,
        key: &KeyMaterial,
        data: &[u8],
        rng: &mut dyn CryptoRngCore,
    ) -> Result<Vec<u8>, Error> {
        match (self, key) {
            (Self::Hmac(h), KeyMaterial::Hmac(secret)) => compute_hmac(*h, secret, data),
            (Self::Rsa(h), KeyMaterial::Rsa(private_key)) => rsa_sign(*h, private_key, data, rng),
            (Self::Dsa(h), KeyMaterial::Dsa(signing_key)) => dsa_sign(*h, signing_key, data, rng),
            _ => Err(Error::InvalidInput(format!(
                "{} requires a {} private key, got {:?}",
                self.name(),
                self.family(),
                key
            ))),
        }
    }

    /// Check `signature` over `data`.  `Ok(false)` means the signature is
    /// well-formed for this key but does not match.
    pub fn verify(&self, key: &KeyMaterial, data: &[u8], signature: &[u8]) -> Result<bool, Error> {
        match (self, key) {
            (Self::Hmac(h), KeyMaterial::Hmac(secret)) => verify_hmac(*h, secret, data, signature),
            (Self::Rsa(h), KeyMaterial::Rsa(private_key)) => {
                rsa_verify(*h, &private_key.to_public_key(), data, signature)
            }
            (Self::Rsa(h), KeyMaterial::RsaPublic(public_key)) => {
                rsa_verify(*h, public_key, data, signature)
            }
            (Self::Dsa(h), KeyMaterial::Dsa(signing_key)) => {
                dsa_verify(*h, signing_key.verifying_key(), data, signature)
            }
            (Self::Dsa(h), KeyMaterial::DsaPublic(verifying_key)) => {
                dsa_verify(*h, verifying_key, data, signature)
            }
            _ => Err(Error::InvalidInput(format!(
                "{} requires a {} key, got {:?}",
                self.name(),
                self.family(),
                key
            ))),
        }
    }
}

// ── HMAC ─────────────────────────────────────────────────────────────

fn compute_hmac(hash: DigestMethod, key: &[u8], data: &[u8]) -> Result<Vec<u8>, Error> {
    use hmac::{Hmac, Mac};
    macro_rules! hmac_compute {
        ($hasher:ty) => {{
            let mut mac = <Hmac<$hasher>>::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("HMAC key: {e}")))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }};
    }
    match hash {
        DigestMethod::Sha1 => hmac_compute!(sha1::Sha1),
        DigestMethod::Sha224 => hmac_compute!(sha2::Sha224),
        DigestMethod::Sha256 => hmac_compute!(sha2::Sha256),
        DigestMethod::Sha384 => hmac_compute!(sha2::Sha384),
        DigestMethod::Sha512 => hmac_compute!(sha2::Sha512),
    }
}

fn verify_hmac(hash: DigestMethod, key: &[u8], data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
    use hmac::{Hmac, Mac};
    // verify_slice compares in constant time.
    macro_rules! hmac_verify {
        ($hasher:ty) => {{
            let mut mac = <Hmac<$hasher>>::new_from_slice(key)
                .map_err(|e| Error::Crypto(format!("HMAC key: {e}")))?;
            mac.update(data);
            Ok(mac.verify_slice(sig_bytes).is_ok())
        }};
    }
    match hash {
        DigestMethod::Sha1 => hmac_verify!(sha1::Sha1),
        DigestMethod::Sha224 => hmac_verify!(sha2::Sha224),
        DigestMethod::Sha256 => hmac_verify!(sha2::Sha256),
        DigestMethod::Sha384 => hmac_verify!(sha2::Sha384),
        DigestMethod::Sha512 => hmac_verify!(sha2::Sha512),
    }
}

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

fn rsa_sign(
    hash: DigestMethod,
    private_key: &rsa::RsaPrivateKey,
    data: &[u8],
    mut rng: &mut dyn CryptoRngCore,
) -> Result<Vec<u8>, Error> {
    use signature::RandomizedSigner;
    macro_rules! do_sign {
        ($hasher:ty) => {{
            let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
            let sig = sk
                .try_sign_with_rng(&mut rng, data)
                .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
            Ok(sig.to_vec())
        }};
    }
    match hash {
        DigestMethod::Sha1 => do_sign!(sha1::Sha1),
        DigestMethod::Sha224 => do_sign!(sha2::Sha224),
        DigestMethod::Sha256 => do_sign!(sha2::Sha256),
        DigestMethod::Sha384 => do_sign!(sha2::Sha384),
        DigestMethod::Sha512 => do_sign!(sha2::Sha512),
    }
}

fn rsa_verify(
    hash: DigestMethod,
    public_key: &rsa::RsaPublicKey,
    data: &[u8],
    sig_bytes: &[u8],
) -> Result<bool, Error> {
    use signature::Verifier;
    let Ok(sig) = rsa::pkcs1v15::Signature::try_from(sig_bytes) else {
        return Ok(false);
    };
    macro_rules! do_verify {
        ($hasher:ty) => {{
            let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
            Ok(vk.verify(data, &sig).is_ok())
        }};
    }
    match hash {
        DigestMethod::Sha1 => do_verify!(sha1::Sha1),
        DigestMethod::Sha224 => do_verify!(sha2::Sha224),
        DigestMethod::Sha256 => do_verify!(sha2::Sha256),
        DigestMethod::Sha384 => do_verify!(sha2::Sha384),
        DigestMethod::Sha512 => do_verify!(sha2::Sha512),
    }
}

// ── DSA ──────────────────────────────────────────────────────────────
//
// XML-DSig encodes a DSA signature as r || s, each left-padded to the byte
// length of q.

fn dsa_component_len(key: &dsa::VerifyingKey) -> usize {
    (key.components().q().bits() + 7) / 8
}

fn dsa_sign(
    hash: DsaHash,
    signing_key: &dsa::SigningKey,
    data: &[u8],
    mut rng: &mut dyn CryptoRngCore,
) -> Result<Vec<u8>, Error> {
    use signature::RandomizedDigestSigner;
    macro_rules! do_sign {
        ($hasher:ty) => {{
            let sig: dsa::Signature = signing_key
                .try_sign_digest_with_rng(&mut rng, <$hasher>::new_with_prefix(data))
                .map_err(|e| Error::Crypto(format!("DSA signing failed: {e}")))?;
            sig
        }};
    }
    let sig = match hash {
        DsaHash::Sha1 => do_sign!(sha1::Sha1),
        DsaHash::Sha256 => do_sign!(sha2::Sha256),
    };

    let width = dsa_component_len(signing_key.verifying_key());
    let mut out = Vec::with_capacity(width * 2);
    for component in [sig.r(), sig.s()] {
        let bytes = component.to_bytes_be();
        if bytes.len() > width {
            return Err(Error::Crypto("DSA signature component wider than q".into()));
        }
        out.resize(out.len() + width - bytes.len(), 0);
        out.extend_from_slice(&bytes);
    }
    Ok(out)
}

fn dsa_verify(
    hash: DsaHash,
    verifying_key: &dsa::VerifyingKey,
    data: &[u8],
    sig_bytes: &[u8],
) -> Result<bool, Error> {
    use signature::DigestVerifier;
    let width = dsa_component_len(verifying_key);
    if sig_bytes.len() != width * 2 {
        return Ok(false);
    }
    let (r, s) = sig_bytes.split_at(width);
    let Ok(sig) = dsa::Signature::from_components(
        dsa::BigUint::from_bytes_be(r),
        dsa::BigUint::from_bytes_be(s),
    ) else {
        return Ok(false);
    };
    let valid = match hash {
        DsaHash::Sha1 => verifying_key.verify_digest(sha1::Sha1::new_with_prefix(data), &sig),
        DsaHash::Sha256 => verifying_key.verify_digest(sha2::Sha256::new_with_prefix(data), &sig),
    };
    Ok(valid.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkcs8::{DecodePrivateKey, DecodePublicKey};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const RSA_PEM: &str = include_str!("../../../testdata/rsa-1024.pem");
    const DSA_PEM: &str = include_str!("../../../testdata/dsa-2048.pem");
    const DSA_PUB_PEM: &str = include_str!("../../../testdata/dsa-2048-pub.pem");

    fn rsa_key() -> KeyMaterial {
        KeyMaterial::Rsa(rsa::RsaPrivateKey::from_pkcs8_pem(RSA_PEM).unwrap())
    }

    fn dsa_key() -> KeyMaterial {
        KeyMaterial::Dsa(dsa::SigningKey::from_pkcs8_pem(DSA_PEM).unwrap())
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_hmac_sha1_known_answer() {
        let key = KeyMaterial::Hmac(b"secret".to_vec());
        let alg = SignatureAlgorithm::Hmac(DigestMethod::Sha1);
        let sig = alg.sign(&key, b"hello", &mut rng()).unwrap();
        assert_eq!(hex::encode(&sig), "5112055c05f944f85755efc5cd8970e194e9f45b");
        assert!(alg.verify(&key, b"hello", &sig).unwrap());
        assert!(!alg.verify(&KeyMaterial::Hmac(b"wrong".to_vec()), b"hello", &sig).unwrap());
        assert!(!alg.verify(&key, b"hello", &sig[..10]).unwrap());
    }

    #[test]
    fn test_rsa_all_hashes() {
        let key = rsa_key();
        let public = match &key {
            KeyMaterial::Rsa(k) => KeyMaterial::RsaPublic(k.to_public_key()),
            _ => unreachable!(),
        };
        for hash in DigestMethod::ALL {
            let alg = SignatureAlgorithm::Rsa(hash);
            let sig = alg.sign(&key, b"data", &mut rng()).unwrap();
            assert_eq!(sig.len(), 128);
            assert!(alg.verify(&public, b"data", &sig).unwrap(), "{hash:?}");
            assert!(!alg.verify(&public, b"other", &sig).unwrap(), "{hash:?}");
        }
    }

    #[test]
    fn test_rsa_hash_is_bound_into_signature() {
        let key = rsa_key();
        let sig = SignatureAlgorithm::Rsa(DigestMethod::Sha256)
            .sign(&key, b"data", &mut rng())
            .unwrap();
        assert!(!SignatureAlgorithm::Rsa(DigestMethod::Sha512)
            .verify(&key, b"data", &sig)
            .unwrap());
    }

    #[test]
    fn test_dsa_fixed_width_and_randomized() {
        let key = dsa_key();
        let public = KeyMaterial::DsaPublic(dsa::VerifyingKey::from_public_key_pem(DSA_PUB_PEM).unwrap());
        let mut rng = rng();
        for hash in [DsaHash::Sha1, DsaHash::Sha256] {
            let alg = SignatureAlgorithm::Dsa(hash);
            let first = alg.sign(&key, b"data", &mut rng).unwrap();
            let second = alg.sign(&key, b"data", &mut rng).unwrap();
            // 256-bit q
            assert_eq!(first.len(), 64);
            assert_eq!(second.len(), 64);
            assert_ne!(first, second);
            assert!(alg.verify(&public, b"data", &first).unwrap());
            assert!(alg.verify(&public, b"data", &second).unwrap());
            assert!(!alg.verify(&public, b"tampered", &first).unwrap());
            assert!(!alg.verify(&public, b"data", &first[..63]).unwrap());
        }
    }

    #[test]
    fn test_family_mismatch() {
        let alg = SignatureAlgorithm::Rsa(DigestMethod::Sha256);
        let hmac = KeyMaterial::Hmac(b"k".to_vec());
        assert!(!alg.accepts(&hmac));
        assert!(alg.accepts(&rsa_key()));
        assert!(matches!(
            alg.sign(&hmac, b"data", &mut rng()),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            SignatureAlgorithm::Dsa(DsaHash::Sha1).sign(&rsa_key(), b"data", &mut rng()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_key_material_debug_hides_secrets() {
        let key = KeyMaterial::Hmac(b"topsecret".to_vec());
        let shown = format!("{key:?}");
        assert!(!shown.contains("topsecret"));
        assert!(shown.starts_with("Hmac"));
        assert!(key.is_private());
    }
}
