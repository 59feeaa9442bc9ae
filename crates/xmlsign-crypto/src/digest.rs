#![forbid(unsafe_code)]

//! Digest (hash) algorithm implementations.

use base64::Engine;
use digest::Digest;
use xmlsign_core::{algorithm, Error};

/// Incremental hasher.
pub trait Hasher: Send {
    /// Feed data into the hash.
    fn update(&mut self, data: &[u8]);
    /// Finalize and return the hash value.
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// Produces fresh hashers.  When supplied to a signing request or to the
/// verifier, it replaces the hash implied by `DigestMethod` for the
/// reference digest.
pub trait HashFactory: Send + Sync {
    fn create(&self) -> Box<dyn Hasher>;
}

impl<F> HashFactory for F
where
    F: Fn() -> Box<dyn Hasher> + Send + Sync,
{
    fn create(&self) -> Box<dyn Hasher> {
        self()
    }
}

/// Supported `DigestMethod` algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DigestMethod {
    /// Legacy 160-bit hash; the default for compatibility with older signers.
    #[default]
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestMethod {
    pub const ALL: [DigestMethod; 5] = [
        DigestMethod::Sha1,
        DigestMethod::Sha224,
        DigestMethod::Sha256,
        DigestMethod::Sha384,
        DigestMethod::Sha512,
    ];

    /// Short name (`"sha256"`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Algorithm URI.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Sha1 => algorithm::SHA1,
            Self::Sha224 => algorithm::SHA224,
            Self::Sha256 => algorithm::SHA256,
            Self::Sha384 => algorithm::SHA384,
            Self::Sha512 => algorithm::SHA512,
        }
    }

    pub fn from_name(name: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest algorithm: {name}")))
    }

    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|m| m.uri() == uri)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("digest algorithm: {uri}")))
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// A fresh hasher for this method.
    pub fn hasher(&self) -> Box<dyn Hasher> {
        match self {
            Self::Sha1 => Box::new(Sha1Hasher::new()),
            Self::Sha224 => Box::new(Sha224Hasher::new()),
            Self::Sha256 => Box::new(Sha256Hasher::new()),
            Self::Sha384 => Box::new(Sha384Hasher::new()),
            Self::Sha512 => Box::new(Sha512Hasher::new()),
        }
    }
}

/// Compute a digest in one shot.
pub fn digest(data: &[u8], method: DigestMethod) -> Vec<u8> {
    digest_with(data, method, None)
}

/// Compute a digest, letting `factory` override the method's own hash.
pub fn digest_with(data: &[u8], method: DigestMethod, factory: Option<&dyn HashFactory>) -> Vec<u8> {
    let mut hasher = match factory {
        Some(f) => f.create(),
        None => method.hasher(),
    };
    hasher.update(data);
    hasher.finalize()
}

/// Digest and base64-encode, as written into `DigestValue`.
pub fn digest_base64(data: &[u8], method: DigestMethod) -> String {
    digest_base64_with(data, method, None)
}

/// [`digest_base64`] with an optional replacement hash.
pub fn digest_base64_with(data: &[u8], method: DigestMethod, factory: Option<&dyn HashFactory>) -> String {
    base64::engine::general_purpose::STANDARD.encode(digest_with(data, method, factory))
}

// ── Concrete implementations ─────────────────────────────────────────

macro_rules! impl_digest {
    ($name:ident, $hasher:ty) => {
        #[derive(Default)]
        pub struct $name {
            inner: $hasher,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    inner: <$hasher>::new(),
                }
            }
        }

        impl Hasher for $name {
            fn update(&mut self, data: &[u8]) {
                Digest::update(&mut self.inner, data);
            }

            fn finalize(self: Box<Self>) -> Vec<u8> {
                Digest::finalize(self.inner).to_vec()
            }
        }
    };
}

impl_digest!(Sha1Hasher, sha1::Sha1);
impl_digest!(Sha224Hasher, sha2::Sha224);
impl_digest!(Sha256Hasher, sha2::Sha256);
impl_digest!(Sha384Hasher, sha2::Sha384);
impl_digest!(Sha512Hasher, sha2::Sha512);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1() {
        let result = digest(b"hello", DigestMethod::Sha1);
        assert_eq!(hex::encode(result), "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
    }

    #[test]
    fn test_sha256() {
        let result = digest(b"hello", DigestMethod::Sha256);
        assert_eq!(
            hex::encode(result),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_output_lengths() {
        for method in DigestMethod::ALL {
            assert_eq!(digest(b"hello", method).len(), method.output_len(), "{method:?}");
        }
    }

    #[test]
    fn test_base64() {
        assert_eq!(
            digest_base64(b"hello", DigestMethod::Sha1),
            "qvTGHdzF6KLavt4PO0gs2a6pQ00="
        );
    }

    #[test]
    fn test_base64_with_factory() {
        let sha256 = || Box::new(Sha256Hasher::new()) as Box<dyn Hasher>;
        assert_eq!(
            digest_base64_with(b"hello", DigestMethod::Sha1, Some(&sha256)),
            "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ="
        );
        assert_eq!(
            digest_base64_with(b"hello", DigestMethod::Sha1, None),
            digest_base64(b"hello", DigestMethod::Sha1)
        );
    }

    #[test]
    fn test_name_and_uri_lookup() {
        for method in DigestMethod::ALL {
            assert_eq!(DigestMethod::from_name(method.name()).unwrap(), method);
            assert_eq!(DigestMethod::from_uri(method.uri()).unwrap(), method);
        }
        assert_eq!(DigestMethod::default(), DigestMethod::Sha1);
        assert!(matches!(
            DigestMethod::from_name("md5"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_hash_factory_overrides_method() {
        let factory = || -> Box<dyn Hasher> { Box::new(Sha256Hasher::new()) };
        let overridden = digest_with(b"hello", DigestMethod::Sha1, Some(&factory));
        assert_eq!(overridden, digest(b"hello", DigestMethod::Sha256));
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hasher = DigestMethod::Sha384.hasher();
        hasher.update(b"hel");
        hasher.update(b"lo");
        assert_eq!(hasher.finalize(), digest(b"hello", DigestMethod::Sha384));
    }
}
