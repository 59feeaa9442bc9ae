#![forbid(unsafe_code)]

//! Cryptographic algorithms for the xmlsign library: reference digests
//! and the HMAC, RSA and DSA signature families.

pub mod digest;
pub mod registry;
pub mod sign;

pub use self::digest::{digest, digest_base64, digest_base64_with, DigestMethod, HashFactory, Hasher};
pub use self::sign::{DsaHash, KeyFamily, KeyMaterial, SignatureAlgorithm};
