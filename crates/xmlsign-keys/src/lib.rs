#![forbid(unsafe_code)]

//! Key handling for the xmlsign library.
//!
//! Provides the `KeyInfo`/`KeyValue` codec for RSA and DSA public keys and
//! import of PEM-encoded keys (PKCS#1, PKCS#8, encrypted PKCS#8, SPKI).

pub mod key;
pub mod keyinfo;
pub mod loader;

pub use key::KeyInput;
pub use keyinfo::KeyValue;
pub use loader::import_pem;
pub use xmlsign_crypto::{KeyFamily, KeyMaterial};
