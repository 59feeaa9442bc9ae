#![forbid(unsafe_code)]

//! The fixed table of supported signature algorithms.
//!
//! Identifiers are only ever matched against this table, by short name or
//! by URI; nothing outside it is accepted.

use crate::digest::DigestMethod;
use crate::sign::{DsaHash, SignatureAlgorithm};
use xmlsign_core::Error;

/// Every supported (family, hash) pair.
pub const SIGNATURE_ALGORITHMS: [SignatureAlgorithm; 12] = [
    SignatureAlgorithm::Hmac(DigestMethod::Sha1),
    SignatureAlgorithm::Hmac(DigestMethod::Sha224),
    SignatureAlgorithm::Hmac(DigestMethod::Sha256),
    SignatureAlgorithm::Hmac(DigestMethod::Sha384),
    SignatureAlgorithm::Hmac(DigestMethod::Sha512),
    SignatureAlgorithm::Rsa(DigestMethod::Sha1),
    SignatureAlgorithm::Rsa(DigestMethod::Sha224),
    SignatureAlgorithm::Rsa(DigestMethod::Sha256),
    SignatureAlgorithm::Rsa(DigestMethod::Sha384),
    SignatureAlgorithm::Rsa(DigestMethod::Sha512),
    SignatureAlgorithm::Dsa(DsaHash::Sha1),
    SignatureAlgorithm::Dsa(DsaHash::Sha256),
];

/// Look up a signature algorithm by short name (`"rsa-sha256"`).
pub fn signature_by_name(name: &str) -> Result<SignatureAlgorithm, Error> {
    SIGNATURE_ALGORITHMS
        .into_iter()
        .find(|alg| alg.name() == name)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("signature algorithm: {name}")))
}

/// Look up a signature algorithm by `SignatureMethod` URI.
pub fn signature_by_uri(uri: &str) -> Result<SignatureAlgorithm, Error> {
    SIGNATURE_ALGORITHMS
        .into_iter()
        .find(|alg| alg.uri() == uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use xmlsign_core::algorithm;

    #[test]
    fn test_names_and_uris_are_unique() {
        let names: HashSet<_> = SIGNATURE_ALGORITHMS.iter().map(|a| a.name()).collect();
        let uris: HashSet<_> = SIGNATURE_ALGORITHMS.iter().map(|a| a.uri()).collect();
        assert_eq!(names.len(), SIGNATURE_ALGORITHMS.len());
        assert_eq!(uris.len(), SIGNATURE_ALGORITHMS.len());
    }

    #[test]
    fn test_round_trip_every_entry() {
        for alg in SIGNATURE_ALGORITHMS {
            assert_eq!(signature_by_name(alg.name()).unwrap(), alg);
            assert_eq!(signature_by_uri(alg.uri()).unwrap(), alg);
        }
    }

    #[test]
    fn test_known_identifiers() {
        assert_eq!(
            signature_by_name("rsa-sha256").unwrap().uri(),
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"
        );
        assert_eq!(
            signature_by_uri(algorithm::DSA_SHA1).unwrap(),
            SignatureAlgorithm::default()
        );
    }

    #[test]
    fn test_unsupported() {
        for name in ["ecdsa-sha256", "dsa-sha512", "rsa-md5", "RSA-SHA1", ""] {
            assert!(
                matches!(signature_by_name(name), Err(Error::UnsupportedAlgorithm(_))),
                "{name}"
            );
        }
        assert!(matches!(
            signature_by_uri("http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256"),
            Err(Error::UnsupportedAlgorithm(_))
        ));
    }
}
