#![forbid(unsafe_code)]

/// Why a signature was rejected during verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSignature {
    /// The recomputed reference digest differs from `DigestValue`.
    #[error("digest mismatch")]
    DigestMismatch,

    /// `SignatureValue` does not verify against the canonical `SignedInfo`.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The `Signature` element is missing pieces or cannot be interpreted.
    #[error("malformed signature: {0}")]
    Structure(String),
}

/// Errors produced by the xmlsign library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("key import error: {0}")]
    KeyImport(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] InvalidSignature),
}

impl Error {
    /// Shorthand for a structural verification failure.
    pub fn structure(msg: impl Into<String>) -> Self {
        Error::InvalidSignature(InvalidSignature::Structure(msg.into()))
    }

    /// The rejection kind, if this error is a verification failure.
    pub fn rejection(&self) -> Option<&InvalidSignature> {
        match self {
            Error::InvalidSignature(kind) => Some(kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
