#![forbid(unsafe_code)]

//! XML Digital Signature (XML-DSig) creation and verification.
//!
//! Signing runs a one-way pipeline, [`sign::SignatureAssembler`], from a
//! [`SigningRequest`] to a `Signature` element.  Verification is the
//! mirror image and ends in a [`VerifiedSignature`] or a rejection.

pub mod context;
pub mod reference;
pub mod sign;
pub mod verify;

pub use context::{Payload, SigningRequest, VerifyOptions};
pub use reference::{Reference, Transform};
pub use sign::{sign, sign_with_os_rng, SignatureAssembler};
pub use verify::{verify, verify_element, KeySource, VerifiedSignature};
