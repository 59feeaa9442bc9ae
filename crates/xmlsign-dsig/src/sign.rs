#![forbid(unsafe_code)]

//! XML-DSig signature creation.
//!
//! Signing is a one-way pipeline; each stage consumes the previous one:
//!
//! ```text
//! Initial → PayloadPrepared → DigestComputed → SignedInfoBuilt → Signed → Assembled
//! ```
//!
//! 1. validate the request, resolve the key, wrap a detached payload in `<Object>`
//! 2. canonicalize and digest the reference target (for enveloped
//!    signatures this is the document before `<Signature>` exists)
//! 3. build `<SignedInfo>` and canonicalize it
//! 4. sign the canonical `<SignedInfo>` bytes
//! 5. assemble `<Signature>` and splice it into the output tree

use crate::context::{Payload, SigningRequest};
use crate::reference::{self, Reference};
use base64::Engine;
use rand_core::CryptoRngCore;
use std::sync::Arc;
use tracing::{debug, instrument};
use xmlsign_c14n::{C14nMode, CanonicalForm};
use xmlsign_core::{ns, Error};
use xmlsign_crypto::{digest_base64_with, DigestMethod, HashFactory, KeyMaterial, SignatureAlgorithm};
use xmlsign_keys::KeyValue;
use xmlsign_xml::Element;

/// Settings carried through every stage.
struct Job {
    digest_method: DigestMethod,
    algorithm: SignatureAlgorithm,
    enveloped: bool,
    with_comments: bool,
    hash_factory: Option<Arc<dyn HashFactory>>,
    key: KeyMaterial,
}

pub struct Initial {
    request: SigningRequest,
}

pub struct PayloadPrepared {
    job: Job,
    /// The document (enveloped) or the `<Object>` wrapper (detached).
    target: Element,
}

pub struct DigestComputed {
    job: Job,
    target: Element,
    reference: Reference,
}

pub struct SignedInfoBuilt {
    job: Job,
    target: Element,
    signed_info: Element,
    canonical_signed_info: CanonicalForm,
}

pub struct Signed {
    job: Job,
    target: Element,
    signed_info: Element,
    signature_value: Vec<u8>,
}

pub struct Assembled {
    output: Element,
}

/// Single-use signature builder; the type parameter is the current stage.
pub struct SignatureAssembler<S> {
    state: S,
}

impl SignatureAssembler<Initial> {
    pub fn new(request: SigningRequest) -> Self {
        Self {
            state: Initial { request },
        }
    }

    /// Validate the request and set up the reference target.
    pub fn prepare_payload(self) -> Result<SignatureAssembler<PayloadPrepared>, Error> {
        let SigningRequest {
            payload,
            key,
            digest_method,
            signature_algorithm: algorithm,
            enveloped,
            with_comments,
            hash_factory,
        } = self.state.request;

        if enveloped && matches!(payload, Payload::Text(_)) {
            return Err(Error::InvalidInput(
                "enveloped signatures require an XML element payload".into(),
            ));
        }

        let key = key.resolve(algorithm.family())?;
        if !algorithm.accepts(&key) {
            return Err(Error::InvalidInput(format!(
                "{} cannot sign with a {} key",
                algorithm.name(),
                key.family()
            )));
        }
        if !key.is_private() {
            return Err(Error::InvalidInput(format!(
                "{} signing needs a private key",
                algorithm.family()
            )));
        }

        let target = match payload {
            Payload::Element(document) if enveloped => document,
            other => reference::wrap_in_object(other),
        };
        debug!(
            algorithm = algorithm.name(),
            digest = digest_method.name(),
            enveloped,
            with_comments,
            "payload prepared"
        );

        Ok(SignatureAssembler {
            state: PayloadPrepared {
                job: Job {
                    digest_method,
                    algorithm,
                    enveloped,
                    with_comments,
                    hash_factory,
                    key,
                },
                target,
            },
        })
    }
}

impl SignatureAssembler<PayloadPrepared> {
    /// Canonicalize and digest the reference target.
    pub fn compute_digest(self) -> Result<SignatureAssembler<DigestComputed>, Error> {
        let PayloadPrepared { job, target } = self.state;
        let canonical = xmlsign_c14n::canonicalize(&target, job.with_comments)?;
        let digest_value =
            digest_base64_with(canonical.as_bytes(), job.digest_method, job.hash_factory.as_deref());
        let reference = Reference::for_mode(job.enveloped, job.with_comments, job.digest_method, digest_value);
        debug!(uri = %reference.uri, canonical_len = canonical.len(), "reference digest computed");

        Ok(SignatureAssembler {
            state: DigestComputed {
                job,
                target,
                reference,
            },
        })
    }
}

impl SignatureAssembler<DigestComputed> {
    pub fn reference(&self) -> &Reference {
        &self.state.reference
    }

    /// Build `<SignedInfo>` and its canonical form.
    pub fn build_signed_info(self) -> Result<SignatureAssembler<SignedInfoBuilt>, Error> {
        let DigestComputed {
            job,
            target,
            reference,
        } = self.state;

        let c14n_mode = C14nMode::Exclusive;
        let signed_info = Element::new_ns(ns::DSIG, ns::node::SIGNED_INFO)
            .with_child(
                Element::new_ns(ns::DSIG, ns::node::CANONICALIZATION_METHOD)
                    .with_attribute(ns::attr::ALGORITHM, c14n_mode.uri()),
            )
            .with_child(
                Element::new_ns(ns::DSIG, ns::node::SIGNATURE_METHOD)
                    .with_attribute(ns::attr::ALGORITHM, job.algorithm.uri()),
            )
            .with_child(reference.to_element());
        let canonical_signed_info = xmlsign_c14n::canonicalize_mode(&signed_info, c14n_mode)?;
        debug!(len = canonical_signed_info.len(), "SignedInfo canonicalized");

        Ok(SignatureAssembler {
            state: SignedInfoBuilt {
                job,
                target,
                signed_info,
                canonical_signed_info,
            },
        })
    }
}

impl SignatureAssembler<SignedInfoBuilt> {
    pub fn canonical_signed_info(&self) -> &CanonicalForm {
        &self.state.canonical_signed_info
    }

    /// Sign the canonical `<SignedInfo>` bytes.
    pub fn sign(self, rng: &mut dyn CryptoRngCore) -> Result<SignatureAssembler<Signed>, Error> {
        let SignedInfoBuilt {
            job,
            target,
            signed_info,
            canonical_signed_info,
        } = self.state;
        let signature_value = job
            .algorithm
            .sign(&job.key, canonical_signed_info.as_bytes(), rng)?;
        debug!(algorithm = job.algorithm.name(), len = signature_value.len(), "SignedInfo signed");

        Ok(SignatureAssembler {
            state: Signed {
                job,
                target,
                signed_info,
                signature_value,
            },
        })
    }
}

impl SignatureAssembler<Signed> {
    /// Assemble `<Signature>` and place it in the output tree.
    pub fn assemble(self) -> SignatureAssembler<Assembled> {
        let Signed {
            job,
            mut target,
            signed_info,
            signature_value,
        } = self.state;

        let mut signature = Element::new_ns(ns::DSIG, ns::node::SIGNATURE);
        signature.declare_namespace(None, ns::DSIG);
        signature.push_child(signed_info);
        signature.push_child(
            Element::new_ns(ns::DSIG, ns::node::SIGNATURE_VALUE)
                .with_text(base64::engine::general_purpose::STANDARD.encode(&signature_value)),
        );
        if let Some(key_value) = KeyValue::from_key(&job.key) {
            signature.push_child(key_value.encode());
        }

        let output = if job.enveloped {
            target.push_child(signature);
            target
        } else {
            signature.push_child(target);
            signature
        };
        SignatureAssembler {
            state: Assembled { output },
        }
    }
}

impl SignatureAssembler<Assembled> {
    /// The signed document (enveloped) or the `<Signature>` element (detached).
    pub fn into_output(self) -> Element {
        self.state.output
    }
}

/// Run the whole signing pipeline.
#[instrument(skip_all, fields(algorithm = request.signature_algorithm.name()))]
pub fn sign(request: SigningRequest, rng: &mut dyn CryptoRngCore) -> Result<Element, Error> {
    let output = SignatureAssembler::new(request)
        .prepare_payload()?
        .compute_digest()?
        .build_signed_info()?
        .sign(rng)?
        .assemble()
        .into_output();
    Ok(output)
}

/// [`sign`] with the operating system's CSPRNG.
pub fn sign_with_os_rng(request: SigningRequest) -> Result<Element, Error> {
    sign(request, &mut rand::rngs::OsRng)
}
