#![forbid(unsafe_code)]

//! XML-DSig signature verification.
//!
//! Processing order:
//! 1. Locate `<Signature>` and read `<SignedInfo>`: CanonicalizationMethod,
//!    SignatureMethod and exactly one `<Reference>`
//! 2. Dereference the URI, remove the `<Signature>` under verification
//!    (enveloped-signature transform), canonicalize, digest and compare
//!    with `<DigestValue>`
//! 3. Canonicalize `<SignedInfo>`
//! 4. Choose the key: the caller's, else `<KeyInfo>` when trusted
//! 5. Check `<SignatureValue>`

use crate::context::VerifyOptions;
use crate::reference::{self, Reference, ReferenceTarget, ReferenceUri};
use base64::Engine;
use tracing::{debug, instrument, warn};
use xmlsign_c14n::{C14nMode, CanonicalForm};
use xmlsign_core::{ns, Error, InvalidSignature};
use xmlsign_crypto::{DigestMethod, KeyFamily, KeyMaterial, SignatureAlgorithm};
use xmlsign_keys::KeyValue;
use xmlsign_xml::{Element, Node};

/// Where the verification key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Supplied by the caller.
    Supplied,
    /// Taken from the document's `<KeyInfo>`.
    KeyInfo,
}

/// A signature that verified, with what it covers.
#[derive(Debug, Clone)]
pub struct VerifiedSignature {
    pub signature_algorithm: SignatureAlgorithm,
    pub digest_method: DigestMethod,
    pub reference_uri: String,
    pub key_source: KeySource,
    /// The canonical bytes the reference digest covers.
    pub digested: CanonicalForm,
}

/// Parse `xml` and verify its `<Signature>` (see [`verify_element`]).
pub fn verify(xml: &str, options: &VerifyOptions) -> Result<VerifiedSignature, Error> {
    let document = Element::parse(xml)?;
    verify_element(&document, options)
}

/// Verify a `<Signature>` in an already parsed document.
///
/// The signature checked is the document element itself (detached), else
/// the last `<Signature>` child of the document element (enveloped), else
/// the first `<Signature>` deeper in document order.  Signatures inside
/// the signed content are payload and are not checked.
#[instrument(skip_all)]
pub fn verify_element(document: &Element, options: &VerifyOptions) -> Result<VerifiedSignature, Error> {
    let signature_path = locate_signature(document).ok_or_else(|| Error::structure("no Signature element"))?;
    let signature = document
        .at_path(&signature_path)
        .ok_or_else(|| Error::structure("no Signature element"))?;

    let signed_info = signature
        .find_child(ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::structure("Signature has no SignedInfo"))?;
    let c14n_mode = C14nMode::from_uri(algorithm_of(signed_info, ns::node::CANONICALIZATION_METHOD)?)?;
    let algorithm = SignatureAlgorithm::from_uri(algorithm_of(signed_info, ns::node::SIGNATURE_METHOD)?)?;

    let mut references = signed_info.find_children(ns::DSIG, ns::node::REFERENCE);
    let reference = match (references.next(), references.next()) {
        (Some(only), None) => Reference::from_element(only)?,
        (None, _) => return Err(Error::structure("SignedInfo has no Reference")),
        (Some(_), Some(_)) => return Err(Error::structure("SignedInfo has more than one Reference")),
    };
    debug!(
        algorithm = algorithm.name(),
        digest = reference.digest_method.name(),
        uri = %reference.uri,
        "SignedInfo read"
    );

    let digested = check_reference(document, &signature_path, &reference, options)?;

    let canonical_signed_info = xmlsign_c14n::canonicalize_mode(signed_info, c14n_mode)?;

    let (key, key_source) = select_key(signature, algorithm, options)?;
    if !algorithm.accepts(&key) {
        debug!(key = %key.family(), "key does not fit the signature method");
        return Err(InvalidSignature::SignatureMismatch.into());
    }

    let signature_value = signature
        .find_child(ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::structure("Signature has no SignatureValue"))?;
    let signature_bytes = decode_base64(&signature_value.text(), ns::node::SIGNATURE_VALUE)?;

    if !algorithm.verify(&key, canonical_signed_info.as_bytes(), &signature_bytes)? {
        debug!("SignatureValue does not verify");
        return Err(InvalidSignature::SignatureMismatch.into());
    }
    debug!(?key_source, "signature verified");

    Ok(VerifiedSignature {
        signature_algorithm: algorithm,
        digest_method: reference.digest_method,
        reference_uri: reference.uri,
        key_source,
        digested,
    })
}

fn locate_signature(document: &Element) -> Option<Vec<usize>> {
    let is_signature = |e: &Element| e.is(ns::DSIG, ns::node::SIGNATURE);
    if is_signature(document) {
        return Some(Vec::new());
    }
    let last_child = document
        .children
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, node)| match node {
            Node::Element(e) if is_signature(e) => Some(vec![i]),
            _ => None,
        });
    last_child.or_else(|| document.find_path(&is_signature))
}

/// Dereference, transform, canonicalize and digest; compare with `<DigestValue>`.
///
/// `signature_path` locates the `<Signature>` being verified within
/// `document`; the enveloped-signature transform removes exactly that node.
fn check_reference(
    document: &Element,
    signature_path: &[usize],
    reference: &Reference,
    options: &VerifyOptions,
) -> Result<CanonicalForm, Error> {
    let uri = ReferenceUri::parse(&reference.uri)?;
    let (target_path, mut target) = match &uri.target {
        ReferenceTarget::Document => (Vec::new(), document.clone()),
        ReferenceTarget::Id(id) => {
            let path = document
                .id_path(id, &ns::attr::ID_ATTRS)
                .ok_or_else(|| Error::structure(format!("no element with ID {id:?}")))?;
            let target = document
                .at_path(&path)
                .cloned()
                .ok_or_else(|| Error::structure(format!("no element with ID {id:?}")))?;
            (path, target)
        }
    };

    if reference.is_enveloped() {
        match signature_path.strip_prefix(target_path.as_slice()) {
            Some([]) => {
                return Err(Error::structure("enveloped reference points at the Signature itself"));
            }
            Some(relative) => {
                target.remove_at_path(relative);
            }
            // The Signature lies outside the referenced element.
            None => {}
        }
    }

    // Dereferencing "" or "#id" drops comments even when the transform keeps them.
    let with_comments = uri.xpointer && reference.c14n_mode().with_comments();
    let (canonical, digest) = reference::digest_target(
        &target,
        with_comments,
        reference.digest_method,
        options.hash_factory.as_deref(),
    )?;

    let expected = decode_base64(&reference.digest_value, ns::node::DIGEST_VALUE)?;
    if digest != expected {
        debug!(canonical_len = canonical.len(), "reference digest mismatch");
        return Err(InvalidSignature::DigestMismatch.into());
    }
    debug!(canonical_len = canonical.len(), with_comments, "reference digest matches");
    Ok(canonical)
}

fn select_key(
    signature: &Element,
    algorithm: SignatureAlgorithm,
    options: &VerifyOptions,
) -> Result<(KeyMaterial, KeySource), Error> {
    if let Some(input) = &options.key {
        return match input.resolve(algorithm.family()) {
            Ok(key) => Ok((key, KeySource::Supplied)),
            // A key of another family cannot satisfy the declared method.
            Err(err) => match input.detect_family() {
                Some(family) if family != algorithm.family() => {
                    debug!(key = %family, "key does not fit the signature method");
                    Err(InvalidSignature::SignatureMismatch.into())
                }
                _ => Err(err),
            },
        };
    }
    if algorithm.family() == KeyFamily::Hmac {
        return Err(Error::InvalidInput(format!(
            "{} needs the shared secret",
            algorithm.name()
        )));
    }
    if !options.trust_key_info {
        return Err(Error::InvalidInput(
            "no verification key given and KeyInfo is not trusted".into(),
        ));
    }

    let key_info = signature
        .find_child(ns::DSIG, ns::node::KEY_INFO)
        .ok_or_else(|| Error::structure("Signature has no KeyInfo"))?;
    let key = KeyValue::decode(key_info)?.to_verification_key()?;
    warn!(key = %key.family(), "verifying with the key embedded in KeyInfo");
    Ok((key, KeySource::KeyInfo))
}

fn algorithm_of<'a>(signed_info: &'a Element, name: &str) -> Result<&'a str, Error> {
    signed_info
        .find_child(ns::DSIG, name)
        .ok_or_else(|| Error::structure(format!("SignedInfo has no {name}")))?
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::structure(format!("{name} has no Algorithm")))
}

fn decode_base64(text: &str, what: &str) -> Result<Vec<u8>, Error> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::structure(format!("{what}: invalid base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SigningRequest;
    use crate::sign::sign;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use xmlsign_crypto::DsaHash;
    use xmlsign_keys::KeyInput;

    const RSA_PEM: &str = include_str!("../../../testdata/rsa-1024.pem");
    const RSA_PUB_PEM: &str = include_str!("../../../testdata/rsa-1024-pub.pem");
    const RSA_OTHER_PEM: &str = include_str!("../../../testdata/rsa-other.pem");

    fn hmac_key() -> KeyMaterial {
        KeyMaterial::Hmac(b"secret".to_vec())
    }

    fn signed_hello() -> String {
        let request = SigningRequest::new("hello", hmac_key())
            .with_signature_algorithm(SignatureAlgorithm::Hmac(DigestMethod::Sha1));
        sign(request, &mut StdRng::seed_from_u64(1)).unwrap().to_xml()
    }

    fn rsa_enveloped() -> String {
        let document = Element::parse("<doc><!--note--><item>1</item></doc>").unwrap();
        let request = SigningRequest::new(document, KeyInput::pem(RSA_PEM))
            .with_signature_algorithm(SignatureAlgorithm::Rsa(DigestMethod::Sha256))
            .with_digest_method(DigestMethod::Sha256)
            .enveloped(true);
        sign(request, &mut StdRng::seed_from_u64(2)).unwrap().to_xml()
    }

    fn rejection(result: Result<VerifiedSignature, Error>) -> InvalidSignature {
        result.unwrap_err().rejection().cloned().expect("expected a rejection")
    }

    #[test]
    fn test_detached_hmac_verifies() {
        let verified = verify(&signed_hello(), &VerifyOptions::with_key(hmac_key())).unwrap();
        assert_eq!(verified.reference_uri, "#object");
        assert_eq!(verified.key_source, KeySource::Supplied);
        assert_eq!(
            verified.digested.as_bytes(),
            br#"<Object xmlns="http://www.w3.org/2000/09/xmldsig#" Id="object">hello</Object>"#
        );
    }

    #[test]
    fn test_wrong_hmac_secret() {
        let options = VerifyOptions::with_key(KeyMaterial::Hmac(b"wrong".to_vec()));
        assert_eq!(rejection(verify(&signed_hello(), &options)), InvalidSignature::SignatureMismatch);
    }

    #[test]
    fn test_hmac_without_key_is_invalid_input() {
        let err = verify(&signed_hello(), &VerifyOptions::trusting_key_info()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_tampered_payload() {
        let xml = signed_hello().replace(">hello<", ">hellO<");
        let options = VerifyOptions::with_key(hmac_key());
        assert_eq!(rejection(verify(&xml, &options)), InvalidSignature::DigestMismatch);
    }

    #[test]
    fn test_tampered_digest_value() {
        let xml = signed_hello().replace("4D/KQvCm", "5D/KQvCm");
        let options = VerifyOptions::with_key(hmac_key());
        assert_eq!(rejection(verify(&xml, &options)), InvalidSignature::DigestMismatch);
    }

    #[test]
    fn test_enveloped_rsa_with_supplied_public_key() {
        let verified = verify(&rsa_enveloped(), &VerifyOptions::with_key(KeyInput::pem(RSA_PUB_PEM))).unwrap();
        assert_eq!(verified.reference_uri, "");
        assert_eq!(verified.signature_algorithm, SignatureAlgorithm::Rsa(DigestMethod::Sha256));
        assert_eq!(verified.digested.as_bytes(), b"<doc><item>1</item></doc>");
    }

    #[test]
    fn test_key_info_needs_opt_in() {
        let xml = rsa_enveloped();
        assert!(matches!(
            verify(&xml, &VerifyOptions::default()),
            Err(Error::InvalidInput(_))
        ));
        let verified = verify(&xml, &VerifyOptions::trusting_key_info()).unwrap();
        assert_eq!(verified.key_source, KeySource::KeyInfo);
    }

    #[test]
    fn test_supplied_key_overrides_key_info() {
        let options = VerifyOptions {
            key: Some(KeyInput::pem(RSA_OTHER_PEM)),
            trust_key_info: true,
            hash_factory: None,
        };
        assert_eq!(rejection(verify(&rsa_enveloped(), &options)), InvalidSignature::SignatureMismatch);
    }

    #[test]
    fn test_wrong_family_key_is_signature_mismatch() {
        let options = VerifyOptions::with_key(hmac_key());
        assert_eq!(rejection(verify(&rsa_enveloped(), &options)), InvalidSignature::SignatureMismatch);
    }

    #[test]
    fn test_pem_of_another_family_is_signature_mismatch() {
        let xml = rsa_enveloped();
        let declared = SignatureAlgorithm::Rsa(DigestMethod::Sha256).uri();
        let options = VerifyOptions::with_key(KeyInput::pem(RSA_PUB_PEM));
        for claimed in [
            SignatureAlgorithm::Hmac(DigestMethod::Sha256),
            SignatureAlgorithm::Dsa(DsaHash::Sha256),
        ] {
            let swapped = xml.replace(declared, claimed.uri());
            assert_eq!(rejection(verify(&swapped, &options)), InvalidSignature::SignatureMismatch);
        }

        let unreadable = VerifyOptions::with_key(KeyInput::pem("not a key"));
        assert!(verify(&xml, &unreadable).unwrap_err().rejection().is_none());
    }

    #[test]
    fn test_structure_errors() {
        let options = VerifyOptions::with_key(hmac_key());
        assert!(matches!(
            rejection(verify("<doc/>", &options)),
            InvalidSignature::Structure(_)
        ));

        let no_value = signed_hello().replace("<SignatureValue>", "<Other>").replace("</SignatureValue>", "</Other>");
        assert!(matches!(rejection(verify(&no_value, &options)), InvalidSignature::Structure(_)));

        let dangling = signed_hello().replace(r#"Id="object""#, r#"Id="elsewhere""#);
        assert!(matches!(rejection(verify(&dangling, &options)), InvalidSignature::Structure(_)));
    }

    #[test]
    fn test_unknown_signature_method() {
        let xml = signed_hello().replace("xmldsig#hmac-sha1", "xmldsig-more#ecdsa-sha256");
        let err = verify(&xml, &VerifyOptions::with_key(hmac_key())).unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
