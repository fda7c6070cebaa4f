#![forbid(unsafe_code)]

//! Chain-signature check built on the in-house DER reader.
//!
//! The certificate is split with [`DerElement`] into its three parts, the
//! signature is opened with a raw RSA public-key operation, and the
//! recovered `DigestInfo` is compared with a fresh hash of the
//! to-be-signed bytes exactly as they appear in the certificate.
//!
//! ```text
//! Certificate ::= SEQUENCE {
//!     tbsCertificate       TBSCertificate,
//!     signatureAlgorithm   AlgorithmIdentifier,
//!     signatureValue       BIT STRING }
//!
//! DigestInfo ::= SEQUENCE {
//!     digestAlgorithm      AlgorithmIdentifier,
//!     digest               OCTET STRING }
//! ```

use islandis_core::{CertificateError, DerError, Error};
use islandis_der::{tag, DerElement};
use rsa::traits::PublicKeyParts;
use rsa::BigUint;

/// Minimum run of 0xFF padding octets in an EMSA-PKCS1-v1_5 block.
const MIN_PADDING: usize = 8;

/// Verify that the DER certificate `leaf_der` was signed by `issuer`.
///
/// A signature that does not open under the issuer's key, or whose
/// `DigestInfo` names a hash other than the one in `signatureAlgorithm`,
/// is `Ok(false)`. A digest algorithm outside the supported table is an
/// error.
pub fn verify_signature(leaf_der: &[u8], issuer: &rsa::RsaPublicKey) -> Result<bool, Error> {
    let certificate = DerElement::parse_exact(leaf_der).map_err(parse_error)?;
    certificate
        .expect(tag::SEQUENCE, "Certificate SEQUENCE")
        .map_err(parse_error)?;
    let parts = certificate.children_exact(3).map_err(parse_error)?;
    let tbs = parts[0];
    let signature_oid = algorithm_oid(&parts[1]).map_err(parse_error)?;
    let signature = parts[2]
        .expect(tag::BIT_STRING, "signatureValue BIT STRING")
        .and_then(DerElement::value)
        .map_err(parse_error)?;

    let Some(encoded) = open_signature(issuer, signature) else {
        tracing::debug!("signature did not open under the anchor key");
        return Ok(false);
    };
    let Ok((oid, expected)) = parse_digest_info(&encoded) else {
        tracing::debug!("recovered block is not a DigestInfo");
        return Ok(false);
    };

    let mut hasher = match islandis_crypto::digest::from_oid(&oid) {
        Ok(Some(hasher)) => hasher,
        Ok(None) | Err(_) => {
            return Err(CertificateError::UnsupportedHashAlgorithm(oid).into());
        }
    };
    let Some(labelled) = islandis_crypto::digest::oid_for_signature(&signature_oid) else {
        return Err(CertificateError::UnsupportedHashAlgorithm(signature_oid).into());
    };
    if oid != labelled {
        tracing::debug!(
            digest_info = %oid,
            signature_algorithm = %signature_oid,
            "DigestInfo hash does not match the signature algorithm"
        );
        return Ok(false);
    }

    let name = hasher.name();
    hasher.update(tbs.as_bytes());
    let valid = hasher.finalize() == expected;
    tracing::debug!(digest = name, valid, "manual chain signature check");
    Ok(valid)
}

/// Raise the signature to the public exponent and strip the type-1 padding.
///
/// The signature must be exactly as long as the modulus.
fn open_signature(key: &rsa::RsaPublicKey, signature: &[u8]) -> Option<Vec<u8>> {
    let k = key.size();
    let s = BigUint::from_bytes_be(signature);
    if signature.len() != k || &s >= key.n() {
        return None;
    }
    let m = s.modpow(key.e(), key.n()).to_bytes_be();
    if m.len() > k {
        return None;
    }
    let mut block = vec![0u8; k - m.len()];
    block.extend_from_slice(&m);
    strip_padding(&block).map(<[u8]>::to_vec)
}

/// `00 01 FF..FF 00 payload`, with at least eight 0xFF octets.
fn strip_padding(block: &[u8]) -> Option<&[u8]> {
    let rest = block.strip_prefix(&[0x00, 0x01])?;
    let padding = rest.iter().take_while(|&&b| b == 0xFF).count();
    if padding < MIN_PADDING {
        return None;
    }
    rest[padding..].strip_prefix(&[0x00])
}

fn parse_digest_info(encoded: &[u8]) -> Result<(String, Vec<u8>), DerError> {
    let info = DerElement::parse_exact(encoded)?;
    info.expect(tag::SEQUENCE, "DigestInfo SEQUENCE")?;
    let fields = info.children_exact(2)?;
    let oid = algorithm_oid(&fields[0])?;
    let digest = fields[1].expect(tag::OCTET_STRING, "digest OCTET STRING")?.value()?;
    Ok((oid, digest.to_vec()))
}

/// The OID of an `AlgorithmIdentifier`.
fn algorithm_oid(element: &DerElement<'_>) -> Result<String, DerError> {
    element
        .expect(tag::SEQUENCE, "AlgorithmIdentifier")?
        .children()?
        .first()
        .ok_or(DerError::ChildCount {
            expected: 1,
            found: 0,
        })?
        .oid()
}

fn parse_error(e: DerError) -> Error {
    CertificateError::ParseError(e.to_string()).into()
}
