#![forbid(unsafe_code)]

//! KeyInfo processing: reads `<ds:KeyInfo>` to find the signing key.

use base64::Engine;
use islandis_core::{ns, CertificateError, Error, KeyResolutionError};
use islandis_x509::LeafCertificate;
use islandis_xml::xpath::{find_child_element, find_path};
use roxmltree::Node;

/// Where the signing key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    X509Certificate,
    KeyValue,
    Fallback,
}

/// A verification key and, when one was available, its certificate.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    pub public_key: rsa::RsaPublicKey,
    pub certificate: Option<LeafCertificate>,
    pub source: KeySource,
}

impl KeyMaterial {
    /// Key material taken from a certificate file on disk.
    pub fn fallback(certificate: LeafCertificate) -> Result<Self, Error> {
        Ok(Self {
            public_key: certificate.public_key()?,
            certificate: Some(certificate),
            source: KeySource::Fallback,
        })
    }
}

/// Extract embedded key material from `<ds:KeyInfo>`.
///
/// `X509Data/X509Certificate` wins over `KeyValue/RSAKeyValue`. Returns
/// `Ok(None)` when neither is present.
pub fn extract_key(key_info: Node<'_, '_>) -> Result<Option<KeyMaterial>, Error> {
    if let Some(cert_node) = find_path(
        key_info,
        ns::DSIG,
        &[ns::node::X509_DATA, ns::node::X509_CERTIFICATE],
    ) {
        let der = decode_binary(cert_node)
            .map_err(|e| CertificateError::ReadError(format!("X509Certificate: {e}")))?;
        let certificate = LeafCertificate::from_der(der)?;
        return Ok(Some(KeyMaterial {
            public_key: certificate.public_key()?,
            certificate: Some(certificate),
            source: KeySource::X509Certificate,
        }));
    }

    if let Some(rsa_kv) = find_path(
        key_info,
        ns::DSIG,
        &[ns::node::KEY_VALUE, ns::node::RSA_KEY_VALUE],
    ) {
        return Ok(Some(KeyMaterial {
            public_key: parse_rsa_key_value(rsa_kv)?,
            certificate: None,
            source: KeySource::KeyValue,
        }));
    }

    Ok(None)
}

/// Extract an RSA public key from a `<RSAKeyValue>` element.
pub fn parse_rsa_key_value(rsa_kv: Node<'_, '_>) -> Result<rsa::RsaPublicKey, Error> {
    let modulus = find_child_element(rsa_kv, ns::DSIG, ns::node::RSA_MODULUS)
        .ok_or(KeyResolutionError::KeyNotFound)?;
    let exponent = find_child_element(rsa_kv, ns::DSIG, ns::node::RSA_EXPONENT)
        .ok_or(KeyResolutionError::KeyNotFound)?;

    let n = decode_binary(modulus).map_err(|_| KeyResolutionError::KeyNotFound)?;
    let e = decode_binary(exponent).map_err(|_| KeyResolutionError::KeyNotFound)?;
    let key = rsa::RsaPublicKey::new(
        rsa::BigUint::from_bytes_be(&n),
        rsa::BigUint::from_bytes_be(&e),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "RSAKeyValue is not a usable key");
        KeyResolutionError::KeyNotFound
    })?;
    Ok(key)
}

/// Base64 element text with embedded whitespace removed.
fn decode_binary(node: Node<'_, '_>) -> Result<Vec<u8>, base64::DecodeError> {
    let clean: String = node
        .text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD.decode(clean)
}
