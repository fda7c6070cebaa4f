#![forbid(unsafe_code)]

//! The signing certificate carried in an assertion's KeyInfo.

use chrono::{DateTime, Utc};
use der::{Decode, Encode};
use islandis_core::{algorithm, CertificateError, Error};
use x509_cert::name::Name;
use x509_cert::time::Time;
use x509_cert::Certificate;

/// A parsed X.509 certificate together with the DER it was parsed from.
#[derive(Debug, Clone)]
pub struct LeafCertificate {
    der: Vec<u8>,
    cert: Certificate,
}

impl LeafCertificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: Vec<u8>) -> Result<Self, Error> {
        let cert = Certificate::from_der(&der)
            .map_err(|e| CertificateError::ReadError(e.to_string()))?;
        Ok(Self { der, cert })
    }

    /// Parse a certificate file that is either PEM (`CERTIFICATE` label) or
    /// raw DER.
    pub fn from_pem_or_der(data: &[u8]) -> Result<Self, Error> {
        let der = decode_pem_or_der(data).map_err(CertificateError::ReadError)?;
        Self::from_der(der)
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The `serialNumber` attribute (2.5.4.5) of the subject DN.
    pub fn subject_serial_number(&self) -> Option<String> {
        name_attribute(&self.cert.tbs_certificate.subject, algorithm::OID_SERIAL_NUMBER)
    }

    /// The common name (2.5.4.3) of the issuer DN.
    pub fn issuer_common_name(&self) -> Option<String> {
        name_attribute(&self.cert.tbs_certificate.issuer, algorithm::OID_COMMON_NAME)
    }

    pub fn issuer_der(&self) -> Result<Vec<u8>, Error> {
        self.cert
            .tbs_certificate
            .issuer
            .to_der()
            .map_err(|e| CertificateError::ParseError(format!("issuer: {e}")).into())
    }

    pub fn not_before(&self) -> Result<DateTime<Utc>, Error> {
        to_chrono(&self.cert.tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> Result<DateTime<Utc>, Error> {
        to_chrono(&self.cert.tbs_certificate.validity.not_after)
    }

    /// Dotted-decimal OID of the outer `signatureAlgorithm`.
    pub fn signature_oid(&self) -> String {
        self.cert.signature_algorithm.oid.to_string()
    }

    pub fn signature_bytes(&self) -> Result<&[u8], Error> {
        self.cert.signature.as_bytes().ok_or_else(|| {
            CertificateError::ParseError("signature has unused bits".into()).into()
        })
    }

    /// The re-encoded to-be-signed body.
    pub fn tbs_der(&self) -> Result<Vec<u8>, Error> {
        self.cert
            .tbs_certificate
            .to_der()
            .map_err(|e| CertificateError::ParseError(format!("tbsCertificate: {e}")).into())
    }

    pub fn public_key(&self) -> Result<rsa::RsaPublicKey, Error> {
        rsa_public_key(&self.cert).map_err(|e| CertificateError::ReadError(e).into())
    }
}

/// Strip a PEM armor if present; otherwise return the bytes unchanged.
pub(crate) fn decode_pem_or_der(data: &[u8]) -> Result<Vec<u8>, String> {
    let text = match std::str::from_utf8(data) {
        Ok(text) if text.trim_start().starts_with("-----BEGIN") => text.trim(),
        _ => return Ok(data.to_vec()),
    };
    let (label, der) = pem_rfc7468::decode_vec(text.as_bytes())
        .map_err(|e| format!("failed to decode certificate PEM: {e}"))?;
    if label != "CERTIFICATE" {
        return Err(format!("expected CERTIFICATE PEM label, got: {label}"));
    }
    Ok(der)
}

pub(crate) fn rsa_public_key(cert: &Certificate) -> Result<rsa::RsaPublicKey, String> {
    use spki::DecodePublicKey;

    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| format!("failed to encode SPKI: {e}"))?;
    rsa::RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| format!("invalid RSA public key: {e}"))
}

fn name_attribute(name: &Name, oid: &str) -> Option<String> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .find(|atv| atv.oid.to_string() == oid)
        .map(|atv| String::from_utf8_lossy(atv.value.value()).into_owned())
}

fn to_chrono(time: &Time) -> Result<DateTime<Utc>, Error> {
    let since_epoch = time.to_unix_duration();
    i64::try_from(since_epoch.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| CertificateError::ParseError("validity out of range".into()).into())
}
