#![forbid(unsafe_code)]

//! The pinned issuing-authority certificate.

use std::path::Path;

use der::{Decode, Encode};
use islandis_core::{CertificateError, Error};
use x509_cert::Certificate;

use crate::cert::{decode_pem_or_der, rsa_public_key};

/// The a-priori trusted certificate every leaf must be issued by.
///
/// Loaded once, immutable afterwards, and shared by every verification.
#[derive(Debug, Clone)]
pub struct TrustAnchor {
    subject_der: Vec<u8>,
    public_key: rsa::RsaPublicKey,
}

impl TrustAnchor {
    /// Load `file_name` from `dir`. PEM and DER are both accepted.
    pub fn load(dir: &Path, file_name: &str) -> Result<Self, Error> {
        let path = dir.join(file_name);
        if !path.is_file() {
            return Err(CertificateError::NotFoundInDirectory {
                file: file_name.to_owned(),
                dir: dir.to_path_buf(),
            }
            .into());
        }
        let data = std::fs::read(&path).map_err(|e| {
            CertificateError::AnchorUnreadable(format!("{}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "loaded trust anchor");
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let der = decode_pem_or_der(data).map_err(CertificateError::AnchorUnreadable)?;
        let cert = Certificate::from_der(&der)
            .map_err(|e| CertificateError::AnchorUnreadable(e.to_string()))?;
        let subject_der = cert
            .tbs_certificate
            .subject
            .to_der()
            .map_err(|e| CertificateError::AnchorUnreadable(e.to_string()))?;
        let public_key = rsa_public_key(&cert).map_err(CertificateError::AnchorUnreadable)?;
        Ok(Self {
            subject_der,
            public_key,
        })
    }

    /// DER encoding of the anchor's subject DN.
    pub fn subject_der(&self) -> &[u8] {
        &self.subject_der
    }

    pub fn public_key(&self) -> &rsa::RsaPublicKey {
        &self.public_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrustAnchor::load(dir.path(), "Milliskilriki.cer").unwrap_err();
        assert!(err.is_construction_error());
        assert_eq!(
            err.to_string(),
            format!("Cannot find Milliskilriki.cer in {}", dir.path().display())
        );
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Milliskilriki.cer"), b"garbage").unwrap();
        let err = TrustAnchor::load(dir.path(), "Milliskilriki.cer").unwrap_err();
        assert!(matches!(
            err,
            Error::Certificate(CertificateError::AnchorUnreadable(_))
        ));
        assert!(err.is_construction_error());
    }
}
