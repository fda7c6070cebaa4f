#![forbid(unsafe_code)]

//! Leaf-to-anchor validation.

use std::fmt;
use std::str::FromStr;

use islandis_core::{CertificateError, Clock, Error};

use crate::anchor::TrustAnchor;
use crate::cert::LeafCertificate;
use crate::{manual, native};

/// Which implementation checks the anchor's signature on the leaf.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChainMode {
    /// Native when the algorithm is supported there, manual otherwise.
    #[default]
    Auto,
    Native,
    Manual,
}

impl fmt::Display for ChainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChainMode::Auto => "auto",
            ChainMode::Native => "native",
            ChainMode::Manual => "manual",
        })
    }
}

impl FromStr for ChainMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ChainMode::Auto),
            "native" => Ok(ChainMode::Native),
            "manual" => Ok(ChainMode::Manual),
            other => Err(format!("unknown chain mode: {other}")),
        }
    }
}

/// The identity a leaf certificate must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedIdentity {
    /// Subject `serialNumber` attribute.
    pub subject_serial: String,
    /// Issuer common name.
    pub issuer_common_name: String,
}

/// Validates a signing certificate against the pinned anchor.
///
/// Checks run in a fixed order and stop at the first failure:
/// subject, issuer, validity window, issuing CA, chain signature.
#[derive(Debug, Clone)]
pub struct CertificateChainValidator {
    anchor: TrustAnchor,
    expected: ExpectedIdentity,
    mode: ChainMode,
}

impl CertificateChainValidator {
    pub fn new(anchor: TrustAnchor, expected: ExpectedIdentity, mode: ChainMode) -> Self {
        Self {
            anchor,
            expected,
            mode,
        }
    }

    pub fn validate(&self, leaf: &LeafCertificate, clock: &dyn Clock) -> Result<(), Error> {
        let serial = leaf.subject_serial_number().unwrap_or_default();
        if serial != self.expected.subject_serial {
            return Err(CertificateError::InvalidSubject(serial).into());
        }

        let issuer = leaf.issuer_common_name().unwrap_or_default();
        if issuer != self.expected.issuer_common_name {
            return Err(CertificateError::InvalidIssuer(issuer).into());
        }

        let now = clock.now();
        if !(leaf.not_before()? < now && now < leaf.not_after()?) {
            return Err(CertificateError::Expired.into());
        }

        if leaf.issuer_der()? != self.anchor.subject_der() {
            return Err(CertificateError::InvalidCa.into());
        }

        if !self.verify_chain_signature(leaf)? {
            return Err(CertificateError::SignatureInvalid.into());
        }
        Ok(())
    }

    /// Check the anchor's signature on `leaf` with the configured mode.
    pub fn verify_chain_signature(&self, leaf: &LeafCertificate) -> Result<bool, Error> {
        let key = self.anchor.public_key();
        match self.mode {
            ChainMode::Manual => manual::verify_signature(leaf.der(), key),
            ChainMode::Native => native::verify_signature(leaf, key)?.ok_or_else(|| {
                CertificateError::UnsupportedHashAlgorithm(leaf.signature_oid()).into()
            }),
            ChainMode::Auto => match native::verify_signature(leaf, key)? {
                Some(valid) => Ok(valid),
                None => {
                    tracing::debug!(
                        oid = %leaf.signature_oid(),
                        "no native implementation, using manual path"
                    );
                    manual::verify_signature(leaf.der(), key)
                }
            },
        }
    }
}
