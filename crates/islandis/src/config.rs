#![forbid(unsafe_code)]

//! Verifier configuration and deployment-generation profiles.

use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use islandis_x509::{ChainMode, ExpectedIdentity};

/// Default directory holding the trust anchor and fallback certificate.
pub const DEFAULT_CERT_DIR: &str = "certificates";

/// Names of the SAML attributes that make up an [`Identity`](crate::Identity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    pub name: String,
    pub ssn: String,
    pub authentication: String,
    pub ip_address: String,
    pub user_agent: String,
    pub company_ssn: String,
    pub company_name: String,
    pub destination_ssn: String,
    pub auth_id: String,
    pub mobile: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            name: "Name".into(),
            ssn: "UserSSN".into(),
            authentication: "Authentication".into(),
            ip_address: "IPAddress".into(),
            user_agent: "UserAgent".into(),
            company_ssn: "CompanySSN".into(),
            company_name: "CompanyName".into(),
            destination_ssn: "DestinationSSN".into(),
            auth_id: "AuthID".into(),
            mobile: "Mobile".into(),
        }
    }
}

/// Trust files and identity expectations of one deployment generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustProfile {
    /// File name of the pinned issuing certificate inside the cert dir.
    pub anchor_file: String,
    /// Certificate used when KeyInfo carries no key. Optional on disk.
    pub fallback_cert_file: String,
    pub subject_serial: String,
    pub issuer_common_name: String,
    pub attributes: AttributeNames,
}

impl TrustProfile {
    /// The current Auðkenni-issued generation.
    pub fn audkenni() -> Self {
        Self {
            anchor_file: "Milliskilriki.cer".into(),
            fallback_cert_file: "mycert.pem".into(),
            subject_serial: "6503760649".into(),
            issuer_common_name: "Fullgilt audkenni".into(),
            attributes: AttributeNames::default(),
        }
    }

    /// The earlier generation pinned to `TrausturBunadur.pem`.
    pub fn legacy() -> Self {
        Self {
            anchor_file: "TrausturBunadur.pem".into(),
            ..Self::audkenni()
        }
    }

    pub fn expected_identity(&self) -> ExpectedIdentity {
        ExpectedIdentity {
            subject_serial: self.subject_serial.clone(),
            issuer_common_name: self.issuer_common_name.clone(),
        }
    }
}

impl Default for TrustProfile {
    fn default() -> Self {
        Self::audkenni()
    }
}

/// Atlantic/Reykjavik: UTC+00:00 all year.
pub fn reykjavik() -> FixedOffset {
    Utc.fix()
}

/// Everything a [`Verifier`](crate::Verifier) needs besides its clock.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Expected `Audience` text, compared exactly.
    pub audience: String,
    pub cert_dir: PathBuf,
    pub profile: TrustProfile,
    /// Zone for `Conditions` timestamps that carry no offset.
    pub timezone: FixedOffset,
    pub chain_mode: ChainMode,
    /// Attribute names that carry element IDs.
    pub id_attrs: Vec<String>,
}

impl VerifierConfig {
    pub fn new(audience: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            cert_dir: PathBuf::from(DEFAULT_CERT_DIR),
            profile: TrustProfile::default(),
            timezone: reykjavik(),
            chain_mode: ChainMode::default(),
            id_attrs: vec!["ID".into()],
        }
    }

    pub fn with_cert_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cert_dir = dir.into();
        self
    }

    pub fn with_profile(mut self, profile: TrustProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_chain_mode(mut self, mode: ChainMode) -> Self {
        self.chain_mode = mode;
        self
    }

    pub fn with_id_attrs(mut self, attrs: Vec<String>) -> Self {
        self.id_attrs = attrs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::new("https://example.is");
        assert_eq!(config.cert_dir, PathBuf::from("certificates"));
        assert_eq!(config.profile, TrustProfile::audkenni());
        assert_eq!(config.timezone.local_minus_utc(), 0);
        assert_eq!(config.chain_mode, ChainMode::Auto);
        assert_eq!(config.id_attrs, vec!["ID".to_string()]);
    }

    #[test]
    fn test_legacy_profile() {
        let legacy = TrustProfile::legacy();
        assert_eq!(legacy.anchor_file, "TrausturBunadur.pem");
        assert_eq!(legacy.subject_serial, "6503760649");
        assert_eq!(legacy.issuer_common_name, "Fullgilt audkenni");
        assert_eq!(legacy.attributes.ssn, "UserSSN");
    }

    #[test]
    fn test_builder() {
        let config = VerifierConfig::new("a")
            .with_cert_dir("/etc/islandis")
            .with_chain_mode(ChainMode::Manual)
            .with_id_attrs(vec!["ID".into(), "AssertionID".into()]);
        assert_eq!(config.cert_dir, PathBuf::from("/etc/islandis"));
        assert_eq!(config.chain_mode, ChainMode::Manual);
        assert_eq!(config.id_attrs.len(), 2);
    }
}
