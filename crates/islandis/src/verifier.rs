#![forbid(unsafe_code)]

//! The verification pipeline.
//!
//! A token moves through a fixed sequence of stages and stops at the
//! first failure:
//!
//! ```text
//! Created -> Decoded -> ReferenceValidated -> SignatureVerified
//!         -> CertificateValidated -> ProtocolValidated -> Verified
//! ```
//!
//! Nothing is read from the assertion until its reference digest, its
//! signature and its certificate chain have all been checked.

use std::fmt;
use std::sync::Arc;

use islandis_core::{CertificateError, Clock, Error, ErrorKind, SignatureError};
use islandis_dsig::{KeyMaterial, ReferenceIntegrityChecker, SignatureVerifier};
use islandis_x509::{CertificateChainValidator, LeafCertificate, TrustAnchor};
use islandis_xml::XmlDocument;

use crate::config::VerifierConfig;
use crate::identity::VerifiedAssertion;
use crate::protocol::ProtocolValidator;

/// A pipeline state, as reported to [`Verifier::verify_observed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decoded,
    ReferenceValidated,
    SignatureVerified,
    CertificateValidated,
    ProtocolValidated,
    Verified,
    Failed(ErrorKind),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Decoded => f.write_str("decoded"),
            Stage::ReferenceValidated => f.write_str("reference-validated"),
            Stage::SignatureVerified => f.write_str("signature-verified"),
            Stage::CertificateValidated => f.write_str("certificate-validated"),
            Stage::ProtocolValidated => f.write_str("protocol-validated"),
            Stage::Verified => f.write_str("verified"),
            Stage::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

/// Verifies Ísland.is SAML responses against a pinned trust anchor.
///
/// The verifier holds no per-call state and may be shared between threads.
pub struct Verifier {
    config: VerifierConfig,
    reference: ReferenceIntegrityChecker,
    signature: SignatureVerifier,
    chain: CertificateChainValidator,
    protocol: ProtocolValidator,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("config", &self.config)
            .field("fallback_key", &self.signature.has_fallback())
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// Load the trust anchor, and the fallback certificate when present.
    ///
    /// A missing or unreadable anchor fails here, not at verification.
    pub fn new(config: VerifierConfig, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        let profile = &config.profile;
        let anchor = TrustAnchor::load(&config.cert_dir, &profile.anchor_file)?;
        let fallback = load_fallback(&config)?;

        let chain = CertificateChainValidator::new(
            anchor,
            profile.expected_identity(),
            config.chain_mode,
        );
        let protocol = ProtocolValidator::new(
            config.audience.clone(),
            config.timezone,
            profile.attributes.user_agent.clone(),
        );
        Ok(Self {
            reference: ReferenceIntegrityChecker::new(config.id_attrs.clone()),
            signature: SignatureVerifier::new(fallback),
            chain,
            protocol,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a base64 token.
    ///
    /// `user_agent` is the User-Agent the caller saw on the request that
    /// delivered the token. Any error means the token must be discarded.
    pub fn verify(
        &self,
        token: &str,
        user_agent: Option<&str>,
    ) -> Result<VerifiedAssertion, Error> {
        self.verify_observed(token, user_agent, &mut |_| {})
    }

    /// Like [`verify`](Self::verify), reporting each stage to `observer`.
    pub fn verify_observed(
        &self,
        token: &str,
        user_agent: Option<&str>,
        observer: &mut dyn FnMut(Stage),
    ) -> Result<VerifiedAssertion, Error> {
        match self.run(token, user_agent, observer) {
            Ok(verified) => {
                observer(Stage::Verified);
                tracing::info!(key_source = ?verified.key_source(), "assertion verified");
                Ok(verified)
            }
            Err(err) => {
                tracing::warn!(kind = %err.kind(), error = %err, "assertion rejected");
                observer(Stage::Failed(err.kind()));
                Err(err)
            }
        }
    }

    fn run(
        &self,
        token: &str,
        user_agent: Option<&str>,
        observer: &mut dyn FnMut(Stage),
    ) -> Result<VerifiedAssertion, Error> {
        if token.is_empty() {
            return Err(Error::EmptyToken);
        }
        let mut enter = |stage: Stage| {
            tracing::debug!(%stage, "stage entered");
            observer(stage);
        };

        let xml = XmlDocument::from_token(token)?;
        let doc = xml.parse_doc()?;
        enter(Stage::Decoded);

        let validated = self
            .reference
            .check(&doc)
            .map_err(|e| within(ErrorKind::ReferenceIntegrity, e))?;
        enter(Stage::ReferenceValidated);

        let key = self
            .signature
            .verify(&validated)
            .map_err(|e| within(ErrorKind::Signature, e))?;
        enter(Stage::SignatureVerified);

        let leaf = key.certificate.as_ref().ok_or_else(|| {
            CertificateError::ReadError("no certificate for the signing key".into())
        })?;
        self.chain
            .validate(leaf, self.clock.as_ref())
            .map_err(|e| within(ErrorKind::Certificate, e))?;
        enter(Stage::CertificateValidated);

        self.protocol
            .validate(validated.assertion, self.clock.now(), user_agent)?;
        enter(Stage::ProtocolValidated);

        Ok(VerifiedAssertion::collect(
            validated.assertion,
            &self.config.profile.attributes,
            key.source,
        ))
    }
}

fn load_fallback(config: &VerifierConfig) -> Result<Option<KeyMaterial>, Error> {
    let path = config.cert_dir.join(&config.profile.fallback_cert_file);
    if !path.is_file() {
        return Ok(None);
    }
    let data = std::fs::read(&path)
        .map_err(|e| CertificateError::ReadError(format!("{}: {e}", path.display())))?;
    let material = KeyMaterial::fallback(LeafCertificate::from_pem_or_der(&data)?)?;
    tracing::debug!(path = %path.display(), "loaded fallback certificate");
    Ok(Some(material))
}

/// Report internal decoding failures as the class of the stage they
/// happened in.
fn within(stage: ErrorKind, err: Error) -> Error {
    let detail = match &err {
        Error::Der(_) | Error::Canonicalization(_) | Error::UnsupportedAlgorithm(_) => {
            err.to_string()
        }
        _ => return err,
    };
    match stage {
        ErrorKind::ReferenceIntegrity => Error::ReferenceIntegrity(detail),
        ErrorKind::Certificate => CertificateError::ParseError(detail).into(),
        _ => SignatureError::Malformed(detail).into(),
    }
}
