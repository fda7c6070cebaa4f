#![forbid(unsafe_code)]

//! Signing-certificate validation against a single pinned trust anchor.
//!
//! The leaf certificate embedded in an assertion is checked for the
//! expected subject and issuer, its validity window, and a signature made
//! by the anchor's key. The signature check runs either through
//! `x509-cert` and `rsa` ([`native`]) or through the in-house DER reader
//! and a raw RSA operation ([`manual`]).

pub mod anchor;
pub mod cert;
pub mod chain;
pub mod manual;
pub mod native;

pub use anchor::TrustAnchor;
pub use cert::LeafCertificate;
pub use chain::{CertificateChainValidator, ChainMode, ExpectedIdentity};
