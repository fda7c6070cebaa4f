#![forbid(unsafe_code)]

//! XML Digital Signature (XML-DSig) checks for enveloped SAML signatures.
//!
//! Verification is split in two stages that run in order:
//! 1. [`ReferenceIntegrityChecker`]: document shape, reference digest and
//!    canonical `SignedInfo`
//! 2. [`SignatureVerifier`]: signing key resolution and `SignatureValue`

pub mod keyinfo;
pub mod reference;
pub mod sign;
pub mod signature;
pub mod signedinfo;
pub mod transforms;

pub use keyinfo::{KeyMaterial, KeySource};
pub use reference::{ReferenceIntegrityChecker, ValidatedReference};
pub use signature::SignatureVerifier;
