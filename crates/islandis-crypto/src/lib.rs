#![forbid(unsafe_code)]

//! Cryptographic algorithm implementations for the Ísland.is verifier.
//!
//! Provides the digests and RSA PKCS#1 v1.5 signatures XML-DSig needs,
//! plus lookups by certificate signature OID for the X.509 chain check.

pub mod digest;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use sign::{SignatureAlgorithm, SigningKey};
