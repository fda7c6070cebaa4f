#![forbid(unsafe_code)]

//! Verification of Ísland.is SAML authentication responses.
//!
//! ```no_run
//! use std::sync::Arc;
//! use islandis::{SystemClock, Verifier, VerifierConfig};
//!
//! let config = VerifierConfig::new("https://minsida.example.is");
//! let verifier = Verifier::new(config, Arc::new(SystemClock))?;
//! # let token = "";
//! let verified = verifier.verify(token, Some("Mozilla/5.0"))?;
//! println!("{}", verified.identity().ssn);
//! # Ok::<(), islandis::Error>(())
//! ```

pub use islandis_c14n as c14n;
pub use islandis_core as core;
pub use islandis_crypto as crypto;
pub use islandis_der as der;
pub use islandis_dsig as dsig;
pub use islandis_x509 as x509;
pub use islandis_xml as xml;

pub mod config;
pub mod identity;
pub mod protocol;
pub mod verifier;

pub use config::{AttributeNames, TrustProfile, VerifierConfig};
pub use identity::{Identity, VerifiedAssertion};
pub use islandis_core::{Clock, Error, ErrorKind, FixedClock, Result, SystemClock};
pub use islandis_x509::ChainMode;
pub use protocol::ProtocolValidator;
pub use verifier::{Stage, Verifier};
