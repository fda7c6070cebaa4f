#![forbid(unsafe_code)]

//! Core types shared by the Ísland.is assertion verifier crates.

pub mod algorithm;
pub mod clock;
pub mod error;
pub mod ns;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{
    CertificateError, DerError, Error, ErrorKind, KeyResolutionError, ProtocolError, Result,
    SignatureError, XmlError,
};
