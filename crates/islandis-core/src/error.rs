#![forbid(unsafe_code)]

use std::fmt;
use std::path::PathBuf;

/// Errors produced while verifying an Ísland.is assertion.
///
/// Every variant is terminal for the token that produced it: the caller must
/// discard the token and request a fresh assertion instead of retrying.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Can't verify empty token")]
    EmptyToken,

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("Reference Validation Failed: {0}")]
    ReferenceIntegrity(String),

    #[error(transparent)]
    KeyResolution(#[from] KeyResolutionError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("DER decoding error: {0}")]
    Der(#[from] DerError),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl Error {
    /// The coarse class of this error, as reported to stage observers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyToken => ErrorKind::Argument,
            Error::Xml(_) => ErrorKind::XmlDecode,
            Error::ReferenceIntegrity(_) | Error::Canonicalization(_) => {
                ErrorKind::ReferenceIntegrity
            }
            Error::KeyResolution(_) => ErrorKind::KeyResolution,
            Error::Signature(_) | Error::UnsupportedAlgorithm(_) => ErrorKind::Signature,
            Error::Certificate(_) | Error::Der(_) => ErrorKind::Certificate,
            Error::Protocol(_) => ErrorKind::ProtocolValidation,
        }
    }

    /// True for failures raised while loading the trust anchor at
    /// construction, as opposed to failures of a particular token.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Error::Certificate(CertificateError::NotFoundInDirectory { .. })
                | Error::Certificate(CertificateError::AnchorUnreadable(_))
        )
    }
}

/// Taxonomy class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Argument,
    XmlDecode,
    ReferenceIntegrity,
    KeyResolution,
    Signature,
    Certificate,
    ProtocolValidation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Argument => "argument",
            ErrorKind::XmlDecode => "xml-decode",
            ErrorKind::ReferenceIntegrity => "reference-integrity",
            ErrorKind::KeyResolution => "key-resolution",
            ErrorKind::Signature => "signature",
            ErrorKind::Certificate => "certificate",
            ErrorKind::ProtocolValidation => "protocol-validation",
        };
        f.write_str(name)
    }
}

/// The token could not be turned into an XML document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("token is not valid base64: {0}")]
    Base64(String),

    #[error("token is not valid UTF-8: {0}")]
    Utf8(String),

    #[error("XML parsing error: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum KeyResolutionError {
    #[error("Key not found")]
    KeyNotFound,

    #[error("Failed to extract info from key")]
    KeyInfoNotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("Signature invalid!")]
    Invalid,

    #[error("malformed signature: {0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("Cannot find {file} in {}", .dir.display())]
    NotFoundInDirectory { file: String, dir: PathBuf },

    #[error("Failed to load trust anchor: {0}")]
    AnchorUnreadable(String),

    #[error("Certificate expired or not valid yet")]
    Expired,

    #[error("Failed to read certificate: {0}")]
    ReadError(String),

    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Not correct CA")]
    InvalidCa,

    #[error("Invalid issuer: \"{0}\"")]
    InvalidIssuer(String),

    #[error("Invalid subject: \"{0}\"")]
    InvalidSubject(String),

    #[error("Signature invalid!")]
    SignatureInvalid,

    #[error("Unknown signature hash algorithm oid: {0}")]
    UnsupportedHashAlgorithm(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid audience expected \"{expected}\" got \"{got}\"")]
    InvalidAudience { expected: String, got: String },

    #[error("Response is not within specified timeframe")]
    NotWithinTimeframe,

    #[error("Unable to get time from start (NotBefore) or end(NotOnOrAfter)")]
    DateInvalid,

    #[error("{}", missing_fields(.0))]
    MissingData(Vec<String>),

    #[error("User-agent does not match: expected \"{expected}\" got \"{got}\"")]
    UserAgent { expected: String, got: String },
}

fn missing_fields(fields: &[String]) -> String {
    let quoted: Vec<String> = fields.iter().map(|f| format!("\"{f}\"")).collect();
    if quoted.len() == 1 {
        format!("Missing field {} from response", quoted[0])
    } else {
        format!("Missing fields {} from response", quoted.join(", "))
    }
}

/// Malformed or unsupported DER input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DerError {
    #[error("truncated input at offset {0}")]
    Truncated(usize),

    #[error("indefinite length is not supported")]
    IndefiniteLength,

    #[error("reserved length octet 0xFF")]
    ReservedLength,

    #[error("length of {0} octets does not fit a 64-bit integer")]
    LengthOverflow(usize),

    #[error("tag number does not fit a 32-bit integer")]
    TagOverflow,

    #[error("non-minimal tag number encoding")]
    NonMinimalTag,

    #[error("unsupported: partial final octet ({0} unused bits)")]
    PartialFinalOctet(u8),

    #[error("expected {expected}, found tag {found}")]
    UnexpectedTag { expected: &'static str, found: u32 },

    #[error("expected {expected} child elements, found {found}")]
    ChildCount { expected: usize, found: usize },

    #[error("{0} trailing octets after element")]
    TrailingData(usize),

    #[error("malformed object identifier")]
    InvalidOid,
}

pub type Result<T> = std::result::Result<T, Error>;
