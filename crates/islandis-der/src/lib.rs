#![forbid(unsafe_code)]

//! Minimal ASN.1 BER/DER reader.
//!
//! A [`DerElement`] is parsed in a single pass from the start of a byte
//! buffer: class, constructed flag, tag number and the byte range of the
//! element are fixed at parse time and never change afterwards. Elements
//! borrow from the buffer they were parsed from and never copy it.
//!
//! ```text
//! 30 82 01 0a  02 01 05  ...
//! │  │         └─ first child (INTEGER 5)
//! │  └─ long-form length, 2 octets: 0x010a
//! └─ universal, constructed, tag 16 (SEQUENCE)
//! ```

pub mod element;
pub mod oid;

pub use element::{tag, Class, DerElement};
pub use oid::decode_oid;
