#![forbid(unsafe_code)]

//! XML document handling over `roxmltree`: token decoding, ID lookup and
//! the `NodeSet` used by canonicalization and signature transforms.

pub mod document;
pub mod nodeset;
pub mod xpath;

pub use document::XmlDocument;
pub use nodeset::NodeSet;

/// Return roxmltree parsing options for untrusted tokens.
///
/// DTDs are refused outright; an assertion never needs one.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: false,
        ..roxmltree::ParsingOptions::default()
    }
}
