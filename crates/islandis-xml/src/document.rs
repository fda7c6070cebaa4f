#![forbid(unsafe_code)]

//! The decoded wire token.

use base64::Engine;
use islandis_core::{Error, XmlError};

/// An owned XML document decoded from a base64 token.
///
/// To work with the parsed tree, call [`XmlDocument::parse_doc`] which
/// returns a `roxmltree::Document` borrowing from the text.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    text: String,
}

impl XmlDocument {
    /// Decode a base64 token. Whitespace inside the token is ignored.
    pub fn from_token(token: &str) -> Result<Self, Error> {
        let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| XmlError::Base64(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Take ownership of raw XML bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        let text = String::from_utf8(bytes).map_err(|e| XmlError::Utf8(e.to_string()))?;
        Ok(Self { text })
    }

    /// Get the raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse the text into a tree.
    pub fn parse_doc(&self) -> Result<roxmltree::Document<'_>, Error> {
        roxmltree::Document::parse_with_options(&self.text, crate::parsing_options())
            .map_err(|e| XmlError::Parse(e.to_string()).into())
    }
}
