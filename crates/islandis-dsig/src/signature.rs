#![forbid(unsafe_code)]

//! Verification of `<ds:SignatureValue>` over the canonical `SignedInfo`.

use base64::Engine;
use islandis_core::{ns, Error, KeyResolutionError, SignatureError};
use islandis_crypto::sign::{self, SigningKey};
use islandis_xml::xpath::find_child_element;

use crate::keyinfo::{self, KeyMaterial};
use crate::reference::ValidatedReference;

/// Resolves the signing key and checks the signature value.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    fallback: Option<KeyMaterial>,
}

impl SignatureVerifier {
    /// `fallback` is used when KeyInfo is present but carries no key.
    pub fn new(fallback: Option<KeyMaterial>) -> Self {
        Self { fallback }
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Verify the signature of an already reference-checked document and
    /// return the key that verified it.
    pub fn verify(&self, validated: &ValidatedReference<'_, '_>) -> Result<KeyMaterial, Error> {
        let key = self.resolve_key(validated)?;

        let value_node = find_child_element(
            validated.signature,
            ns::DSIG,
            ns::node::SIGNATURE_VALUE,
        )
        .ok_or_else(|| SignatureError::Malformed("SignatureValue not found".into()))?;
        let clean: String = value_node
            .text()
            .unwrap_or("")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let signature_value = base64::engine::general_purpose::STANDARD
            .decode(clean)
            .map_err(|e| SignatureError::Malformed(format!("SignatureValue: {e}")))?;

        let method = &validated.signed_info.signature_method;
        let alg = sign::from_uri(method)?;
        let verifying_key = SigningKey::RsaPublic(key.public_key.clone());
        let valid = alg
            .verify(&verifying_key, &validated.canonical_signed_info, &signature_value)
            .unwrap_or(false);
        if !valid {
            return Err(SignatureError::Invalid.into());
        }
        tracing::debug!(
            signature_method = %method,
            key_source = ?key.source,
            "signature value verified"
        );
        Ok(key)
    }

    fn resolve_key(&self, validated: &ValidatedReference<'_, '_>) -> Result<KeyMaterial, Error> {
        let key_info = find_child_element(validated.signature, ns::DSIG, ns::node::KEY_INFO)
            .ok_or(KeyResolutionError::KeyInfoNotFound)?;
        if let Some(material) = keyinfo::extract_key(key_info)? {
            return Ok(material);
        }
        self.fallback
            .clone()
            .ok_or_else(|| KeyResolutionError::KeyNotFound.into())
    }
}
