#![forbid(unsafe_code)]

//! Reading `<ds:SignedInfo>`.

use base64::Engine;
use islandis_c14n::C14nMode;
use islandis_core::{ns, Error};
use islandis_xml::xpath::{find_child_element, find_child_elements};
use roxmltree::Node;

use crate::transforms::{self, Transform};

/// The parts of `SignedInfo` the verifier and signer act on.
#[derive(Debug)]
pub struct SignedInfo<'a, 'input> {
    pub node: Node<'a, 'input>,
    pub c14n_mode: C14nMode,
    pub inclusive_prefixes: Vec<String>,
    pub signature_method: String,
    pub references: Vec<Reference<'a, 'input>>,
}

/// One `<ds:Reference>`.
#[derive(Debug)]
pub struct Reference<'a, 'input> {
    pub node: Node<'a, 'input>,
    pub uri: String,
    pub transforms: Vec<Transform>,
    pub digest_method: String,
    /// Base64 text of `DigestValue`, whitespace removed.
    pub digest_value: String,
}

impl Reference<'_, '_> {
    pub fn decoded_digest(&self) -> Result<Vec<u8>, Error> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.digest_value)
            .map_err(|e| Error::ReferenceIntegrity(format!("DigestValue: {e}")))
    }
}

impl<'a, 'input> SignedInfo<'a, 'input> {
    /// Read the `SignedInfo` child of a `<ds:Signature>`.
    ///
    /// Problems are reported as reference-integrity failures: nothing in
    /// the signature can be trusted until its reference checks out.
    pub fn read(signature: Node<'a, 'input>) -> Result<Self, Error> {
        let node = find_child_element(signature, ns::DSIG, ns::node::SIGNED_INFO)
            .ok_or_else(|| missing("SignedInfo"))?;

        let c14n_node = find_child_element(node, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
            .ok_or_else(|| missing("CanonicalizationMethod"))?;
        let c14n_uri = c14n_node.attribute(ns::attr::ALGORITHM).unwrap_or("");
        let c14n_mode = C14nMode::from_uri(c14n_uri).ok_or_else(|| {
            Error::ReferenceIntegrity(format!("unsupported canonicalization: {c14n_uri}"))
        })?;
        let inclusive_prefixes = transforms::read_inclusive_prefixes(c14n_node);

        let signature_method = find_child_element(node, ns::DSIG, ns::node::SIGNATURE_METHOD)
            .and_then(|n| n.attribute(ns::attr::ALGORITHM))
            .ok_or_else(|| missing("SignatureMethod"))?
            .to_owned();

        let references = find_child_elements(node, ns::DSIG, ns::node::REFERENCE)
            .into_iter()
            .map(Reference::read)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            node,
            c14n_mode,
            inclusive_prefixes,
            signature_method,
            references,
        })
    }

    /// The single reference an enveloped SAML signature must carry.
    pub fn single_reference(&self) -> Result<&Reference<'a, 'input>, Error> {
        match self.references.as_slice() {
            [only] => Ok(only),
            refs => Err(Error::ReferenceIntegrity(format!(
                "expected exactly one Reference, found {}",
                refs.len()
            ))),
        }
    }
}

impl<'a, 'input> Reference<'a, 'input> {
    fn read(node: Node<'a, 'input>) -> Result<Self, Error> {
        let digest_method = find_child_element(node, ns::DSIG, ns::node::DIGEST_METHOD)
            .and_then(|n| n.attribute(ns::attr::ALGORITHM))
            .ok_or_else(|| missing("DigestMethod"))?
            .to_owned();
        let digest_value = find_child_element(node, ns::DSIG, ns::node::DIGEST_VALUE)
            .ok_or_else(|| missing("DigestValue"))?
            .text()
            .unwrap_or("")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Ok(Self {
            node,
            uri: node.attribute(ns::attr::URI).unwrap_or("").to_owned(),
            transforms: transforms::read_transforms(node)?,
            digest_method,
            digest_value,
        })
    }
}

fn missing(element: &str) -> Error {
    Error::ReferenceIntegrity(format!("{element} not found"))
}
