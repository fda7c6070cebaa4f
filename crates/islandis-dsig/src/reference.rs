#![forbid(unsafe_code)]

//! Reference integrity: the first check a token goes through.
//!
//! Besides recomputing the reference digest, the checker pins down which
//! element the signature covers and refuses documents shaped to smuggle
//! an unsigned assertion past a valid signature:
//!
//! - the root must be `samlp:Response` with exactly one `saml:Assertion`,
//!   and that assertion must be a direct child of the root
//! - the first `ds:Signature` must carry exactly one `Reference`, whose
//!   URI is empty or a unique same-document ID
//! - the signature must be enveloped by the referenced element, and that
//!   element must be the Response or its Assertion

use islandis_c14n::canonicalize_doc;
use islandis_core::{ns, Error};
use islandis_crypto::digest;
use islandis_xml::xpath::{self, is_named, IdMap};
use islandis_xml::NodeSet;
use roxmltree::{Document, Node};

use crate::signedinfo::SignedInfo;
use crate::transforms::{self, TransformData};

/// A document whose signed reference has been validated.
#[derive(Debug)]
pub struct ValidatedReference<'a, 'input> {
    pub signature: Node<'a, 'input>,
    pub signed_info: SignedInfo<'a, 'input>,
    /// The element the signature covers: the Response or the Assertion.
    pub signed_element: Node<'a, 'input>,
    /// The only assertion in the document. Data is read from here alone.
    pub assertion: Node<'a, 'input>,
    /// `SignedInfo` in canonical form, ready for signature verification.
    pub canonical_signed_info: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ReferenceIntegrityChecker {
    id_attrs: Vec<String>,
}

impl Default for ReferenceIntegrityChecker {
    fn default() -> Self {
        Self::new(vec![ns::attr::ID.to_owned()])
    }
}

impl ReferenceIntegrityChecker {
    /// `id_attrs` names the attributes that carry element IDs.
    pub fn new(id_attrs: Vec<String>) -> Self {
        Self { id_attrs }
    }

    pub fn check<'a, 'input>(
        &self,
        doc: &'a Document<'input>,
    ) -> Result<ValidatedReference<'a, 'input>, Error> {
        let root = doc.root_element();
        if !is_named(&root, ns::SAML_PROTOCOL, ns::node::RESPONSE) {
            return Err(Error::ReferenceIntegrity(format!(
                "unexpected root element {}",
                root.tag_name().name()
            )));
        }
        let assertion = single_assertion(doc, root)?;

        let signature = xpath::find_element(doc, ns::DSIG, ns::node::SIGNATURE)
            .ok_or_else(|| Error::ReferenceIntegrity("Signature not found".into()))?;
        let signed_info = SignedInfo::read(signature)?;
        let reference = signed_info.single_reference()?;

        let (signed_element, node_set) = if reference.uri.is_empty() {
            (root, NodeSet::all_without_comments(doc))
        } else {
            let id = xpath::parse_same_document_ref(&reference.uri).ok_or_else(|| {
                Error::ReferenceIntegrity(format!("unsupported URI: {}", reference.uri))
            })?;
            let attrs: Vec<&str> = self.id_attrs.iter().map(String::as_str).collect();
            let target = IdMap::build(doc, &attrs).resolve(doc, id)?;
            (target, NodeSet::tree_without_comments(target))
        };

        if signature.parent() != Some(signed_element) {
            return Err(Error::ReferenceIntegrity(
                "signature is not enveloped by the referenced element".into(),
            ));
        }
        if signed_element != root && signed_element != assertion {
            return Err(Error::ReferenceIntegrity(
                "reference does not cover the response or its assertion".into(),
            ));
        }

        let input = TransformData::Xml {
            node_set: Some(node_set),
        };
        let octets = transforms::run(&reference.transforms, doc, signature, input)?;
        let computed = digest::digest(&reference.digest_method, &octets)
            .map_err(|e| Error::ReferenceIntegrity(e.to_string()))?;
        if computed != reference.decoded_digest()? {
            return Err(Error::ReferenceIntegrity(format!(
                "digest mismatch for URI \"{}\"",
                reference.uri
            )));
        }
        tracing::debug!(
            reference_uri = %reference.uri,
            digest_method = %reference.digest_method,
            "reference digest matches"
        );

        let signed_info_set = NodeSet::tree_without_comments(signed_info.node);
        let canonical_signed_info = canonicalize_doc(
            doc,
            signed_info.c14n_mode,
            Some(&signed_info_set),
            &signed_info.inclusive_prefixes,
        )
        .map_err(|e| Error::ReferenceIntegrity(e.to_string()))?;

        Ok(ValidatedReference {
            signature,
            signed_info,
            signed_element,
            assertion,
            canonical_signed_info,
        })
    }
}

fn single_assertion<'a, 'input>(
    doc: &'a Document<'input>,
    root: Node<'a, 'input>,
) -> Result<Node<'a, 'input>, Error> {
    let assertions: Vec<Node<'a, 'input>> = doc
        .descendants()
        .filter(|n| is_named(n, ns::SAML_ASSERTION, ns::node::ASSERTION))
        .collect();
    match assertions.as_slice() {
        [only] if only.parent() == Some(root) => Ok(*only),
        [_] => Err(Error::ReferenceIntegrity(
            "assertion is not a child of the response".into(),
        )),
        found => Err(Error::ReferenceIntegrity(format!(
            "expected exactly one assertion, found {}",
            found.len()
        ))),
    }
}
