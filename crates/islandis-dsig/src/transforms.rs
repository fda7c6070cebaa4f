#![forbid(unsafe_code)]

//! Reference transforms.
//!
//! Only the transforms an enveloped SAML signature uses are accepted:
//! enveloped-signature and the C14N family.

use islandis_c14n::C14nMode;
use islandis_core::{algorithm, ns, Error};
use islandis_xml::xpath::is_named;
use islandis_xml::NodeSet;
use roxmltree::{Document, Node};

/// Data flowing through the transform pipeline.
#[derive(Debug)]
pub enum TransformData {
    /// A node set over the parsed document; `None` means the whole
    /// document.
    Xml { node_set: Option<NodeSet> },
    /// Octets produced by a canonicalization transform.
    Binary(Vec<u8>),
}

impl TransformData {
    /// Convert to octets for digesting. A node set still in XML form is
    /// canonicalized with inclusive C14N 1.0 without comments.
    pub fn into_binary(self, doc: &Document<'_>) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data),
            TransformData::Xml { node_set } => {
                islandis_c14n::canonicalize_doc(doc, C14nMode::Inclusive, node_set.as_ref(), &[])
            }
        }
    }
}

/// One step of a reference's transform chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Drop the enclosing `Signature` subtree from the node set.
    EnvelopedSignature,
    Canonicalize {
        mode: C14nMode,
        inclusive_prefixes: Vec<String>,
    },
}

impl Transform {
    /// Read a `<ds:Transform>` element.
    pub fn from_node(node: Node<'_, '_>) -> Result<Self, Error> {
        let uri = node.attribute(ns::attr::ALGORITHM).unwrap_or("");
        if uri == algorithm::ENVELOPED_SIGNATURE {
            return Ok(Transform::EnvelopedSignature);
        }
        match C14nMode::from_uri(uri) {
            Some(mode) => Ok(Transform::Canonicalize {
                mode,
                inclusive_prefixes: read_inclusive_prefixes(node),
            }),
            None => Err(Error::ReferenceIntegrity(format!(
                "unsupported transform: {uri}"
            ))),
        }
    }

    pub fn execute(
        &self,
        doc: &Document<'_>,
        signature: Node<'_, '_>,
        input: TransformData,
    ) -> Result<TransformData, Error> {
        match (self, input) {
            (Transform::EnvelopedSignature, TransformData::Xml { node_set }) => {
                let mut set = node_set.unwrap_or_else(|| NodeSet::all_without_comments(doc));
                set.remove_subtree(signature);
                Ok(TransformData::Xml {
                    node_set: Some(set),
                })
            }
            (Transform::EnvelopedSignature, TransformData::Binary(_)) => {
                Err(Error::ReferenceIntegrity(
                    "enveloped-signature transform requires XML input".into(),
                ))
            }
            (
                Transform::Canonicalize {
                    mode,
                    inclusive_prefixes,
                },
                TransformData::Xml { node_set },
            ) => {
                let bytes = islandis_c14n::canonicalize_doc(
                    doc,
                    *mode,
                    node_set.as_ref(),
                    inclusive_prefixes,
                )?;
                Ok(TransformData::Binary(bytes))
            }
            (Transform::Canonicalize { .. }, TransformData::Binary(_)) => Err(
                Error::ReferenceIntegrity("canonicalization requires XML input".into()),
            ),
        }
    }
}

/// Read the transforms listed under a `<ds:Reference>`.
pub fn read_transforms(reference: Node<'_, '_>) -> Result<Vec<Transform>, Error> {
    let Some(transforms) = islandis_xml::xpath::find_child_element(
        reference,
        ns::DSIG,
        ns::node::TRANSFORMS,
    ) else {
        return Ok(Vec::new());
    };
    transforms
        .children()
        .filter(|n| is_named(n, ns::DSIG, ns::node::TRANSFORM))
        .map(Transform::from_node)
        .collect()
}

/// Apply `transforms` in order, starting from `input`.
pub fn run(
    transforms: &[Transform],
    doc: &Document<'_>,
    signature: Node<'_, '_>,
    input: TransformData,
) -> Result<Vec<u8>, Error> {
    let mut data = input;
    for transform in transforms {
        data = transform.execute(doc, signature, data)?;
    }
    data.into_binary(doc)
}

/// The `PrefixList` of an `<ec:InclusiveNamespaces>` child, if any.
pub fn read_inclusive_prefixes(node: Node<'_, '_>) -> Vec<String> {
    node.children()
        .find(|n| is_named(n, ns::EXC_C14N, ns::node::INCLUSIVE_NAMESPACES))
        .and_then(|n| n.attribute(ns::attr::PREFIX_LIST))
        .map(|list| list.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}
