#![forbid(unsafe_code)]

//! XML-DSig signature creation.
//!
//! Signs an XML document using a template with empty DigestValue and
//! SignatureValue elements. The verifier never signs; this exists for
//! producing test responses and local tooling.

use base64::Engine;
use islandis_c14n::canonicalize_doc;
use islandis_core::{ns, Error, XmlError};
use islandis_crypto::digest;
use islandis_crypto::sign::{self, SigningKey};
use islandis_xml::xpath::{self, IdMap};
use islandis_xml::NodeSet;
use roxmltree::Document;

use crate::signedinfo::SignedInfo;
use crate::transforms::{self, TransformData};

/// Sign an XML template document.
///
/// The template must contain a `<ds:Signature>` element with empty
/// `<ds:DigestValue>` and `<ds:SignatureValue>` elements. Returns the
/// signed XML document as a string.
pub fn sign_template(
    template_xml: &str,
    key: &SigningKey,
    id_attrs: &[&str],
) -> Result<String, Error> {
    let engine = base64::engine::general_purpose::STANDARD;
    let doc = parse(template_xml)?;
    let id_map = IdMap::build(&doc, id_attrs);

    let signature = xpath::find_element(&doc, ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::ReferenceIntegrity("Signature not found".into()))?;
    let signed_info = SignedInfo::read(signature)?;

    let mut result_xml = template_xml.to_owned();
    for reference in &signed_info.references {
        let node_set = if reference.uri.is_empty() {
            NodeSet::all_without_comments(&doc)
        } else {
            let id = xpath::parse_same_document_ref(&reference.uri).ok_or_else(|| {
                Error::ReferenceIntegrity(format!("unsupported URI: {}", reference.uri))
            })?;
            NodeSet::tree_without_comments(id_map.resolve(&doc, id)?)
        };
        let input = TransformData::Xml {
            node_set: Some(node_set),
        };
        let octets = transforms::run(&reference.transforms, &doc, signature, input)?;
        let digest_b64 = engine.encode(digest::digest(&reference.digest_method, &octets)?);
        result_xml = fill_first_empty(&result_xml, "ds:DigestValue", &digest_b64);
    }

    // SignedInfo now contains the digests; canonicalize it from the
    // updated text.
    let updated = parse(&result_xml)?;
    let updated_signature = xpath::find_element(&updated, ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::ReferenceIntegrity("Signature not found".into()))?;
    let updated_info = SignedInfo::read(updated_signature)?;
    let canonical = canonicalize_doc(
        &updated,
        updated_info.c14n_mode,
        Some(&NodeSet::tree_without_comments(updated_info.node)),
        &updated_info.inclusive_prefixes,
    )?;

    let alg = sign::from_uri(&updated_info.signature_method)?;
    let signature_b64 = engine.encode(alg.sign(key, &canonical)?);
    Ok(fill_first_empty(&result_xml, "ds:SignatureValue", &signature_b64))
}

fn parse(xml: &str) -> Result<Document<'_>, Error> {
    Document::parse_with_options(xml, islandis_xml::parsing_options())
        .map_err(|e| XmlError::Parse(e.to_string()).into())
}

/// Put `value` into the first empty `<name>` element, written either as
/// an open/close pair or self-closing.
fn fill_first_empty(xml: &str, name: &str, value: &str) -> String {
    let filled = format!("<{name}>{value}</{name}>");
    let pair = format!("<{name}></{name}>");
    let self_closing = format!("<{name}/>");
    let first = [pair, self_closing]
        .into_iter()
        .filter_map(|pattern| xml.find(&pattern).map(|at| (at, pattern)))
        .min_by_key(|(at, _)| *at);
    match first {
        Some((at, pattern)) => {
            let mut out = String::with_capacity(xml.len() + value.len());
            out.push_str(&xml[..at]);
            out.push_str(&filled);
            out.push_str(&xml[at + pattern.len()..]);
            out
        }
        None => xml.to_owned(),
    }
}
