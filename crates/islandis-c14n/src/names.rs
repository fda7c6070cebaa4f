#![forbid(unsafe_code)]

//! Prefix and namespace lookups that roxmltree does not expose directly.

use std::collections::BTreeMap;

use roxmltree::{Attribute, Node};

/// The element's qualified name exactly as written in the source.
pub fn element_qname<'a>(doc: &roxmltree::Document<'a>, node: Node<'_, '_>) -> &'a str {
    let text = doc.input_text();
    let start = node.range().start + 1;
    let rest = text.get(start..).unwrap_or("");
    let end = rest
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

/// The element's prefix, "" when unprefixed.
pub fn element_prefix<'a>(doc: &roxmltree::Document<'a>, node: Node<'_, '_>) -> &'a str {
    element_qname(doc, node)
        .split_once(':')
        .map_or("", |(prefix, _)| prefix)
}

/// The attribute's prefix exactly as written in the source, if it has one.
pub fn attribute_prefix<'a>(
    doc: &roxmltree::Document<'a>,
    attr: &Attribute<'_, '_>,
) -> Option<&'a str> {
    attr.namespace()?;
    let qname = doc.input_text().get(attr.range_qname())?;
    qname.split_once(':').map(|(prefix, _)| prefix)
}

pub fn attribute_qname(doc: &roxmltree::Document<'_>, attr: &Attribute<'_, '_>) -> String {
    match attribute_prefix(doc, attr) {
        Some(prefix) => format!("{prefix}:{}", attr.name()),
        None => attr.name().to_owned(),
    }
}

/// Namespaces in scope at `node`, keyed by prefix ("" for the default).
///
/// The `xml` binding and undeclarations (`xmlns=""`) are left out.
pub fn inscope_namespaces(node: Node<'_, '_>) -> BTreeMap<String, String> {
    node.namespaces()
        .filter(|n| !n.uri().is_empty() && n.name() != Some("xml"))
        .map(|n| (n.name().unwrap_or("").to_owned(), n.uri().to_owned()))
        .collect()
}
