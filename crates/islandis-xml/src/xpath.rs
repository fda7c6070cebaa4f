#![forbid(unsafe_code)]

//! Element lookup for XML-DSig processing.
//!
//! Only supports the patterns the verifier actually uses:
//! - Same-document URI references: `#id-value`
//! - ID resolution over a pre-built, duplicate-aware ID map
//! - Namespace-qualified child and descendant lookup

use islandis_core::Error;
use roxmltree::{Document, Node, NodeId};
use std::collections::HashMap;

/// Parse a same-document reference (e.g., `#foo` → `foo`).
pub fn parse_same_document_ref(uri: &str) -> Option<&str> {
    uri.strip_prefix('#')
}

/// Every element carrying an ID attribute, keyed by the ID value.
///
/// Values that appear on more than one element are kept with all their
/// owners so that lookups can refuse them.
#[derive(Debug, Default)]
pub struct IdMap {
    ids: HashMap<String, Vec<NodeId>>,
}

impl IdMap {
    /// Scan the document for the given ID attribute names.
    pub fn build(doc: &Document<'_>, attr_names: &[&str]) -> Self {
        let mut ids: HashMap<String, Vec<NodeId>> = HashMap::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            for attr_name in attr_names {
                if let Some(val) = node.attribute(*attr_name) {
                    ids.entry(val.to_owned()).or_default().push(node.id());
                }
            }
        }
        Self { ids }
    }

    /// Resolve an ID value to its unique element.
    pub fn resolve<'a, 'input>(
        &self,
        doc: &'a Document<'input>,
        id: &str,
    ) -> Result<Node<'a, 'input>, Error> {
        match self.ids.get(id).map(Vec::as_slice) {
            Some([only]) => doc
                .get_node(*only)
                .ok_or_else(|| Error::ReferenceIntegrity(format!("ID not found: {id}"))),
            Some([]) | None => Err(Error::ReferenceIntegrity(format!("ID not found: {id}"))),
            Some(_) => Err(Error::ReferenceIntegrity(format!(
                "ID is not unique: {id}"
            ))),
        }
    }
}

/// First descendant element (document order) with the given name.
pub fn find_element<'a, 'input>(
    doc: &'a Document<'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    doc.descendants().find(|n| is_named(n, ns_uri, local_name))
}

pub fn find_child_element<'a, 'input>(
    parent: Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    parent.children().find(|n| is_named(n, ns_uri, local_name))
}

pub fn find_child_elements<'a, 'input>(
    parent: Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<Node<'a, 'input>> {
    parent
        .children()
        .filter(|n| is_named(n, ns_uri, local_name))
        .collect()
}

/// Follow a path of child elements, all in one namespace.
pub fn find_path<'a, 'input>(
    start: Node<'a, 'input>,
    ns_uri: &str,
    path: &[&str],
) -> Option<Node<'a, 'input>> {
    path.iter()
        .try_fold(start, |node, name| find_child_element(node, ns_uri, name))
}

/// True if `node` is an element with this namespace and local name.
pub fn is_named(node: &Node<'_, '_>, ns_uri: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns_uri
}

/// Concatenated text of all descendant text nodes.
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_same_document_ref() {
        assert_eq!(parse_same_document_ref("#abc"), Some("abc"));
        assert_eq!(parse_same_document_ref("http://x"), None);
    }

    #[test]
    fn test_id_map() {
        let doc = Document::parse(r#"<r><a ID="one"/><b ID="two"/><c ID="two"/></r>"#).unwrap();
        let map = IdMap::build(&doc, &["ID"]);

        let one = map.resolve(&doc, "one").unwrap();
        assert!(one.has_tag_name("a"));

        assert!(matches!(map.resolve(&doc, "two"), Err(Error::ReferenceIntegrity(_))));
        assert!(matches!(map.resolve(&doc, "three"), Err(Error::ReferenceIntegrity(_))));
    }

    #[test]
    fn test_find_path() {
        let doc = Document::parse(
            r#"<p:r xmlns:p="urn:p"><p:a><p:b>hit</p:b></p:a><a><b>miss</b></a></p:r>"#,
        )
        .unwrap();
        let b = find_path(doc.root_element(), "urn:p", &["a", "b"]).unwrap();
        assert_eq!(b.text(), Some("hit"));
        assert!(find_path(doc.root_element(), "urn:p", &["a", "c"]).is_none());
        assert_eq!(find_child_elements(doc.root_element(), "", "a").len(), 1);
    }

    #[test]
    fn test_text_content() {
        let doc = Document::parse("<a>one<b>two</b><!--x-->three</a>").unwrap();
        assert_eq!(text_content(doc.root_element()), "onetwothree");
    }
}
