#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! The canonical form:
//! - Outputs namespace declarations sorted by prefix (default first)
//! - Outputs attributes sorted by (namespace-URI, local-name)
//! - Escapes text and attribute values per C14N rules
//! - Optionally preserves or strips comments
//! - Supports document-subset canonicalization via NodeSet

use std::collections::BTreeMap;

use islandis_core::{ns, Error};
use islandis_xml::NodeSet;
use roxmltree::{Document, Node, NodeType};

use crate::names;
use crate::render::{self, Attr, NsDecl};

/// Canonicalize a document using Inclusive C14N 1.0.
pub fn canonicalize(
    doc: &Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        doc,
        with_comments,
        node_set,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new());
    Ok(output)
}

struct C14nContext<'a, 'input> {
    doc: &'a Document<'input>,
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
}

impl C14nContext<'_, '_> {
    fn is_visible(&self, node: &Node<'_, '_>) -> bool {
        self.node_set.map_or(true, |set| set.contains(node))
    }

    fn process_node(
        &self,
        node: Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) {
        match node.node_type() {
            NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, rendered_ns);
                }
            }
            NodeType::Element => self.process_element(node, output, rendered_ns),
            _ => {
                if self.is_visible(&node) {
                    render::write_leaf(node, output, self.with_comments);
                }
            }
        }
    }

    fn process_element(
        &self,
        node: Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) {
        if !self.is_visible(&node) {
            // Invisible elements render nothing; descendants still compare
            // against the nearest visible ancestor.
            for child in node.children() {
                self.process_node(child, output, rendered_ns);
            }
            return;
        }

        let inscope = names::inscope_namespaces(node);

        let mut ns_decls: Vec<NsDecl> = inscope
            .iter()
            .filter(|(prefix, uri)| rendered_ns.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl::new(prefix, uri))
            .collect();
        if rendered_ns.get("").is_some_and(|d| !d.is_empty()) && !inscope.contains_key("") {
            ns_decls.push(NsDecl::new("", ""));
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = node
            .attributes()
            .map(|attr| Attr {
                ns_uri: attr.namespace().unwrap_or("").to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name: names::attribute_qname(self.doc, &attr),
                value: attr.value().to_owned(),
            })
            .collect();

        // xml:* attributes are inherited only when the parent was omitted
        // from the node set and therefore did not render its own.
        if self.node_set.is_some() {
            let parent_hidden = node
                .parent()
                .map_or(true, |p| !p.is_element() || !self.is_visible(&p));
            if parent_hidden {
                inherit_xml_attrs(node, &mut attrs);
            }
        }
        attrs.sort();

        let name = names::element_qname(self.doc, node);
        render::start_tag(output, name, &ns_decls, &attrs);

        let mut child_ns = rendered_ns.clone();
        child_ns.remove("");
        child_ns.extend(inscope);
        for child in node.children() {
            self.process_node(child, output, &child_ns);
        }

        render::end_tag(output, name);
    }
}

fn inherit_xml_attrs(node: Node<'_, '_>, attrs: &mut Vec<Attr>) {
    for ancestor in node.ancestors().skip(1).filter(Node::is_element) {
        for attr in ancestor.attributes() {
            if attr.namespace() != Some(ns::XML) {
                continue;
            }
            let present = attrs
                .iter()
                .any(|a| a.ns_uri == ns::XML && a.local_name == attr.name());
            if !present {
                attrs.push(Attr {
                    ns_uri: ns::XML.to_owned(),
                    local_name: attr.name().to_owned(),
                    qualified_name: format!("xml:{}", attr.name()),
                    value: attr.value().to_owned(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c14n(xml: &str) -> String {
        let doc = Document::parse(xml).unwrap();
        String::from_utf8(canonicalize(&doc, false, None).unwrap()).unwrap()
    }

    #[test]
    fn test_simple_c14n() {
        assert_eq!(
            c14n(r#"<root><a b="1" a="2"/></root>"#),
            r#"<root><a a="2" b="1"></a></root>"#
        );
    }

    #[test]
    fn test_attribute_prefix_from_source() {
        let xml = r#"<r xmlns:a="urn:x" xmlns:b="urn:x" b:n="1"/>"#;
        assert_eq!(
            c14n(xml),
            r#"<r xmlns:a="urn:x" xmlns:b="urn:x" b:n="1"></r>"#
        );
    }

    #[test]
    fn test_namespace_rendering() {
        let xml = r#"<r xmlns="urn:d" xmlns:p="urn:p"><p:c><d/></p:c></r>"#;
        assert_eq!(
            c14n(xml),
            r#"<r xmlns="urn:d" xmlns:p="urn:p"><p:c><d></d></p:c></r>"#
        );
    }

    #[test]
    fn test_default_namespace_undeclared() {
        let xml = r#"<r xmlns="urn:d"><c xmlns=""/></r>"#;
        assert_eq!(c14n(xml), r#"<r xmlns="urn:d"><c xmlns=""></c></r>"#);
    }

    #[test]
    fn test_text_escaping() {
        let xml = "<r a=\"x&quot;y\">a &amp; b &lt; c &gt; d</r>";
        assert_eq!(c14n(xml), "<r a=\"x&quot;y\">a &amp; b &lt; c &gt; d</r>");
    }

    #[test]
    fn test_subset_carries_ancestor_namespaces() {
        let xml = r#"<r xmlns:p="urn:p" xml:lang="is"><p:c>t</p:c></r>"#;
        let doc = Document::parse(xml).unwrap();
        let child = doc.root_element().first_element_child().unwrap();
        let set = NodeSet::tree_without_comments(child);
        let out = canonicalize(&doc, false, Some(&set)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"<p:c xmlns:p="urn:p" xml:lang="is">t</p:c>"#
        );
    }

    #[test]
    fn test_top_level_comments_and_pis() {
        let xml = "<?pi data?><!--c--><r/><!--after-->";
        let doc = Document::parse(xml).unwrap();
        let out = canonicalize(&doc, true, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<?pi data?>\n<!--c-->\n<r></r>\n<!--after-->"
        );
    }
}
