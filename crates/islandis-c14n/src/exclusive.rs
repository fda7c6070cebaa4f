#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only "visibly utilized" namespace declarations are output. A namespace
//! is visibly utilized if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes, OR
//! 3. The prefix appears in the InclusiveNamespaces PrefixList.

use std::collections::{BTreeMap, BTreeSet};

use islandis_core::Error;
use islandis_xml::NodeSet;
use roxmltree::{Document, Node, NodeType};

use crate::names;
use crate::render::{self, Attr, NsDecl};

/// Canonicalize using Exclusive C14N 1.0.
pub fn canonicalize(
    doc: &Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let inclusive_prefixes = inclusive_prefixes
        .iter()
        .map(|p| if p == "#default" { String::new() } else { p.clone() })
        .collect();
    let ctx = ExcC14nContext {
        doc,
        with_comments,
        node_set,
        inclusive_prefixes,
    };
    let mut output = Vec::new();
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new());
    Ok(output)
}

struct ExcC14nContext<'a, 'input> {
    doc: &'a Document<'input>,
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    inclusive_prefixes: BTreeSet<String>,
}

impl ExcC14nContext<'_, '_> {
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
            for child in node.children() {
                self.process_node(child, output, rendered_ns);
            }
            return;
        }

        let mut utilized: BTreeSet<String> = self.inclusive_prefixes.clone();
        utilized.insert(names::element_prefix(self.doc, node).to_owned());

        let mut attrs: Vec<Attr> = Vec::new();
        for attr in node.attributes() {
            let prefix = names::attribute_prefix(self.doc, &attr);
            let qualified_name = match &prefix {
                Some(p) => format!("{p}:{}", attr.name()),
                None => attr.name().to_owned(),
            };
            if let Some(p) = prefix {
                utilized.insert(p.to_owned());
            }
            attrs.push(Attr {
                ns_uri: attr.namespace().unwrap_or("").to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name,
                value: attr.value().to_owned(),
            });
        }
        attrs.sort();

        let inscope = names::inscope_namespaces(node);
        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for prefix in utilized.iter().filter(|p| p.as_str() != "xml") {
            match inscope.get(prefix) {
                Some(uri) if rendered_ns.get(prefix) != Some(uri) => {
                    ns_decls.push(NsDecl::new(prefix, uri));
                }
                None if prefix.is_empty()
                    && rendered_ns.get("").is_some_and(|d| !d.is_empty()) =>
                {
                    ns_decls.push(NsDecl::new("", ""));
                }
                _ => {}
            }
        }
        ns_decls.sort();

        let name = names::element_qname(self.doc, node);
        render::start_tag(output, name, &ns_decls, &attrs);

        let mut child_ns = rendered_ns.clone();
        for decl in &ns_decls {
            child_ns.insert(decl.prefix.clone(), decl.uri.clone());
        }
        for child in node.children() {
            self.process_node(child, output, &child_ns);
        }

        render::end_tag(output, name);
    }
}
