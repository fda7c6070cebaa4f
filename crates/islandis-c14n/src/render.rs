#![forbid(unsafe_code)]

//! Shared rendering for C14N output: escaping, namespace declarations,
//! attributes and the node kinds both variants render identically.

use std::cmp::Ordering;

use roxmltree::{Node, NodeType};

/// Escape text node content.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape an attribute or namespace value.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A namespace declaration to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    /// The prefix ("" for default namespace).
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn new(prefix: &str, uri: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            uri: uri.to_owned(),
        }
    }

    pub fn render(&self) -> String {
        if self.prefix.is_empty() {
            format!(" xmlns=\"{}\"", escape_attr(&self.uri))
        } else {
            format!(" xmlns:{}=\"{}\"", self.prefix, escape_attr(&self.uri))
        }
    }
}

impl Ord for NsDecl {
    // Default namespace first, then by prefix.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.prefix.is_empty(), other.prefix.is_empty()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => self.prefix.cmp(&other.prefix),
        }
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Namespace URI, "" for none.
    pub ns_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn render(&self) -> String {
        format!(" {}=\"{}\"", self.qualified_name, escape_attr(&self.value))
    }
}

impl Ord for Attr {
    // Unqualified attributes first, then by (namespace URI, local name).
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.ns_uri.is_empty(), other.ns_uri.is_empty()) {
            (true, true) => self.local_name.cmp(&other.local_name),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .ns_uri
                .cmp(&other.ns_uri)
                .then(self.local_name.cmp(&other.local_name)),
        }
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Write `<name decls attrs>`.
pub fn start_tag(output: &mut Vec<u8>, name: &str, ns_decls: &[NsDecl], attrs: &[Attr]) {
    output.push(b'<');
    output.extend_from_slice(name.as_bytes());
    for decl in ns_decls {
        output.extend_from_slice(decl.render().as_bytes());
    }
    for attr in attrs {
        output.extend_from_slice(attr.render().as_bytes());
    }
    output.push(b'>');
}

pub fn end_tag(output: &mut Vec<u8>, name: &str) {
    output.extend_from_slice(b"</");
    output.extend_from_slice(name.as_bytes());
    output.push(b'>');
}

/// Render a visible text, comment or processing-instruction node.
///
/// Comments and PIs that are children of the document root are separated
/// from the document element by a single line feed.
pub fn write_leaf(node: Node<'_, '_>, output: &mut Vec<u8>, with_comments: bool) {
    match node.node_type() {
        NodeType::Text => {
            output.extend_from_slice(escape_text(node.text().unwrap_or("")).as_bytes());
        }
        NodeType::Comment if with_comments => {
            let top_level = before_top_level(node, output);
            output.extend_from_slice(b"<!--");
            output.extend_from_slice(node.text().unwrap_or("").as_bytes());
            output.extend_from_slice(b"-->");
            after_top_level(node, output, top_level);
        }
        NodeType::PI => {
            let Some(pi) = node.pi() else { return };
            let top_level = before_top_level(node, output);
            output.extend_from_slice(b"<?");
            output.extend_from_slice(pi.target.as_bytes());
            if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                output.push(b' ');
                output.extend_from_slice(value.replace('\r', "&#xD;").as_bytes());
            }
            output.extend_from_slice(b"?>");
            after_top_level(node, output, top_level);
        }
        _ => {}
    }
}

fn before_top_level(node: Node<'_, '_>, output: &mut Vec<u8>) -> bool {
    let top_level = node
        .parent()
        .is_some_and(|p| p.node_type() == NodeType::Root);
    if top_level && node.prev_siblings().any(|s| s.is_element()) {
        output.push(b'\n');
    }
    top_level
}

fn after_top_level(node: Node<'_, '_>, output: &mut Vec<u8>, top_level: bool) {
    if top_level && node.next_siblings().any(|s| s.is_element()) {
        output.push(b'\n');
    }
}
