//! Tree to markup.
//!
//! Text escapes `&`, `<` and `>`; attribute values are double-quoted and
//! escape `&`, `"` and `<`. A self-closing element with no children is
//! written as `<name/>`. Parsing the output again gives the same tree, apart
//! from adjacent text nodes, which come back merged.

use crate::tree::{Document, NodeId, NodeKind};

/// Serialize `node` and everything under it.
pub fn to_string(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

enum Pending {
    Node(NodeId),
    /// End tag of an element whose children were queued.
    EndTag(NodeId),
}

/// Uses its own stack; depth is bounded by memory only.
fn write_node(doc: &Document, root: NodeId, out: &mut String) {
    let mut stack = vec![Pending::Node(root)];
    while let Some(pending) = stack.pop() {
        let id = match pending {
            Pending::Node(id) => id,
            Pending::EndTag(id) => {
                if let Some(NodeKind::Element { name, .. }) = doc.kind(id) {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                }
                continue;
            }
        };
        let Some(kind) = doc.kind(id) else {
            continue;
        };
        match kind {
            NodeKind::Document => {}
            NodeKind::Element {
                name,
                attributes,
                self_closing,
            } => {
                out.push('<');
                out.push_str(name);
                for attr in attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_into(&attr.value, Escape::Attribute, out);
                    out.push('"');
                }
                if *self_closing && doc.children_of(id).is_empty() {
                    out.push_str("/>");
                    continue;
                }
                out.push('>');
                stack.push(Pending::EndTag(id));
            }
            NodeKind::Text(text) => {
                escape_into(text, Escape::Text, out);
                continue;
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
                continue;
            }
        }
        stack.extend(doc.children_of(id).iter().rev().map(|&child| Pending::Node(child)));
    }
}

#[derive(Clone, Copy)]
enum Escape {
    Text,
    Attribute,
}

fn escape_into(s: &str, mode: Escape, out: &mut String) {
    let mut last = 0;
    for (i, b) in s.bytes().enumerate() {
        let replacement = match (b, mode) {
            (b'&', _) => "&amp;",
            (b'<', _) => "&lt;",
            (b'>', Escape::Text) => "&gt;",
            (b'"', Escape::Attribute) => "&quot;",
            _ => continue,
        };
        out.push_str(&s[last..i]);
        out.push_str(replacement);
        last = i + 1;
    }
    out.push_str(&s[last..]);
}
