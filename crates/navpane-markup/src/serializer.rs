//! Writes a [`MarkupTree`] back out as markup.

use crate::dom::{MarkupTree, NodeId, NodeKind};

/// Serialize the whole tree.
pub fn serialize(tree: &MarkupTree) -> String {
    let mut out = String::new();
    for &child in &tree.get(tree.root).children {
        write_node(tree, child, &mut out);
    }
    out
}

fn write_node(tree: &MarkupTree, id: NodeId, out: &mut String) {
    let node = tree.get(id);
    match &node.kind {
        NodeKind::Root => {
            for &child in &node.children {
                write_node(tree, child, out);
            }
        },
        NodeKind::Doctype(body) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(body);
            out.push('>');
        },
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        },
        // Text was never decoded, so it goes back out as it came in.
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element(data) => {
            out.push('<');
            out.push_str(data.tag.as_str());
            for attr in &data.attributes {
                out.push(' ');
                out.push_str(&attr.name);
                if attr.has_value {
                    out.push_str("=\"");
                    push_escaped_attr(out, &attr.value);
                    out.push('"');
                }
            }
            out.push('>');
            if data.tag.is_void() {
                return;
            }
            for &child in &node.children {
                write_node(tree, child, out);
            }
            out.push_str("</");
            out.push_str(data.tag.as_str());
            out.push('>');
        },
    }
}

/// Escape text for inclusion in element content or a quoted attribute.
pub fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Owned form of [`push_escaped`].
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
