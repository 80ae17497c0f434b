use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::application::render::types::{DisplayNode, Element};

pub(super) fn to_html(nodes: &[DisplayNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &DisplayNode, out: &mut String) {
    match node {
        DisplayNode::Element(element) => write_element(element, out),
        DisplayNode::Text { text } => out.push_str(&encode_text(text)),
        DisplayNode::Html { html } => out.push_str(html),
    }
}

fn write_element(element: &Element, out: &mut String) {
    let tag = element.tag.as_str();
    out.push('<');
    out.push_str(tag);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    // Void elements never carry children or a closing tag.
    if element.tag.is_void() {
        return;
    }

    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
