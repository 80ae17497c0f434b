use metrics::counter;
use tracing::debug;

use crate::application::render::types::{DisplayNode, Element, Tag};
use crate::domain::document::{DEFAULT_HEADING_LEVEL, ListStyle, Node, NodeKind, display_level};

use super::{RenderContext, highlight::code_block, marks::compose_marks};

pub(crate) fn render_nodes(nodes: &[Node], ctx: &mut RenderContext<'_>) -> Vec<DisplayNode> {
    nodes
        .iter()
        .filter_map(|node| render_node(node, ctx))
        .collect()
}

fn render_node(node: &Node, ctx: &mut RenderContext<'_>) -> Option<DisplayNode> {
    let rendered = match &node.kind {
        NodeKind::Heading => {
            let level = node.attr_i64("level").unwrap_or(DEFAULT_HEADING_LEVEL);
            let anchor = ctx.slugger.anchor_for(&node.text_content());
            let mut heading = Element::new(Tag::heading(display_level(level)));
            if !anchor.is_empty() {
                heading = heading.attr("id", anchor);
            }
            heading.children(render_nodes(&node.content, ctx)).into()
        }
        NodeKind::Paragraph => Element::new(Tag::P)
            .children(render_nodes(&node.content, ctx))
            .into(),
        NodeKind::Blockquote => Element::new(Tag::Blockquote)
            .children(render_nodes(&node.content, ctx))
            .into(),
        NodeKind::BulletList => render_list(node, ListStyle::Unordered, ctx),
        NodeKind::OrderedList => render_list(node, ListStyle::Ordered, ctx),
        NodeKind::ListItem => render_list_item(node, ListStyle::Unordered, ctx),
        NodeKind::CodeBlock => code_block(
            ctx.highlighter,
            &node.text_content(),
            node.attr_str("language"),
        ),
        NodeKind::HorizontalRule => Element::new(Tag::Hr).into(),
        NodeKind::HardBreak => Element::new(Tag::Br).into(),
        NodeKind::Table => render_table(node, ctx),
        NodeKind::Image => {
            let mut image = Element::new(Tag::Img)
                .attr(
                    "src",
                    node.attr_str("src")
                        .and_then(|src| ctx.options.permitted_url(src))
                        .unwrap_or_default(),
                )
                .attr("alt", node.attr_str("alt").unwrap_or_default());
            if let Some(title) = node.attr_str("title").filter(|title| !title.is_empty()) {
                image = image.attr("title", title);
            }
            image
                .attr("loading", "lazy")
                .attr("decoding", "async")
                .into()
        }
        NodeKind::Text => compose_marks(node.text.as_deref()?, &node.marks, ctx.options),
        NodeKind::TableRow | NodeKind::TableHeader | NodeKind::TableCell | NodeKind::Other(_) => {
            debug!(
                target = "richdoc::render::nodes",
                node_type = node.kind.as_str(),
                "skipping unrecognised node"
            );
            counter!("richdoc_skipped_items_total", "schema" => "node").increment(1);
            return None;
        }
    };
    Some(rendered)
}

/// Every nested list takes `style`, whatever its own recorded type.
fn render_list(node: &Node, style: ListStyle, ctx: &mut RenderContext<'_>) -> DisplayNode {
    let tag = match style {
        ListStyle::Ordered => Tag::Ol,
        ListStyle::Unordered => Tag::Ul,
    };

    let items: Vec<DisplayNode> = node
        .content
        .iter()
        .filter(|child| child.kind == NodeKind::ListItem)
        .map(|item| render_list_item(item, style, ctx))
        .collect();

    Element::new(tag).children(items).into()
}

fn render_list_item(item: &Node, style: ListStyle, ctx: &mut RenderContext<'_>) -> DisplayNode {
    let mut entry = Element::new(Tag::Li);
    for child in &item.content {
        if child.is_list() {
            entry = entry.child(render_list(child, style, ctx));
        } else if child.kind == NodeKind::Paragraph {
            entry = entry.children(render_nodes(&child.content, ctx));
        } else if let Some(rendered) = render_node(child, ctx) {
            entry = entry.child(rendered);
        }
    }
    entry.into()
}

/// The first row is a header row; elsewhere only `tableHeader` cells are.
fn render_table(node: &Node, ctx: &mut RenderContext<'_>) -> DisplayNode {
    let mut rows: Vec<DisplayNode> = Vec::with_capacity(node.content.len());

    for (row_index, row) in node.content.iter().enumerate() {
        let mut cells: Vec<DisplayNode> = Vec::with_capacity(row.content.len());
        for cell in &row.content {
            let is_header = row_index == 0 || cell.kind == NodeKind::TableHeader;
            let mut rendered = Element::new(if is_header { Tag::Th } else { Tag::Td });
            if is_header {
                rendered = rendered.attr("scope", "col");
            }
            for span in ["colspan", "rowspan"] {
                if let Some(value) = cell.attr_i64(span).filter(|value| *value > 1) {
                    rendered = rendered.attr(span, value.to_string());
                }
            }
            cells.push(
                rendered
                    .children(render_nodes(&cell.content, ctx))
                    .into(),
            );
        }
        rows.push(Element::new(Tag::Tr).children(cells).into());
    }

    Element::new(Tag::Table)
        .child(Element::new(Tag::Tbody).children(rows))
        .into()
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::application::render::service::{DocumentRenderer, RenderOptions};
    use crate::application::render::types::{DisplayNode, DisplayTree, Element, Tag};

    fn render(value: Value) -> DisplayTree {
        DocumentRenderer::default().render_value(&value)
    }

    fn text(value: &str) -> Value {
        json!({ "type": "text", "text": value })
    }

    #[test]
    fn heading_anchor_uses_descendant_text() {
        let tree = render(json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 3 }, "content": [
                    text("Binary "),
                    { "type": "text", "text": "Search", "marks": [{ "type": "bold" }] }
                ] },
                { "type": "heading", "content": [text("Default level")] }
            ]
        }));

        let h3 = tree.elements(Tag::H3);
        assert_eq!(h3[0].get_attr("id"), Some("binary-search"));
        assert_eq!(
            h3[0].children[1],
            DisplayNode::Element(Element::new(Tag::Strong).child(DisplayNode::text("Search")))
        );
        assert_eq!(tree.elements(Tag::H2)[0].get_attr("id"), Some("default-level"));
    }

    #[test]
    fn unknown_nodes_render_nothing() {
        let tree = render(json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 2 }, "content": [text("Kept")] },
                { "type": "futureWidget", "content": [text("dropped")] }
            ]
        }));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.plain_text(), "Kept");
    }

    #[test]
    fn nested_lists_take_the_parent_style() {
        let tree = render(json!({
            "type": "doc",
            "content": [
                { "type": "orderedList", "content": [
                    { "type": "listItem", "content": [
                        { "type": "paragraph", "content": [text("first")] },
                        { "type": "bulletList", "content": [
                            { "type": "listItem", "content": [
                                { "type": "paragraph", "content": [text("inner")] }
                            ] }
                        ] }
                    ] }
                ] }
            ]
        }));

        assert_eq!(tree.elements(Tag::Ol).len(), 2);
        assert!(tree.elements(Tag::Ul).is_empty());
        let outer_item = tree.elements(Tag::Li)[0];
        assert_eq!(outer_item.children[0], DisplayNode::text("first"));
        assert!(tree.elements(Tag::P).is_empty());
    }

    #[test]
    fn blockquote_renders_block_children() {
        let tree = render(json!({
            "type": "doc",
            "content": [
                { "type": "blockquote", "content": [
                    { "type": "paragraph", "content": [text("one")] },
                    { "type": "paragraph", "content": [text("two")] }
                ] }
            ]
        }));
        let quote = tree.elements(Tag::Blockquote)[0];
        assert_eq!(quote.children.len(), 2);
        assert_eq!(tree.elements(Tag::P).len(), 2);
    }

    #[test]
    fn table_header_cells_follow_row_and_type() {
        let cell = |kind: &str, value: &str| {
            json!({ "type": kind, "content": [{ "type": "paragraph", "content": [text(value)] }] })
        };
        let tree = render(json!({
            "type": "doc",
            "content": [
                { "type": "table", "content": [
                    { "type": "tableRow", "content": [
                        cell("tableCell", "a"),
                        cell("tableCell", "b")
                    ] },
                    { "type": "tableRow", "content": [
                        cell("tableHeader", "c"),
                        cell("tableCell", "d")
                    ] }
                ] }
            ]
        }));

        let headers: Vec<String> = tree
            .elements(Tag::Th)
            .iter()
            .map(|th| DisplayTree::new(vec![DisplayNode::Element((*th).clone())]).plain_text())
            .collect();
        assert_eq!(headers, vec!["a", "b", "c"]);
        assert_eq!(tree.elements(Tag::Td).len(), 1);
    }

    #[test]
    fn links_images_and_breaks() {
        let tree = render(json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "site", "marks": [
                        { "type": "link", "attrs": { "href": "https://example.com" } }
                    ] },
                    { "type": "hardBreak" },
                    text("after")
                ] },
                { "type": "image", "attrs": { "src": "/x.png", "alt": "X" } },
                { "type": "horizontalRule" }
            ]
        }));

        let link = tree.elements(Tag::A)[0];
        assert_eq!(link.get_attr("rel"), Some("noopener noreferrer"));
        assert_eq!(link.get_attr("target"), Some("_blank"));
        assert_eq!(tree.elements(Tag::Br).len(), 1);
        assert_eq!(tree.elements(Tag::Img)[0].get_attr("alt"), Some("X"));
        assert_eq!(tree.elements(Tag::Hr).len(), 1);
    }

    #[test]
    fn code_block_uses_concatenated_text() {
        let tree = render(json!({
            "type": "doc",
            "content": [
                { "type": "codeBlock", "attrs": { "language": "python" }, "content": [
                    text("print('hi')")
                ] }
            ]
        }));
        let pre = tree.elements(Tag::Pre)[0];
        assert_eq!(pre.get_attr("data-language"), Some("python"));
        assert_eq!(tree.plain_text(), "print('hi')");
    }

    #[test]
    fn sanitising_renderer_drops_script_urls() {
        let renderer = DocumentRenderer::with_options(RenderOptions {
            sanitize_inline_html: true,
            ..RenderOptions::default()
        });
        let tree = renderer.render_value(&json!({
            "type": "doc",
            "content": [
                { "type": "paragraph", "content": [
                    { "type": "text", "text": "bad", "marks": [
                        { "type": "link", "attrs": { "href": "javascript:alert(1)" } }
                    ] },
                    { "type": "text", "text": "good", "marks": [
                        { "type": "link", "attrs": { "href": "/docs" } }
                    ] }
                ] },
                { "type": "image", "attrs": { "src": "javascript:alert(1)", "alt": "bad" } },
                { "type": "image", "attrs": { "src": "https://example.com/a.png", "alt": "good" } }
            ]
        }));

        let links = tree.elements(Tag::A);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].get_attr("href"), Some("/docs"));
        let images = tree.elements(Tag::Img);
        assert_eq!(images[0].get_attr("src"), Some(""));
        assert_eq!(images[1].get_attr("src"), Some("https://example.com/a.png"));
        assert!(tree.plain_text().contains("bad"));
    }
}
