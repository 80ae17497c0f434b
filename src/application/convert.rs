//! Conversion from the block schema to the node schema.
//!
//! Conversion is total: every block either maps to its node equivalent or is
//! skipped. Inline markup becomes flat text nodes carrying the marks of the
//! tags that enclosed them.

use serde_json::Value;
use tracing::debug;

use crate::domain::{
    document::{
        Block, BlockDocument, BlockKind, ListItem, ListStyle, Mark, MarkKind, Node, NodeDocument,
        NodeKind,
    },
    markup::{InlineRun, inline_runs, plain_text},
};

/// Convert a block document into the equivalent node document.
pub fn convert_legacy_to_modern(doc: &BlockDocument) -> NodeDocument {
    NodeDocument::new(doc.blocks.iter().filter_map(convert_block).collect())
}

fn convert_block(block: &Block) -> Option<Node> {
    let node = match &block.kind {
        BlockKind::Header { level, text } => Node::new(NodeKind::Heading)
            .with_attr("level", *level)
            .with_content(inline_nodes(text)),
        BlockKind::Paragraph { text } => paragraph(text),
        BlockKind::List { style, items } => convert_list(*style, items),
        BlockKind::Code { code, language } => {
            let language = language
                .as_ref()
                .map_or(Value::Null, |language| Value::String(language.clone()));
            let content = if code.is_empty() {
                Vec::new()
            } else {
                vec![Node::text(code.as_str(), Vec::new())]
            };
            Node::new(NodeKind::CodeBlock)
                .with_attr("language", language)
                .with_content(content)
        }
        BlockKind::Quote { text, caption } => {
            let mut content = vec![paragraph(text)];
            if let Some(caption) = caption {
                content.push(caption_paragraph(caption));
            }
            Node::new(NodeKind::Blockquote).with_content(content)
        }
        BlockKind::Delimiter => Node::new(NodeKind::HorizontalRule),
        BlockKind::Image { url, caption } => {
            let alt = caption
                .as_deref()
                .map(|caption| plain_text(caption).trim().to_string())
                .unwrap_or_default();
            Node::new(NodeKind::Image)
                .with_attr("src", url.as_str())
                .with_attr("alt", alt)
        }
        BlockKind::Unknown { type_name } => {
            debug!(
                target = "richdoc::convert",
                block_type = %type_name,
                "skipping unconvertible block"
            );
            return None;
        }
    };
    Some(node)
}

fn paragraph(markup: &str) -> Node {
    Node::new(NodeKind::Paragraph).with_content(inline_nodes(markup))
}

/// Captions have no slot in the node schema; they follow the quote as an
/// italic paragraph.
fn caption_paragraph(markup: &str) -> Node {
    let content = inline_nodes(markup)
        .into_iter()
        .map(|mut node| {
            if node.kind == NodeKind::Text && !node.marks.iter().any(|m| m.kind == MarkKind::Italic)
            {
                node.marks.insert(0, Mark::new(MarkKind::Italic));
            }
            node
        })
        .collect();
    Node::new(NodeKind::Paragraph).with_content(content)
}

fn convert_list(style: ListStyle, items: &[ListItem]) -> Node {
    let kind = match style {
        ListStyle::Ordered => NodeKind::OrderedList,
        ListStyle::Unordered => NodeKind::BulletList,
    };

    let entries = items
        .iter()
        .map(|item| {
            let mut content = vec![paragraph(&item.content)];
            if !item.items.is_empty() {
                content.push(convert_list(style, &item.items));
            }
            Node::new(NodeKind::ListItem).with_content(content)
        })
        .collect();

    Node::new(kind).with_content(entries)
}

fn inline_nodes(markup: &str) -> Vec<Node> {
    inline_runs(markup)
        .into_iter()
        .map(|run| match run {
            InlineRun::Text { text, marks } => Node::text(text, marks),
            InlineRun::Break => Node::new(NodeKind::HardBreak),
        })
        .collect()
}
