//! Table-of-contents extraction.
//!
//! Entries use the same anchors the renderers write into heading `id`s, so a
//! TOC link always lands on its heading.

use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    anchor::{AnchorPolicy, AnchorSlugger},
    document::{
        BlockDocument, BlockKind, DEFAULT_HEADING_LEVEL, Document, Node, NodeDocument, NodeKind,
        display_level,
    },
    markup::plain_text,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    /// Presented heading level, 2 to 4.
    pub level: u8,
}

/// A TOC entry with the entries nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocNode {
    #[serde(flatten)]
    pub entry: TocEntry,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocNode>,
}

pub fn extract_toc(document: &Document, anchors: AnchorPolicy) -> Vec<TocEntry> {
    match document {
        Document::Block(doc) => extract_block_toc(doc, anchors),
        Document::Node(doc) => extract_node_toc(doc, anchors),
    }
}

/// Entries for an undecoded value; unrecognised values have none.
pub fn extract_toc_from_value(value: &Value, anchors: AnchorPolicy) -> Vec<TocEntry> {
    Document::from_value(value)
        .map(|document| extract_toc(&document, anchors))
        .unwrap_or_default()
}

pub fn extract_block_toc(doc: &BlockDocument, anchors: AnchorPolicy) -> Vec<TocEntry> {
    let mut slugger = AnchorSlugger::new(anchors);
    doc.blocks
        .iter()
        .filter_map(|block| match &block.kind {
            BlockKind::Header { level, text } => {
                let text = plain_text(text);
                Some(TocEntry {
                    id: slugger.anchor_for(&text),
                    text,
                    level: display_level(*level),
                })
            }
            _ => None,
        })
        .collect()
}

pub fn extract_node_toc(doc: &NodeDocument, anchors: AnchorPolicy) -> Vec<TocEntry> {
    let mut slugger = AnchorSlugger::new(anchors);
    let mut entries = Vec::new();
    collect_headings(&doc.content, &mut slugger, &mut entries);
    entries
}

// Pre-order, so headings inside blockquotes and list items keep document order.
fn collect_headings(nodes: &[Node], slugger: &mut AnchorSlugger, entries: &mut Vec<TocEntry>) {
    for node in nodes {
        match &node.kind {
            NodeKind::Heading => {
                let text = node.text_content();
                entries.push(TocEntry {
                    id: slugger.anchor_for(&text),
                    text,
                    level: display_level(node.attr_i64("level").unwrap_or(DEFAULT_HEADING_LEVEL)),
                });
            }
            // Unknown subtrees are not rendered, so they contribute no entries.
            NodeKind::Other(_) => {}
            _ => collect_headings(&node.content, slugger, entries),
        }
    }
}

/// Nest flat entries by level: each entry becomes a child of the nearest
/// preceding entry with a smaller level.
pub fn build_toc_tree(entries: &[TocEntry]) -> Vec<TocNode> {
    let parents = parent_indices(entries);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    let mut roots = Vec::new();
    for (idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(idx),
            None => roots.push(idx),
        }
    }

    roots
        .into_iter()
        .map(|idx| assemble(idx, entries, &children))
        .collect()
}

fn parent_indices(entries: &[TocEntry]) -> Vec<Option<usize>> {
    let mut parents = vec![None; entries.len()];
    let mut stack: Vec<(u8, usize)> = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        while let Some(&(level, _)) = stack.last() {
            if level < entry.level {
                break;
            }
            stack.pop();
        }
        parents[idx] = stack.last().map(|&(_, parent)| parent);
        stack.push((entry.level, idx));
    }

    parents
}

fn assemble(idx: usize, entries: &[TocEntry], children: &[Vec<usize>]) -> TocNode {
    TocNode {
        entry: entries[idx].clone(),
        children: children[idx]
            .iter()
            .map(|&child| assemble(child, entries, children))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn entry(id: &str, level: u8) -> TocEntry {
        TocEntry {
            id: id.to_string(),
            text: id.to_string(),
            level,
        }
    }

    #[test]
    fn repeated_headers_share_an_anchor() {
        let value = json!({
            "blocks": [
                { "type": "header", "data": { "level": 2, "text": "Two Sum" } },
                { "type": "paragraph", "data": { "text": "body" } },
                { "type": "header", "data": { "level": 2, "text": "Two Sum" } }
            ]
        });

        let toc = extract_toc_from_value(&value, AnchorPolicy::Verbatim);
        assert_eq!(toc.len(), 2);
        assert!(toc.iter().all(|entry| entry.id == "two-sum"));
        assert!(toc.iter().all(|entry| entry.text == "Two Sum"));
    }

    #[test]
    fn disambiguation_is_opt_in() {
        let value = json!({
            "blocks": [
                { "type": "header", "data": { "level": 2, "text": "Two Sum" } },
                { "type": "header", "data": { "level": 2, "text": "Two Sum" } }
            ]
        });
        let ids: Vec<String> = extract_toc_from_value(&value, AnchorPolicy::Disambiguate)
            .into_iter()
            .map(|entry| entry.id)
            .collect();
        assert_eq!(ids, vec!["two-sum", "two-sum-2"]);
    }

    #[test]
    fn header_markup_is_stripped_and_levels_clamped() {
        let value = json!({
            "blocks": [
                { "type": "header", "data": { "level": 3, "text": "Hello <b>World</b> &amp; co" } },
                { "type": "header", "data": { "level": 1, "text": "Top" } }
            ]
        });
        let toc = extract_toc_from_value(&value, AnchorPolicy::Verbatim);
        assert_eq!(toc[0], TocEntry {
            id: "hello-world-co".to_string(),
            text: "Hello World & co".to_string(),
            level: 3,
        });
        assert_eq!(toc[1].level, 4);
    }

    #[test]
    fn node_headings_are_found_in_nested_content() {
        let value = json!({
            "type": "doc",
            "content": [
                { "type": "heading", "attrs": { "level": 2 }, "content": [
                    { "type": "text", "text": "Intro" }
                ] },
                { "type": "blockquote", "content": [
                    { "type": "heading", "attrs": { "level": 3 }, "content": [
                        { "type": "text", "text": "Quoted ", "marks": [{ "type": "italic" }] },
                        { "type": "text", "text": "Heading" }
                    ] }
                ] },
                { "type": "futureWidget", "content": [
                    { "type": "heading", "content": [{ "type": "text", "text": "Hidden" }] }
                ] }
            ]
        });

        let toc = extract_toc_from_value(&value, AnchorPolicy::Verbatim);
        assert_eq!(toc, vec![
            TocEntry {
                id: "intro".to_string(),
                text: "Intro".to_string(),
                level: 2
            },
            TocEntry {
                id: "quoted-heading".to_string(),
                text: "Quoted Heading".to_string(),
                level: 3
            },
        ]);
    }

    #[test]
    fn unrecognised_values_have_no_entries() {
        assert!(extract_toc_from_value(&json!({ "foo": 1 }), AnchorPolicy::Verbatim).is_empty());
    }

    #[test]
    fn tree_nests_by_level() {
        let entries = vec![
            entry("a", 2),
            entry("a1", 3),
            entry("a1x", 4),
            entry("a2", 3),
            entry("b", 2),
            entry("b1", 4),
        ];

        let tree = build_toc_tree(&entries);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].entry.id, "a1x");
        assert_eq!(tree[1].children[0].entry.id, "b1");
    }

    #[test]
    fn tree_starting_deep_keeps_later_shallow_entries_at_root() {
        let tree = build_toc_tree(&[entry("x", 4), entry("y", 2), entry("z", 3)]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].children[0].entry.id, "z");
    }
}
