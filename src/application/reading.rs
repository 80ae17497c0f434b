//! Read-time estimation.

use std::num::NonZeroU32;

use serde::Serialize;

use crate::domain::{
    document::{BlockDocument, BlockKind, Document, ListItem, Node, NodeKind},
    markup::word_count,
};

pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;
pub const DEFAULT_SECONDS_PER_IMAGE: u32 = 10;
pub const DEFAULT_SECONDS_PER_CODE_BLOCK: u32 = 30;

/// Reading speed and per-asset dwell time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTimeConfig {
    pub words_per_minute: NonZeroU32,
    pub seconds_per_image: u32,
    pub seconds_per_code_block: u32,
}

impl Default for ReadTimeConfig {
    fn default() -> Self {
        Self {
            words_per_minute: NonZeroU32::new(DEFAULT_WORDS_PER_MINUTE)
                .unwrap_or(NonZeroU32::MIN),
            seconds_per_image: DEFAULT_SECONDS_PER_IMAGE,
            seconds_per_code_block: DEFAULT_SECONDS_PER_CODE_BLOCK,
        }
    }
}

/// What a reader has to get through in one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadingStats {
    pub words: usize,
    pub images: usize,
    pub code_blocks: usize,
}

impl ReadingStats {
    pub fn of_blocks(doc: &BlockDocument) -> Self {
        let mut stats = Self::default();
        for block in &doc.blocks {
            match &block.kind {
                BlockKind::Header { text, .. }
                | BlockKind::Paragraph { text }
                | BlockKind::Quote { text, .. } => stats.words += word_count(text),
                BlockKind::List { items, .. } => stats.words += list_words(items),
                BlockKind::Image { .. } => stats.images += 1,
                BlockKind::Code { .. } => stats.code_blocks += 1,
                BlockKind::Delimiter | BlockKind::Unknown { .. } => {}
            }
        }
        stats
    }

    pub fn of_nodes(nodes: &[Node]) -> Self {
        let mut stats = Self::default();
        for node in nodes {
            stats.add_node(node);
        }
        stats
    }

    pub fn of_document(document: &Document) -> Self {
        match document {
            Document::Block(doc) => Self::of_blocks(doc),
            Document::Node(doc) => Self::of_nodes(&doc.content),
        }
    }

    fn add_node(&mut self, node: &Node) {
        // Marks split a word into several text nodes, so inline content is
        // joined before counting.
        if is_textblock(node) {
            self.words += node.text_content().split_whitespace().count();
            return;
        }

        match &node.kind {
            NodeKind::Heading
            | NodeKind::Paragraph
            | NodeKind::Blockquote
            | NodeKind::BulletList
            | NodeKind::OrderedList
            | NodeKind::ListItem
            | NodeKind::Table
            | NodeKind::TableRow
            | NodeKind::TableHeader
            | NodeKind::TableCell => {
                for child in &node.content {
                    self.add_node(child);
                }
            }
            NodeKind::Text => {
                self.words += node
                    .text
                    .as_deref()
                    .map_or(0, |text| text.split_whitespace().count());
            }
            NodeKind::Image => self.images += 1,
            NodeKind::CodeBlock => self.code_blocks += 1,
            NodeKind::HorizontalRule | NodeKind::HardBreak | NodeKind::Other(_) => {}
        }
    }

    /// Whole minutes, rounded to nearest and never below one.
    pub fn minutes(&self, config: &ReadTimeConfig) -> u32 {
        let seconds_per_word = 60.0 / f64::from(config.words_per_minute.get());
        let seconds = self.words as f64 * seconds_per_word
            + self.images as f64 * f64::from(config.seconds_per_image)
            + self.code_blocks as f64 * f64::from(config.seconds_per_code_block);

        let minutes = (seconds / 60.0).round();
        if minutes < 1.0 { 1 } else { minutes as u32 }
    }
}

fn is_textblock(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Heading | NodeKind::Paragraph | NodeKind::TableHeader | NodeKind::TableCell
    ) && node
        .content
        .iter()
        .all(|child| matches!(child.kind, NodeKind::Text | NodeKind::HardBreak))
}

fn list_words(items: &[ListItem]) -> usize {
    items
        .iter()
        .map(|item| word_count(&item.content) + list_words(&item.items))
        .sum()
}

pub fn estimate_read_minutes(doc: &BlockDocument, config: &ReadTimeConfig) -> u32 {
    ReadingStats::of_blocks(doc).minutes(config)
}

/// Read time for a document of either schema.
pub fn estimate_read_minutes_for(document: &Document, config: &ReadTimeConfig) -> u32 {
    ReadingStats::of_document(document).minutes(config)
}
