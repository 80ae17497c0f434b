use metrics::counter;
use tracing::debug;

use crate::application::render::types::{DisplayNode, Element, Tag};
use crate::domain::{
    document::{Block, BlockDocument, BlockKind, ListItem, ListStyle, display_level},
    markup::plain_text,
};

use super::{RenderContext, highlight::code_block};

pub(crate) fn render_blocks(doc: &BlockDocument, ctx: &mut RenderContext<'_>) -> Vec<DisplayNode> {
    doc.blocks
        .iter()
        .filter_map(|block| render_block(block, ctx))
        .collect()
}

fn render_block(block: &Block, ctx: &mut RenderContext<'_>) -> Option<DisplayNode> {
    let node = match &block.kind {
        BlockKind::Header { level, text } => {
            let anchor = ctx.slugger.anchor_for(&plain_text(text));
            let mut heading = Element::new(Tag::heading(display_level(*level)));
            if !anchor.is_empty() {
                heading = heading.attr("id", anchor);
            }
            heading.child(ctx.inline_markup(text)).into()
        }
        BlockKind::Paragraph { text } => Element::new(Tag::P).child(ctx.inline_markup(text)).into(),
        BlockKind::List { style, items } => render_list(*style, items, ctx),
        BlockKind::Code { code, language } => {
            code_block(ctx.highlighter, code, language.as_deref())
        }
        BlockKind::Quote { text, caption } => {
            let mut quote = Element::new(Tag::Blockquote)
                .child(Element::new(Tag::P).child(ctx.inline_markup(text)));
            if let Some(caption) = caption {
                quote = quote.child(Element::new(Tag::Cite).child(ctx.inline_markup(caption)));
            }
            quote.into()
        }
        BlockKind::Delimiter => Element::new(Tag::Hr).into(),
        BlockKind::Image { url, caption } => {
            let alt = caption
                .as_deref()
                .map(|caption| plain_text(caption).trim().to_string())
                .unwrap_or_default();
            let mut figure = Element::new(Tag::Figure).child(
                Element::new(Tag::Img)
                    .attr("src", ctx.options.permitted_url(url).unwrap_or_default())
                    .attr("alt", alt)
                    .attr("loading", "lazy")
                    .attr("decoding", "async"),
            );
            if let Some(caption) = caption {
                figure = figure
                    .child(Element::new(Tag::Figcaption).child(ctx.inline_markup(caption)));
            }
            figure.into()
        }
        BlockKind::Unknown { type_name } => {
            debug!(
                target = "richdoc::render::blocks",
                block_type = %type_name,
                block_id = block.id.as_deref().unwrap_or_default(),
                "skipping unrecognised block"
            );
            counter!("richdoc_skipped_items_total", "schema" => "block").increment(1);
            return None;
        }
    };
    Some(node)
}

/// Nested items repeat the style of the list that contains them.
fn render_list(style: ListStyle, items: &[ListItem], ctx: &RenderContext<'_>) -> DisplayNode {
    let tag = match style {
        ListStyle::Ordered => Tag::Ol,
        ListStyle::Unordered => Tag::Ul,
    };

    Element::new(tag)
        .children(items.iter().map(|item| {
            let mut entry = Element::new(Tag::Li).child(ctx.inline_markup(&item.content));
            if !item.items.is_empty() {
                entry = entry.child(render_list(style, &item.items, ctx));
            }
            entry.into()
        }))
        .into()
}
