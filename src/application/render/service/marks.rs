use crate::application::render::types::{DisplayNode, Element, Tag};
use crate::domain::document::{Mark, MarkKind};

use super::RenderOptions;

/// Wrap `text` in one element per mark, in listed order: the first mark is
/// the innermost wrapper and the last mark the outermost.
pub(crate) fn compose_marks(text: &str, marks: &[Mark], options: &RenderOptions) -> DisplayNode {
    marks
        .iter()
        .fold(DisplayNode::text(text), |inner, mark| wrap(mark, inner, options))
}

fn wrap(mark: &Mark, inner: DisplayNode, options: &RenderOptions) -> DisplayNode {
    let element = match &mark.kind {
        MarkKind::Bold => Element::new(Tag::Strong),
        MarkKind::Italic => Element::new(Tag::Em),
        MarkKind::Code => Element::new(Tag::Code),
        MarkKind::Highlight => Element::new(Tag::Mark),
        MarkKind::Strike => Element::new(Tag::S),
        MarkKind::Link => match mark.href().and_then(|href| options.permitted_url(href)) {
            Some(href) => external_link(href),
            None => return inner,
        },
        MarkKind::Other(_) => return inner,
    };
    element.child(inner).into()
}

/// Anchor opening in a new browsing context without leaking opener or referrer.
pub(crate) fn external_link(href: &str) -> Element {
    Element::new(Tag::A)
        .attr("href", href)
        .attr("target", "_blank")
        .attr("rel", "noopener noreferrer")
}
