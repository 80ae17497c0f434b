//! Document rendering.
//!
//! Rendering is pure: a stored document value goes in, a [`DisplayTree`]
//! comes out. Nothing here fails; malformed input degrades to less output and
//! highlighting trouble degrades to plain code.

mod service;
mod types;

pub use service::{
    DEFAULT_THEME, DocumentRenderer, RenderConfigError, RenderOptions, RenderPipelineConfig,
    SyntectHighlighter, available_themes, configure_render_service, render_service,
};
pub use types::{
    CodeHighlighter, DisplayNode, DisplayTree, Element, HighlightError, Highlighted, SpanStyle,
    StyledSpan, Tag,
};
