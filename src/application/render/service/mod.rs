mod blocks;
mod highlight;
mod html;
mod marks;
mod nodes;

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::application::render::types::{CodeHighlighter, DisplayNode, DisplayTree};
use crate::domain::{
    anchor::{AnchorPolicy, AnchorSlugger},
    document::{BlockDocument, Document, NodeDocument},
    format::classify,
};

pub use highlight::{DEFAULT_THEME, SyntectHighlighter, available_themes};

/// URL schemes that survive sanitising; relative URLs always do.
const URL_SCHEMES: [&str; 4] = ["http", "https", "mailto", "tel"];

static INLINE_SANITIZER: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut builder = ammonia::Builder::default();
    builder.url_schemes(URL_SCHEMES.iter().copied().collect());
    builder
});

/// Per-renderer behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pass block-schema inline markup through `ammonia`, and drop link and
    /// image URLs with a scheme outside the allowed set.
    pub sanitize_inline_html: bool,
    pub anchors: AnchorPolicy,
}

impl RenderOptions {
    /// `url` as it may be emitted, or `None` when sanitising rejects it.
    pub(crate) fn permitted_url<'u>(&self, url: &'u str) -> Option<&'u str> {
        if !self.sanitize_inline_html {
            return Some(url);
        }
        match url_scheme(url) {
            Some(scheme)
                if !URL_SCHEMES
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(scheme)) =>
            {
                debug!(
                    target = "richdoc::render",
                    scheme,
                    "dropping url with disallowed scheme"
                );
                None
            }
            _ => Some(url),
        }
    }
}

// Browsers ignore leading spaces and control characters before the scheme.
fn url_scheme(url: &str) -> Option<&str> {
    let url = url.trim_start_matches(|ch: char| ch == ' ' || ch.is_ascii_control());
    let end = url.find([':', '/', '?', '#'])?;
    url[end..].starts_with(':').then(|| &url[..end])
}

/// Renders stored documents of either schema into a [`DisplayTree`].
///
/// Rendering is total: unrecognised documents produce an empty tree, unknown
/// block and node types are skipped, and highlighting failures degrade to
/// plain code.
pub struct DocumentRenderer {
    highlighter: Arc<dyn CodeHighlighter>,
    options: RenderOptions,
}

impl DocumentRenderer {
    pub fn new(highlighter: Arc<dyn CodeHighlighter>, options: RenderOptions) -> Self {
        Self {
            highlighter,
            options,
        }
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self::new(Arc::new(SyntectHighlighter::default()), options)
    }

    pub fn with_highlighter(highlighter: Arc<dyn CodeHighlighter>) -> Self {
        Self::new(highlighter, RenderOptions::default())
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Classify a raw stored value and render it with the matching renderer.
    pub fn render_value(&self, value: &Value) -> DisplayTree {
        match Document::from_value(value) {
            Some(document) => self.render_document(&document),
            None => {
                debug!(
                    target = "richdoc::render",
                    format = %classify(value),
                    "document not recognised; rendering nothing"
                );
                DisplayTree::default()
            }
        }
    }

    pub fn render_document(&self, document: &Document) -> DisplayTree {
        match document {
            Document::Block(doc) => self.render_block_document(doc),
            Document::Node(doc) => self.render_node_document(doc),
        }
    }

    pub fn render_block_document(&self, doc: &BlockDocument) -> DisplayTree {
        let mut ctx = self.context();
        DisplayTree::new(blocks::render_blocks(doc, &mut ctx))
    }

    pub fn render_node_document(&self, doc: &NodeDocument) -> DisplayTree {
        let mut ctx = self.context();
        DisplayTree::new(nodes::render_nodes(&doc.content, &mut ctx))
    }

    fn context(&self) -> RenderContext<'_> {
        RenderContext {
            highlighter: self.highlighter.as_ref(),
            options: &self.options,
            slugger: AnchorSlugger::new(self.options.anchors),
        }
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::with_options(RenderOptions::default())
    }
}

/// State for one render pass over one document.
pub(crate) struct RenderContext<'a> {
    pub(crate) highlighter: &'a dyn CodeHighlighter,
    pub(crate) options: &'a RenderOptions,
    pub(crate) slugger: AnchorSlugger,
}

impl RenderContext<'_> {
    /// Block-schema inline markup is trusted and injected as-is unless the
    /// renderer was configured to sanitise it.
    pub(crate) fn inline_markup(&self, markup: &str) -> DisplayNode {
        if self.options.sanitize_inline_html {
            DisplayNode::html(INLINE_SANITIZER.clean(markup).to_string())
        } else {
            DisplayNode::html(markup)
        }
    }
}

impl DisplayTree {
    /// Serialise the tree to an HTML fragment.
    pub fn to_html(&self) -> String {
        html::to_html(&self.nodes)
    }
}

#[derive(Debug, Clone)]
pub struct RenderPipelineConfig {
    pub theme: String,
    pub options: RenderOptions,
}

impl Default for RenderPipelineConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            options: RenderOptions::default(),
        }
    }
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            theme: settings.theme.clone(),
            options: RenderOptions {
                sanitize_inline_html: settings.sanitize_inline_html,
                anchors: settings.anchors,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderConfigError {
    #[error("render service already configured")]
    AlreadyConfigured,
}

static RENDER_PIPELINE_CONFIG: OnceCell<RenderPipelineConfig> = OnceCell::new();

static RENDER_SERVICE: Lazy<Arc<DocumentRenderer>> = Lazy::new(|| {
    let config = active_render_config();
    let highlighter = SyntectHighlighter::new_or_default(&config.theme);
    Arc::new(DocumentRenderer::new(Arc::new(highlighter), config.options))
});

/// Configure the shared renderer. Must run before the first call to
/// [`render_service`]; later configuration is rejected.
pub fn configure_render_service(config: RenderPipelineConfig) -> Result<(), RenderConfigError> {
    RENDER_PIPELINE_CONFIG
        .set(config)
        .map_err(|_| RenderConfigError::AlreadyConfigured)
}

/// Access the shared renderer, initialised on first use.
pub fn render_service() -> Arc<DocumentRenderer> {
    Arc::clone(&RENDER_SERVICE)
}

fn active_render_config() -> RenderPipelineConfig {
    RENDER_PIPELINE_CONFIG.get().cloned().unwrap_or_default()
}
