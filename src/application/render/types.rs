use serde::Serialize;
use thiserror::Error;

use crate::domain::markup::plain_text;

/// Presentational element kinds the renderers emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    H2,
    H3,
    H4,
    P,
    Ul,
    Ol,
    Li,
    Pre,
    Code,
    Blockquote,
    Cite,
    Hr,
    Br,
    Figure,
    Figcaption,
    Img,
    Table,
    Tbody,
    Tr,
    Th,
    Td,
    Strong,
    Em,
    Mark,
    S,
    A,
    Span,
}

impl Tag {
    /// Heading tag for a presented level; levels outside 2..=4 use `h4`.
    pub fn heading(level: u8) -> Self {
        match level {
            2 => Tag::H2,
            3 => Tag::H3,
            _ => Tag::H4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::P => "p",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Pre => "pre",
            Tag::Code => "code",
            Tag::Blockquote => "blockquote",
            Tag::Cite => "cite",
            Tag::Hr => "hr",
            Tag::Br => "br",
            Tag::Figure => "figure",
            Tag::Figcaption => "figcaption",
            Tag::Img => "img",
            Tag::Table => "table",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Th => "th",
            Tag::Td => "td",
            Tag::Strong => "strong",
            Tag::Em => "em",
            Tag::Mark => "mark",
            Tag::S => "s",
            Tag::A => "a",
            Tag::Span => "span",
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Tag::Hr | Tag::Br | Tag::Img)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: Tag,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DisplayNode>,
}

impl Element {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<DisplayNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = DisplayNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// One node of the renderer output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DisplayNode {
    Element(Element),
    /// Plain text, escaped when painted.
    Text { text: String },
    /// Trusted inline markup from the block schema, injected verbatim.
    Html { html: String },
}

impl DisplayNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn html(html: impl Into<String>) -> Self {
        Self::Html { html: html.into() }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            DisplayNode::Element(element) => Some(element),
            _ => None,
        }
    }

    fn push_plain_text(&self, buffer: &mut String) {
        match self {
            DisplayNode::Element(element) => {
                for child in &element.children {
                    child.push_plain_text(buffer);
                }
            }
            DisplayNode::Text { text } => buffer.push_str(text),
            DisplayNode::Html { html } => buffer.push_str(&plain_text(html)),
        }
    }

    fn collect_elements<'a>(&'a self, tag: Tag, found: &mut Vec<&'a Element>) {
        if let DisplayNode::Element(element) = self {
            if element.tag == tag {
                found.push(element);
            }
            for child in &element.children {
                child.collect_elements(tag, found);
            }
        }
    }
}

impl From<Element> for DisplayNode {
    fn from(element: Element) -> Self {
        DisplayNode::Element(element)
    }
}

/// Renderer output: an ordered forest of display nodes ready for painting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DisplayTree {
    pub nodes: Vec<DisplayNode>,
}

impl DisplayTree {
    pub fn new(nodes: Vec<DisplayNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Visible text of the whole tree, markup removed.
    pub fn plain_text(&self) -> String {
        let mut buffer = String::new();
        for node in &self.nodes {
            node.push_plain_text(&mut buffer);
        }
        buffer
    }

    /// Every element with the given tag, in document order.
    pub fn elements(&self, tag: Tag) -> Vec<&Element> {
        let mut found = Vec::new();
        for node in &self.nodes {
            node.collect_elements(tag, &mut found);
        }
        found
    }
}

/// Visual style of one highlighted span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpanStyle {
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl SpanStyle {
    pub fn is_plain(&self) -> bool {
        self.color.is_none() && !self.bold && !self.italic && !self.underline
    }

    pub fn to_css(&self) -> String {
        let mut declarations = Vec::new();
        if let Some(color) = &self.color {
            declarations.push(format!("color:{color}"));
        }
        if self.bold {
            declarations.push("font-weight:bold".to_string());
        }
        if self.italic {
            declarations.push("font-style:italic".to_string());
        }
        if self.underline {
            declarations.push("text-decoration:underline".to_string());
        }
        declarations.join(";")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

/// Highlighter output: styled spans that concatenate back to the source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlighted {
    /// Language token the code was highlighted as.
    pub language: String,
    pub spans: Vec<StyledSpan>,
}

impl Highlighted {
    pub fn source_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Error)]
pub enum HighlightError {
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
    #[error("highlighter output does not reproduce the source code")]
    Malformed,
    #[error("unknown highlighting theme `{name}`")]
    UnknownTheme { name: String },
}

/// Adapter turning raw code into styled spans. Implementations must be pure
/// and bounded in time; failures are reported, never panicked.
pub trait CodeHighlighter: Send + Sync {
    fn highlight(&self, code: &str, language: Option<&str>) -> Result<Highlighted, HighlightError>;
}
