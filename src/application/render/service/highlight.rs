use metrics::counter;
use once_cell::sync::Lazy;
use syntect::{
    easy::HighlightLines,
    highlighting::{Color, FontStyle, Style, Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};
use tracing::warn;

use crate::application::render::types::{
    CodeHighlighter, DisplayNode, Element, HighlightError, Highlighted, SpanStyle, StyledSpan, Tag,
};

pub const DEFAULT_THEME: &str = "InspiredGitHub";

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(two_face::syntax::extra_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Names of the bundled highlighting themes.
pub fn available_themes() -> Vec<String> {
    THEME_SET.themes.keys().cloned().collect()
}

/// Syntect-backed highlighter emitting inline-styled spans.
pub struct SyntectHighlighter {
    theme: Theme,
}

impl SyntectHighlighter {
    pub fn new(theme_name: &str) -> Result<Self, HighlightError> {
        let theme = THEME_SET
            .themes
            .get(theme_name)
            .cloned()
            .ok_or_else(|| HighlightError::UnknownTheme {
                name: theme_name.to_string(),
            })?;
        Ok(Self { theme })
    }

    /// Like [`SyntectHighlighter::new`], falling back to the default theme.
    pub fn new_or_default(theme_name: &str) -> Self {
        Self::new(theme_name).unwrap_or_else(|err| {
            warn!(
                target = "richdoc::render::highlight",
                error = %err,
                fallback = DEFAULT_THEME,
                "unknown theme; using default"
            );
            let theme = THEME_SET
                .themes
                .get(DEFAULT_THEME)
                .cloned()
                .unwrap_or_default();
            Self { theme }
        })
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new_or_default(DEFAULT_THEME)
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: Option<&str>) -> Result<Highlighted, HighlightError> {
        let syntax = match language {
            Some(token) => find_syntax(&SYNTAX_SET, token),
            None => code
                .lines()
                .next()
                .and_then(|line| SYNTAX_SET.find_syntax_by_first_line(line)),
        }
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

        let language_token = language
            .map(str::to_ascii_lowercase)
            .or_else(|| syntax.file_extensions.first().cloned())
            .unwrap_or_else(|| "text".to_string());

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut spans: Vec<StyledSpan> = Vec::new();

        for line in LinesWithEndings::from(code) {
            let ranges = highlighter
                .highlight_line(line, &SYNTAX_SET)
                .map_err(|err| HighlightError::Highlighting {
                    language: language_token.clone(),
                    message: err.to_string(),
                })?;

            for (style, text) in ranges {
                push_span(&mut spans, span_style(style), text);
            }
        }

        Ok(Highlighted {
            language: language_token,
            spans,
        })
    }
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

fn span_style(style: Style) -> SpanStyle {
    SpanStyle {
        color: Some(hex_color(style.foreground)),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
    }
}

fn hex_color(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn push_span(spans: &mut Vec<StyledSpan>, style: SpanStyle, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut()
        && last.style == style
    {
        last.text.push_str(text);
        return;
    }
    spans.push(StyledSpan {
        text: text.to_string(),
        style,
    });
}

/// Render a code block through the highlighter, falling back to the raw,
/// unstyled text when highlighting fails or returns output that does not
/// reproduce the source.
pub(crate) fn code_block(
    highlighter: &dyn CodeHighlighter,
    code: &str,
    language: Option<&str>,
) -> DisplayNode {
    let language = language.map(str::trim).filter(|token| !token.is_empty());

    let outcome = highlighter.highlight(code, language).and_then(|highlighted| {
        if highlighted.source_text() == code {
            Ok(highlighted)
        } else {
            Err(HighlightError::Malformed)
        }
    });

    match outcome {
        Ok(highlighted) => highlighted_block(highlighted),
        Err(err) => {
            warn!(
                target = "richdoc::render::highlight",
                language = language.unwrap_or("auto"),
                error = %err,
                "highlighting failed; rendering plain code"
            );
            counter!("richdoc_highlight_fallback_total").increment(1);
            plain_block(code, language)
        }
    }
}

fn highlighted_block(highlighted: Highlighted) -> DisplayNode {
    let language = highlighted.language.to_ascii_lowercase();
    let spans = highlighted.spans.into_iter().map(|span| {
        if span.style.is_plain() {
            DisplayNode::text(span.text)
        } else {
            Element::new(Tag::Span)
                .attr("style", span.style.to_css())
                .child(DisplayNode::text(span.text))
                .into()
        }
    });

    let code = Element::new(Tag::Code)
        .attr("class", format!("language-{language} syntax-code"))
        .children(spans);

    Element::new(Tag::Pre)
        .attr("class", format!("syntax-highlight syntax-lang-{language}"))
        .attr("data-language", language)
        .child(code)
        .into()
}

fn plain_block(code: &str, language: Option<&str>) -> DisplayNode {
    let mut pre = Element::new(Tag::Pre).attr("class", "syntax-plain");
    if let Some(language) = language {
        pre = pre.attr("data-language", language.to_ascii_lowercase());
    }
    pre.child(Element::new(Tag::Code).child(DisplayNode::text(code)))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingHighlighter;

    impl CodeHighlighter for FailingHighlighter {
        fn highlight(
            &self,
            _: &str,
            language: Option<&str>,
        ) -> Result<Highlighted, HighlightError> {
            Err(HighlightError::Highlighting {
                language: language.unwrap_or("auto").to_string(),
                message: "boom".to_string(),
            })
        }
    }

    struct TruncatingHighlighter;

    impl CodeHighlighter for TruncatingHighlighter {
        fn highlight(&self, code: &str, _: Option<&str>) -> Result<Highlighted, HighlightError> {
            Ok(Highlighted {
                language: "text".to_string(),
                spans: vec![StyledSpan {
                    text: code.chars().take(1).collect(),
                    style: SpanStyle::default(),
                }],
            })
        }
    }

    fn code_text(node: &DisplayNode) -> String {
        crate::application::render::DisplayTree::new(vec![node.clone()]).plain_text()
    }

    #[test]
    fn syntect_spans_reproduce_source() {
        let highlighter = SyntectHighlighter::default();
        let code = "fn main() {\n    let x = 1;\n}";
        let highlighted = highlighter
            .highlight(code, Some("rust"))
            .expect("rust highlights");

        assert_eq!(highlighted.language, "rust");
        assert_eq!(highlighted.source_text(), code);
        assert!(highlighted.spans.iter().any(|span| span.style.color.is_some()));
    }

    #[test]
    fn unknown_language_uses_plain_text_syntax() {
        let highlighter = SyntectHighlighter::default();
        let highlighted = highlighter
            .highlight("whatever", Some("no-such-language"))
            .expect("plain text highlight");
        assert_eq!(highlighted.language, "no-such-language");
        assert_eq!(highlighted.source_text(), "whatever");
    }

    #[test]
    fn unknown_theme_is_rejected() {
        assert!(matches!(
            SyntectHighlighter::new("no-such-theme"),
            Err(HighlightError::UnknownTheme { .. })
        ));
        assert!(available_themes().iter().any(|name| name == DEFAULT_THEME));
    }

    #[test]
    fn failing_highlighter_falls_back_to_plain_text() {
        let node = code_block(&FailingHighlighter, "let x = 1;", Some("rust"));
        let pre = node.as_element().expect("pre element");

        assert_eq!(pre.tag, Tag::Pre);
        assert_eq!(pre.get_attr("class"), Some("syntax-plain"));
        assert_eq!(
            pre.children[0],
            DisplayNode::Element(Element::new(Tag::Code).child(DisplayNode::text("let x = 1;")))
        );
    }

    #[test]
    fn malformed_output_falls_back_to_plain_text() {
        let node = code_block(&TruncatingHighlighter, "let x = 1;", None);
        let pre = node.as_element().expect("pre element");
        assert_eq!(pre.get_attr("class"), Some("syntax-plain"));
        assert_eq!(code_text(&node), "let x = 1;");
    }

    #[test]
    fn highlighted_block_keeps_code_text() {
        let node = code_block(&SyntectHighlighter::default(), "let x = 1;", Some("Rust"));
        let pre = node.as_element().expect("pre element");
        assert_eq!(pre.get_attr("data-language"), Some("rust"));
        assert_eq!(code_text(&node), "let x = 1;");
    }
}
