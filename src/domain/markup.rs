//! Helpers for the inline HTML-like markup carried by block documents.
//!
//! Markup is tokenised with `lol_html`, so malformed fragments never fail:
//! unknown tags are unwrapped and their text kept.

use std::{cell::RefCell, rc::Rc};

use html_escape::decode_html_entities;
use lol_html::{
    EndTagHandler, HandlerResult, RewriteStrSettings, doc_text, element, html_content::EndTag,
    rewrite_str,
};
use tracing::debug;

use super::document::{Mark, MarkKind};

/// One flat piece of inline content with the marks active around it.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineRun {
    Text { text: String, marks: Vec<Mark> },
    Break,
}

/// Visible text of a markup fragment: tags removed, entities decoded.
pub fn plain_text(markup: &str) -> String {
    if !markup.contains('<') {
        return decode_html_entities(markup).into_owned();
    }

    let collected = Rc::new(RefCell::new(String::with_capacity(markup.len())));

    let result = rewrite_str(
        markup,
        RewriteStrSettings {
            document_content_handlers: vec![doc_text!({
                let collected = Rc::clone(&collected);
                move |chunk| {
                    collected.borrow_mut().push_str(chunk.as_str());
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    );

    if let Err(err) = result {
        debug!(
            target = "richdoc::domain::markup",
            error = %err,
            "markup tokenising failed; using raw text"
        );
        return decode_html_entities(markup).into_owned();
    }

    let raw = collected.borrow();
    decode_html_entities(raw.as_str()).into_owned()
}

/// Whitespace-separated word count of a markup fragment's visible text.
pub fn word_count(markup: &str) -> usize {
    plain_text(markup)
        .split_whitespace()
        .filter(|token| !token.is_empty())
        .count()
}

/// Flatten a markup fragment into text runs, walking the element tree depth
/// first and accumulating the marks of every enclosing recognised tag.
pub fn inline_runs(markup: &str) -> Vec<InlineRun> {
    if markup.is_empty() {
        return Vec::new();
    }

    let state = Rc::new(RefCell::new(InlineState::default()));

    let result = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", {
                let state = Rc::clone(&state);
                move |el| {
                    let tag = el.tag_name();
                    if tag == "br" {
                        state.borrow_mut().push_break();
                        return Ok(());
                    }

                    let mark = Mark::from_tag(&tag, el.get_attribute("href"));
                    if let Some(handlers) = el.end_tag_handlers() {
                        let slot = state.borrow_mut().open(mark);
                        let state = Rc::clone(&state);
                        let handler: EndTagHandler<'static> =
                            Box::new(move |_end: &mut EndTag<'_>| -> HandlerResult {
                                state.borrow_mut().close(slot);
                                Ok(())
                            });
                        handlers.push(handler);
                    }
                    Ok(())
                }
            })],
            document_content_handlers: vec![doc_text!({
                let state = Rc::clone(&state);
                move |chunk| {
                    let text = chunk.as_str();
                    if !text.is_empty() {
                        state.borrow_mut().push_text(text);
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    );

    if let Err(err) = result {
        debug!(
            target = "richdoc::domain::markup",
            error = %err,
            "inline markup tokenising failed; emitting plain text"
        );
        let text = decode_html_entities(markup).into_owned();
        return vec![InlineRun::Text {
            text,
            marks: Vec::new(),
        }];
    }

    let runs = std::mem::take(&mut state.borrow_mut().runs);
    runs.into_iter()
        .filter_map(|run| match run {
            InlineRun::Text { text, marks } => {
                let text = decode_html_entities(&text).into_owned();
                (!text.is_empty()).then_some(InlineRun::Text { text, marks })
            }
            InlineRun::Break => Some(InlineRun::Break),
        })
        .collect()
}

#[derive(Default)]
struct InlineState {
    // One slot per open element; unrecognised tags hold `None`.
    stack: Vec<(usize, Option<Mark>)>,
    next_slot: usize,
    runs: Vec<InlineRun>,
}

impl InlineState {
    fn open(&mut self, mark: Option<Mark>) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.stack.push((slot, mark));
        slot
    }

    /// Closing an element also closes everything opened inside it, so a
    /// misnested end tag never leaves an inner mark dangling.
    fn close(&mut self, slot: usize) {
        if let Some(position) = self.stack.iter().position(|(open, _)| *open == slot) {
            self.stack.truncate(position);
        }
    }

    fn active_marks(&self) -> Vec<Mark> {
        let mut marks: Vec<Mark> = Vec::new();
        for mark in self.stack.iter().filter_map(|(_, mark)| mark.as_ref()) {
            if !marks.iter().any(|existing| existing.kind == mark.kind) {
                marks.push(mark.clone());
            }
        }
        marks
    }

    fn push_text(&mut self, text: &str) {
        let marks = self.active_marks();
        if let Some(InlineRun::Text {
            text: existing,
            marks: existing_marks,
        }) = self.runs.last_mut()
            && *existing_marks == marks
        {
            existing.push_str(text);
            return;
        }
        self.runs.push(InlineRun::Text {
            text: text.to_string(),
            marks,
        });
    }

    fn push_break(&mut self) {
        self.runs.push(InlineRun::Break);
    }
}

impl Mark {
    /// Mark implied by an inline tag, if the tag is one of the recognised ones.
    pub fn from_tag(tag: &str, href: Option<String>) -> Option<Mark> {
        let kind = match tag.to_ascii_lowercase().as_str() {
            "b" | "strong" => MarkKind::Bold,
            "i" | "em" => MarkKind::Italic,
            "code" => MarkKind::Code,
            "mark" => MarkKind::Highlight,
            "s" | "strike" | "del" => MarkKind::Strike,
            "a" => {
                let href = href.filter(|value| !value.trim().is_empty())?;
                return Some(Mark::link(href));
            }
            _ => return None,
        };
        Some(Mark::new(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(text: &str, marks: Vec<Mark>) -> InlineRun {
        InlineRun::Text {
            text: text.to_string(),
            marks,
        }
    }

    #[test]
    fn plain_text_strips_tags() {
        assert_eq!(
            plain_text("Hello <b>World</b>, <a href=\"/x\">link</a>"),
            "Hello World, link"
        );
    }

    #[test]
    fn plain_text_decodes_entities_without_markup() {
        assert_eq!(plain_text("Tom &amp; Jerry&nbsp;"), "Tom & Jerry\u{a0}");
    }

    #[test]
    fn word_count_ignores_markup_and_extra_whitespace() {
        assert_eq!(word_count("  one <i>two</i>\n three  "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("<br>"), 0);
    }

    #[test]
    fn runs_split_on_mark_boundaries() {
        let runs = inline_runs("Hello <b>World</b>");
        assert_eq!(
            runs,
            vec![
                text("Hello ", vec![]),
                text("World", vec![Mark::new(MarkKind::Bold)]),
            ]
        );
    }

    #[test]
    fn nested_tags_accumulate_marks_outermost_first() {
        let runs = inline_runs("<strong>a <em>b</em></strong>");
        assert_eq!(
            runs,
            vec![
                text("a ", vec![Mark::new(MarkKind::Bold)]),
                text(
                    "b",
                    vec![Mark::new(MarkKind::Bold), Mark::new(MarkKind::Italic)]
                ),
            ]
        );
    }

    #[test]
    fn unknown_tags_are_unwrapped() {
        let runs = inline_runs("<span class=\"x\">plain <u>under</u></span>");
        assert_eq!(runs, vec![text("plain under", vec![])]);
    }

    #[test]
    fn links_need_href() {
        let runs = inline_runs("<a href=\"https://example.com\">go</a> <a>nowhere</a>");
        assert_eq!(
            runs,
            vec![
                text("go", vec![Mark::link("https://example.com")]),
                text(" nowhere", vec![]),
            ]
        );
    }

    #[test]
    fn line_breaks_become_break_runs() {
        let runs = inline_runs("one<br>two");
        assert_eq!(
            runs,
            vec![text("one", vec![]), InlineRun::Break, text("two", vec![])]
        );
    }

    #[test]
    fn repeated_marks_are_collapsed() {
        let runs = inline_runs("<b><strong>x</strong></b>");
        assert_eq!(runs, vec![text("x", vec![Mark::new(MarkKind::Bold)])]);
    }

    #[test]
    fn strike_and_highlight_tags_map_to_marks() {
        let runs = inline_runs("<del>a</del><mark>b</mark><code>c</code>");
        assert_eq!(
            runs,
            vec![
                text("a", vec![Mark::new(MarkKind::Strike)]),
                text("b", vec![Mark::new(MarkKind::Highlight)]),
                text("c", vec![Mark::new(MarkKind::Code)]),
            ]
        );
    }

    #[test]
    fn misnested_close_ends_every_mark_opened_inside() {
        let runs = inline_runs("<b>a<i>b</b>c</i>d");
        assert_eq!(
            runs,
            vec![
                text("a", vec![Mark::new(MarkKind::Bold)]),
                text(
                    "b",
                    vec![Mark::new(MarkKind::Bold), Mark::new(MarkKind::Italic)]
                ),
                text("cd", vec![]),
            ]
        );
    }
}
