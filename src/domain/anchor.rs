//! Heading anchor identifiers used for table-of-contents navigation.
//!
//! Anchors are derived from the visible heading text: lowercased, every
//! character other than ASCII word characters, whitespace and hyphens
//! removed, and whitespace runs collapsed to single hyphens. The same text
//! always produces the same anchor.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::markup::plain_text;

/// How repeated anchors within one document are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPolicy {
    /// Repeated headings share the same anchor.
    #[default]
    Verbatim,
    /// Repeated anchors receive monotonic suffixes (`intro`, `intro-2`, …).
    Disambiguate,
}

impl AnchorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorPolicy::Verbatim => "verbatim",
            AnchorPolicy::Disambiguate => "disambiguate",
        }
    }
}

impl fmt::Display for AnchorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "verbatim" => Ok(AnchorPolicy::Verbatim),
            "disambiguate" => Ok(AnchorPolicy::Disambiguate),
            other => Err(format!(
                "unknown anchor policy `{other}`, expected `verbatim` or `disambiguate`"
            )),
        }
    }
}

/// Derive the anchor for plain heading text.
///
/// Each whitespace run becomes one hyphen, including runs at either end.
pub fn anchor_id(text: &str) -> String {
    let mut anchor = String::with_capacity(text.len());
    let mut in_whitespace = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                anchor.push('-');
            }
            in_whitespace = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            anchor.push(ch);
            in_whitespace = false;
        }
    }
    anchor
}

/// Derive the anchor for heading text that still carries inline markup.
pub fn anchor_id_from_markup(markup: &str) -> String {
    anchor_id(&plain_text(markup))
}

/// Hands out anchors for the headings of a single document, in order.
#[derive(Debug, Default)]
pub struct AnchorSlugger {
    policy: AnchorPolicy,
    occurrences: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new(policy: AnchorPolicy) -> Self {
        Self {
            policy,
            occurrences: HashMap::new(),
        }
    }

    pub fn anchor_for(&mut self, text: &str) -> String {
        let base = anchor_id(text);
        match self.policy {
            AnchorPolicy::Verbatim => base,
            AnchorPolicy::Disambiguate => {
                let count = self.occurrences.entry(base.clone()).or_insert(0);
                *count += 1;

                if *count == 1 {
                    base
                } else {
                    format!("{base}-{}", *count)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_lowercases_and_hyphenates() {
        assert_eq!(anchor_id("Two Sum"), "two-sum");
        assert_eq!(anchor_id("Sliding   Window\tBasics"), "sliding-window-basics");
    }

    #[test]
    fn surrounding_whitespace_keeps_its_hyphens() {
        assert_eq!(anchor_id(" Intro "), "-intro-");
        assert_eq!(anchor_id("\n  Two Sum\t"), "-two-sum-");
        assert_eq!(anchor_id_from_markup("<b> Intro</b> "), "-intro-");
    }

    #[test]
    fn removed_characters_do_not_split_whitespace_runs() {
        assert_eq!(anchor_id("a ! b"), "a-b");
        assert_eq!(anchor_id("a - b"), "a---b");
    }

    #[test]
    fn anchor_drops_punctuation_but_keeps_hyphens_and_underscores() {
        assert_eq!(anchor_id("What's O(n log n)?"), "whats-on-log-n");
        assert_eq!(anchor_id("two-pointer snake_case"), "two-pointer-snake_case");
    }

    #[test]
    fn anchor_from_markup_strips_tags_and_entities() {
        assert_eq!(
            anchor_id_from_markup("Hello <b>World</b> &amp; <i>Friends</i>"),
            "hello-world-friends"
        );
    }

    #[test]
    fn verbatim_slugger_repeats_anchors() {
        let mut slugger = AnchorSlugger::new(AnchorPolicy::Verbatim);
        assert_eq!(slugger.anchor_for("Overview"), "overview");
        assert_eq!(slugger.anchor_for("Overview"), "overview");
    }

    #[test]
    fn disambiguating_slugger_appends_counter() {
        let mut slugger = AnchorSlugger::new(AnchorPolicy::Disambiguate);
        assert_eq!(slugger.anchor_for("Overview"), "overview");
        assert_eq!(slugger.anchor_for("Overview"), "overview-2");
        assert_eq!(slugger.anchor_for("Summary"), "summary");
        assert_eq!(slugger.anchor_for("Overview"), "overview-3");
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(
            "Disambiguate".parse::<AnchorPolicy>(),
            Ok(AnchorPolicy::Disambiguate)
        );
        assert!("random".parse::<AnchorPolicy>().is_err());
    }
}
