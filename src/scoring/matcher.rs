use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumString};

use super::categories::Phrase;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static WORD_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// How a trigger phrase is located inside a message.
///
/// `Substring` is the default and intentionally matches inside larger words,
/// so concatenated or oddly spaced evasions ("sendmeapic", "xxlove youxx")
/// still hit. `WordBoundary` only accepts whole-word sequences and trades
/// those catches for fewer false positives ("hi" no longer matches "this").
/// Under `WordBoundary` the folded phrase must also appear verbatim, so
/// symbols inside a phrase ("i <3 u") are still required.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
pub enum MatchPolicy {
    #[default]
    Substring,
    WordBoundary,
}

/// Case-folds and canonicalises text so messages and phrases compare equal
/// regardless of casing, typographic punctuation or spacing.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' => '-',
            other => other,
        })
        .collect();
    WHITESPACE.replace_all(&folded, " ").trim().to_string()
}

pub fn split_words(text: &str) -> Vec<String> {
    WORD_SPLIT
        .split(text)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A message prepared once per analysis call.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
    text: String,
    words: Vec<String>,
}

impl NormalizedMessage {
    pub fn new(message: &str) -> Self {
        let text = normalize(message);
        let words = split_words(&text);
        Self { text, words }
    }

    pub fn matches(&self, phrase: &Phrase, policy: MatchPolicy) -> bool {
        match policy {
            MatchPolicy::Substring => self.text.contains(phrase.folded()),
            MatchPolicy::WordBoundary => {
                if !self.text.contains(phrase.folded()) {
                    return false;
                }
                let parts = phrase.words();
                // Phrases made only of symbols ("<3") have no words to align.
                parts.is_empty()
                    || self
                        .words
                        .windows(parts.len())
                        .any(|window| window.iter().zip(parts).all(|(w, p)| w == p))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_normalize_folds_case_and_spacing() {
        assert_eq!(normalize("  LOVE\t\n  You  "), "love you");
    }

    #[test]
    fn test_normalize_folds_typographic_punctuation() {
        assert_eq!(normalize("What\u{2019}s your address"), "what's your address");
        assert_eq!(normalize("role\u{2011}play"), "role-play");
    }

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words("what's your address?"),
            vec!["what", "s", "your", "address"]
        );
        assert!(split_words("!!! ...").is_empty());
    }

    #[test]
    fn test_substring_matches_inside_words() {
        let message = NormalizedMessage::new("this");
        let phrase = Phrase::new("hi");
        assert!(message.matches(&phrase, MatchPolicy::Substring));
    }

    #[test]
    fn test_word_boundary_rejects_partial_words() {
        let message = NormalizedMessage::new("this");
        let phrase = Phrase::new("hi");
        assert!(!message.matches(&phrase, MatchPolicy::WordBoundary));

        let message = NormalizedMessage::new("oh hi there");
        assert!(message.matches(&phrase, MatchPolicy::WordBoundary));
    }

    #[test]
    fn test_word_boundary_multi_word_phrase() {
        let phrase = Phrase::new("send me a pic");
        let hit = NormalizedMessage::new("ok, send me a pic!");
        let miss = NormalizedMessage::new("send me a picture");
        assert!(hit.matches(&phrase, MatchPolicy::WordBoundary));
        assert!(!miss.matches(&phrase, MatchPolicy::WordBoundary));
        assert!(miss.matches(&phrase, MatchPolicy::Substring));
    }

    #[test]
    fn test_word_boundary_symbol_only_phrase() {
        let phrase = Phrase::new("<3");
        let message = NormalizedMessage::new("miss you <3");
        assert!(message.matches(&phrase, MatchPolicy::WordBoundary));
    }

    #[test]
    fn test_word_boundary_keeps_symbols_in_mixed_phrase() {
        let phrase = Phrase::new("i <3 u");
        let hit = NormalizedMessage::new("ok I <3 U");
        let miss = NormalizedMessage::new("i u");
        let glued = NormalizedMessage::new("hi <3 u");
        assert!(hit.matches(&phrase, MatchPolicy::WordBoundary));
        assert!(!miss.matches(&phrase, MatchPolicy::WordBoundary));
        assert!(!glued.matches(&phrase, MatchPolicy::WordBoundary));
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(MatchPolicy::WordBoundary.to_string(), "word-boundary");
        assert_eq!(
            MatchPolicy::from_str("substring").unwrap(),
            MatchPolicy::Substring
        );
        assert!(MatchPolicy::from_str("fuzzy").is_err());
    }
}
