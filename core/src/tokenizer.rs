use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_MIN_TERM_LEN: usize = 2;

pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref DEFAULT: Tokenizer = Tokenizer::default();
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Terms with fewer characters are dropped unless they are purely numeric.
    pub min_term_len: usize,
    pub stop_words: BTreeSet<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_term_len: DEFAULT_MIN_TERM_LEN,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Turns raw text into normalized terms. Indexing and querying must share one
/// instance (or an equal one) for lookups to line up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl Tokenizer {
    pub fn new(mut config: TokenizerConfig) -> Self {
        // stop words are compared against normalized tokens
        config.stop_words = config.stop_words.iter().map(|w| normalize(w)).collect();
        Self { config }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// NFKC-normalize, lowercase, split on anything that is not a letter or a
    /// digit, then filter short tokens and stop words. Each distinct term is
    /// returned once, in order of first occurrence.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut terms = Vec::new();
        for mat in RE.find_iter(&normalized) {
            let token = mat.as_str();
            if !self.keep(token) || !seen.insert(token) {
                continue;
            }
            terms.push(token.to_string());
        }
        terms
    }

    fn keep(&self, token: &str) -> bool {
        let short = token.chars().count() < self.config.min_term_len;
        if short && !token.chars().all(char::is_numeric) {
            return false;
        }
        !self.config.stop_words.contains(token)
    }
}

fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Tokenize with the default configuration.
pub fn tokenize(text: &str) -> Vec<String> {
    DEFAULT.tokenize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("The Quick-start guide, for 3D and 2d!");
        assert_eq!(t, vec!["quick", "start", "guide", "3d", "2d"]);
    }

    #[test]
    fn numeric_tokens_survive_length_filter() {
        let t = tokenize("step 1 of 5: x");
        assert_eq!(t, vec!["step", "1", "5"]);
    }

    #[test]
    fn custom_stop_words_are_normalized() {
        let tok = Tokenizer::new(TokenizerConfig {
            min_term_len: 3,
            stop_words: ["Napari".to_string()].into_iter().collect(),
        });
        assert_eq!(tok.tokenize("napari plugin is ok"), vec!["plugin"]);
    }
}
