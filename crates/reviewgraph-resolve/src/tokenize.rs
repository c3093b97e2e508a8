//! Tokenization shared by index construction and queries.

use std::collections::HashSet;

use reviewgraph_core::TokenizerConfig;

/// Lowercases, splits on anything that is not a letter or digit, and drops
/// stopwords, short tokens, pure-digit tokens and noise tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stopwords: HashSet<String>,
    noise: HashSet<String>,
    max_dropped_len: usize,
}

impl Tokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            stopwords: config.stopwords.iter().map(|s| s.to_lowercase()).collect(),
            noise: config.noise_tokens.iter().map(|s| s.to_lowercase()).collect(),
            max_dropped_len: config.max_dropped_len,
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| self.keep(t))
            .map(str::to_string)
            .collect()
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() > self.max_dropped_len
            && !token.chars().all(|c| c.is_ascii_digit())
            && !self.stopwords.contains(token)
            && !self.noise.contains(token)
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_stopwords_short_digits_noise() {
        let tok = Tokenizer::default();
        assert_eq!(
            tok.tokenize("The battery died after 200 days, br br it is BAD!"),
            vec!["battery", "died", "days", "bad"]
        );
    }

    #[test]
    fn test_keeps_accented_and_alphanumeric() {
        let tok = Tokenizer::default();
        assert_eq!(tok.tokenize("Batería XYZ-200 a1b2"), vec!["batería", "xyz", "a1b2"]);
    }

    #[test]
    fn test_only_noise_is_empty() {
        let tok = Tokenizer::default();
        assert!(tok.tokenize("a an the 12 345 www.com").is_empty());
        assert!(tok.tokenize("").is_empty());
    }

    #[test]
    fn test_custom_config() {
        let tok = Tokenizer::new(&TokenizerConfig {
            stopwords: vec!["el".into(), "de".into()],
            max_dropped_len: 0,
            noise_tokens: vec![],
        });
        assert_eq!(tok.tokenize("el precio de la tv"), vec!["precio", "la", "tv"]);
    }
}
