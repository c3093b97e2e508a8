//! Cheap English detection by stopword ratio.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use reviewgraph_core::config::ENGLISH_STOPWORDS;

static STOPWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

/// Minimum share of stopwords among words for a text to pass as English.
const MIN_STOPWORD_RATIO: f64 = 0.1;

/// Texts this short are too small to judge and always pass.
const MIN_JUDGED_WORDS: usize = 4;

/// True if the text plausibly is English.
pub fn looks_english(text: &str) -> bool {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.len() < MIN_JUDGED_WORDS {
        return true;
    }

    let hits = words.iter().filter(|w| STOPWORDS.contains(w.as_str())).count();
    hits as f64 / words.len() as f64 >= MIN_STOPWORD_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_review_passes() {
        assert!(looks_english("The battery on this phone is not good and it dies fast"));
    }

    #[test]
    fn test_spanish_review_fails() {
        assert!(!looks_english("La batería dura muy poco, la pantalla se rompió rápido"));
    }

    #[test]
    fn test_short_text_passes() {
        assert!(looks_english("Excelente producto"));
        assert!(looks_english(""));
    }
}
