//! Whole-word keyword matching for rule tables.

/// Lowercased query text prepared for word and phrase lookups.
///
/// Words are runs of letters and digits; everything else separates them.
/// A keyword matches only on word boundaries, so "bad" does not match
/// "badge" and "new york" matches "New-York".
#[derive(Debug, Clone)]
pub struct QueryText {
    padded: String,
}

fn canonical(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl QueryText {
    pub fn new(text: &str) -> Self {
        Self {
            padded: format!(" {} ", canonical(text)),
        }
    }

    /// True if `keyword` (a word or phrase) occurs on word boundaries.
    pub fn has(&self, keyword: &str) -> bool {
        let kw = canonical(keyword);
        !kw.is_empty() && self.padded.contains(&format!(" {} ", kw))
    }

    /// The keywords from `keywords` that occur, in list order.
    pub fn matching<'a>(&self, keywords: &'a [String]) -> Vec<&'a str> {
        keywords
            .iter()
            .filter(|k| self.has(k))
            .map(String::as_str)
            .collect()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.padded.split_whitespace()
    }

    pub fn is_empty(&self) -> bool {
        self.padded.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_only() {
        let q = QueryText::new("Bad badge, BATTERY!");
        assert!(q.has("bad"));
        assert!(q.has("battery"));
        assert!(!q.has("badg"));
        assert!(!q.has(""));
    }

    #[test]
    fn test_phrases_and_accents() {
        let q = QueryText::new("phones sold in New-York or México");
        assert!(q.has("new york"));
        assert!(q.has("méxico"));
        assert!(!q.has("mexico"));
    }

    #[test]
    fn test_matching_keeps_list_order() {
        let q = QueryText::new("screen and battery");
        let kws = vec!["battery".to_string(), "lag".to_string(), "screen".to_string()];
        assert_eq!(q.matching(&kws), vec!["battery", "screen"]);
        assert_eq!(q.words().collect::<Vec<_>>(), vec!["screen", "and", "battery"]);
    }
}
