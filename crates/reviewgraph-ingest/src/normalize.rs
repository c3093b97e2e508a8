//! Review text normalization.
//!
//! Strips markup, URLs, emails, phone numbers and video-id markers, then
//! replaces any character outside the whitelist (letters, digits, whitespace
//! and `. , ! ? - ' / $ : ( )`) with a space. Digits, currency symbols and
//! date separators survive so extractors can still run on cleaned text.

use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static HTML_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:[A-Za-z]+|#\d+);").expect("valid regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:[a-z][a-z0-9+.\-]*://|www\.)\S+").expect("valid regex")
});
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid regex")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("valid regex"));
static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bVIDEOID:[0-9a-f]{32}\b").expect("valid regex"));
static NON_WHITELIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s.,!?\-'/$:()]").expect("valid regex"));

/// Normalize raw review text. Empty input yields an empty string.
///
/// The result is a fixed point: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut current = clean_pass(raw);
    loop {
        // Stripping can expose a new match (e.g. "ht*tp://"), so repeat to a fixed point
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_pass(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let text = HTML_TAG_RE.replace_all(text, " ");
    let text = HTML_ENTITY_RE.replace_all(&text, " ");
    let text = URL_RE.replace_all(&text, " ");
    let text = EMAIL_RE.replace_all(&text, " ");
    let text = PHONE_RE.replace_all(&text, " ");
    let text = VIDEO_ID_RE.replace_all(&text, " ");
    let text = NON_WHITELIST_RE.replace_all(&text, " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_noise_keeps_extraction_symbols() {
        let raw = "Great <b>phone</b>!! See https://shop.example.com/x?id=1 or mail me@site.org, \
                   call 555-123-4567. Paid $49.99 on 03/03/2022 (model: XYZ-200) 😀";
        let clean = normalize(raw);
        assert_eq!(
            clean,
            "Great phone !! See or mail , call . Paid $49.99 on 03/03/2022 (model: XYZ-200)"
        );
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
        assert_eq!(normalize("<br/>&nbsp;"), "");
    }

    #[test]
    fn test_video_id_marker_removed() {
        let raw = "Watch VIDEOID:0123456789abcdef0123456789abcdef then buy";
        assert_eq!(normalize(raw), "Watch then buy");
    }

    #[test]
    fn test_keeps_accented_letters() {
        assert_eq!(normalize("batería   excelente en México"), "batería excelente en México");
    }

    #[test]
    fn test_exposed_url_is_also_removed() {
        let once = normalize("ht*tp://evil.example now");
        assert_eq!(normalize(&once), once);
        assert!(!once.contains("://"));
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\tthree "), 3);
        assert_eq!(word_count(""), 0);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "\\PC{0,120}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_output_has_no_edge_or_double_spaces(raw in "[a-zA-Z0-9 <>@.$/:&;*-]{0,80}") {
            let clean = normalize(&raw);
            prop_assert_eq!(clean.trim(), clean.as_str());
            prop_assert!(!clean.contains("  "));
        }
    }
}
