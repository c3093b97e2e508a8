//! Currency amount extraction.

use std::collections::BTreeSet;

use regex::Regex;
use reviewgraph_core::{Error, Price, Result};

/// Applies an ordered list of amount patterns case-insensitively.
pub struct PriceExtractor {
    patterns: Vec<Regex>,
}

impl PriceExtractor {
    /// Compile price patterns. Each must capture the amount in group 1.
    pub fn new(sources: &[String]) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|src| {
                let re = Regex::new(&format!("(?i){}", src))
                    .map_err(|e| Error::Config(format!("price pattern {:?}: {}", src, e)))?;
                if re.captures_len() < 2 {
                    return Err(Error::Config(format!(
                        "price pattern {:?} has no capture group",
                        src
                    )));
                }
                Ok(re)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Ascending, deduplicated amounts found in `text`.
    pub fn extract(&self, text: &str) -> Vec<Price> {
        let mut found = BTreeSet::new();
        for re in &self.patterns {
            for cap in re.captures_iter(text) {
                if let Some(price) = cap.get(1).and_then(|m| Price::parse(m.as_str())) {
                    found.insert(price);
                }
            }
        }
        found.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use reviewgraph_core::ExtractorPatterns;

    fn extractor() -> PriceExtractor {
        PriceExtractor::new(&ExtractorPatterns::default().prices).unwrap()
    }

    fn formatted(text: &str) -> Vec<String> {
        extractor().extract(text).iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_currency_prefixed() {
        assert_eq!(formatted("I bought the XYZ-200 for $49.99 on March 3"), vec!["$49.99"]);
    }

    #[test]
    fn test_all_phrasings_sorted_and_deduped() {
        let text = "Price: 30 and I paid $ 12.5, about 12.50 dollars, later 7$ and COST 30";
        assert_eq!(formatted(text), vec!["$7.00", "$12.50", "$30.00"]);
    }

    #[test]
    fn test_no_amounts() {
        assert!(formatted("no money talk here, model 200").is_empty());
    }

    #[test]
    fn test_pattern_without_group_is_rejected() {
        let err = PriceExtractor::new(&[r"\$\d+".to_string()]).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    proptest! {
        #[test]
        fn prop_prices_sorted_unique_and_formatted(
            amounts in proptest::collection::vec((0u32..100_000, 0u32..100), 0..6)
        ) {
            let text = amounts
                .iter()
                .map(|(d, c)| format!("paid ${}.{:02} ", d, c))
                .collect::<String>();
            let prices = extractor().extract(&text);
            for pair in prices.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            for p in &prices {
                let s = p.to_string();
                let (dollars, cents) = s[1..].split_once('.').unwrap();
                prop_assert!(s.starts_with('$'));
                prop_assert!(dollars.chars().all(|c| c.is_ascii_digit()));
                prop_assert_eq!(cents.len(), 2);
            }
        }
    }
}
