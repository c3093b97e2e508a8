//! Purchase-date extraction. Matches are returned as found, lowercased,
//! with no calendar parsing.

use std::collections::BTreeSet;

use regex::Regex;
use reviewgraph_core::{Error, Result};

pub struct DateExtractor {
    patterns: Vec<Regex>,
}

impl DateExtractor {
    pub fn new(sources: &[String]) -> Result<Self> {
        let patterns = sources
            .iter()
            .map(|src| {
                Regex::new(src)
                    .map_err(|e| Error::Config(format!("date pattern {:?}: {}", src, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Distinct date strings in `text`. A pattern's `date` group, when
    /// present, narrows the match to the date itself.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut found = BTreeSet::new();
        for re in &self.patterns {
            for cap in re.captures_iter(&lower) {
                let Some(m) = cap.name("date").or_else(|| cap.get(0)) else {
                    continue;
                };
                let value = m.as_str().trim();
                if !value.is_empty() {
                    found.insert(value.to_string());
                }
            }
        }
        found.into_iter().collect()
    }
}
