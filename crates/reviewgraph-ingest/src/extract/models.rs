//! Product-model token extraction.
//!
//! Two pattern layers: label-anchored values ("model: X", "SKU X", and the
//! attributes "Color: Midnight Blue", "version 2.1") and shape-based tokens
//! (`AB-123`, `500GB`, `ABC123`, `A1/B2`, `v2.0`, `12 oz`). Candidates are
//! accepted greedily by precedence: labeled before generic, then longer
//! before shorter, then earlier before later. A candidate overlapping an
//! accepted span, or equal to an accepted value ignoring case, is dropped.
//! Accepted values are returned in text order, truncated to the limit.

use std::collections::HashSet;

use regex::Regex;
use reviewgraph_core::{Error, Result};

struct Candidate {
    start: usize,
    end: usize,
    value: String,
    labeled: bool,
}

impl Candidate {
    fn overlaps(&self, other: &Candidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

pub struct ModelExtractor {
    labeled: Vec<Regex>,
    attributes: Vec<Regex>,
    generic: Vec<Regex>,
    max_models: usize,
}

fn compile(sources: &[String], kind: &str) -> Result<Vec<Regex>> {
    sources
        .iter()
        .map(|src| {
            Regex::new(src).map_err(|e| Error::Config(format!("{} pattern {:?}: {}", kind, src, e)))
        })
        .collect()
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

fn has_letter(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic())
}

impl ModelExtractor {
    pub fn new(
        labeled: &[String],
        attributes: &[String],
        generic: &[String],
        max_models: usize,
    ) -> Result<Self> {
        Ok(Self {
            labeled: compile(labeled, "labeled model")?,
            attributes: compile(attributes, "attribute model")?,
            generic: compile(generic, "generic model")?,
            max_models,
        })
    }

    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let mut out = Vec::new();

        for re in &self.labeled {
            for cap in re.captures_iter(text) {
                let Some(m) = cap.name("model").or_else(|| cap.get(0)) else {
                    continue;
                };
                let value = m.as_str().trim_end_matches(['-', '/']);
                // Labeled values still need to look like a code, not a word
                let upper_code = value.chars().count() >= 2
                    && value.chars().all(|c| !c.is_alphabetic() || c.is_uppercase());
                if has_letter(value) && (has_digit(value) || upper_code) {
                    out.push(Candidate {
                        start: m.start(),
                        end: m.start() + value.len(),
                        value: value.to_string(),
                        labeled: true,
                    });
                }
            }
        }

        for re in &self.attributes {
            for cap in re.captures_iter(text) {
                let Some(m) = cap.name("model").or_else(|| cap.get(0)) else {
                    continue;
                };
                let value = m.as_str().trim_end();
                // A bare number after "color" or "version" says nothing
                if value.chars().count() >= 2 && !value.chars().all(|c| c.is_ascii_digit()) {
                    out.push(Candidate {
                        start: m.start(),
                        end: m.start() + value.len(),
                        value: value.to_string(),
                        labeled: true,
                    });
                }
            }
        }

        for re in &self.generic {
            for m in re.find_iter(text) {
                let value = m.as_str();
                if has_digit(value) && has_letter(value) {
                    out.push(Candidate {
                        start: m.start(),
                        end: m.end(),
                        value: value.to_string(),
                        labeled: false,
                    });
                }
            }
        }
        out
    }

    /// Model tokens in `text`, in text order, at most `max_models`.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut candidates = self.candidates(text);
        candidates.sort_by(|a, b| {
            b.labeled
                .cmp(&a.labeled)
                .then_with(|| (b.end - b.start).cmp(&(a.end - a.start)))
                .then_with(|| a.start.cmp(&b.start))
        });

        let mut accepted: Vec<Candidate> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for candidate in candidates {
            if accepted.iter().any(|a| a.overlaps(&candidate)) {
                continue;
            }
            if !seen.insert(candidate.value.to_uppercase()) {
                continue;
            }
            accepted.push(candidate);
        }

        accepted.sort_by_key(|c| c.start);
        accepted
            .into_iter()
            .take(self.max_models)
            .map(|c| c.value)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewgraph_core::ExtractorPatterns;

    fn extractor() -> ModelExtractor {
        let p = ExtractorPatterns::default();
        ModelExtractor::new(&p.labeled_models, &p.attribute_models, &p.generic_models, 5).unwrap()
    }

    #[test]
    fn test_scenario_model() {
        let models = extractor()
            .extract("I bought the XYZ-200 for $49.99 on March 3, 2022 from John in Mexico");
        assert_eq!(models, vec!["XYZ-200"]);
    }

    #[test]
    fn test_labeled_wins_over_generic_on_same_substring() {
        let models = extractor().extract("Model: AB-1234X works, sku# 98765QZ too");
        assert_eq!(models, vec!["AB-1234X", "98765QZ"]);
    }

    #[test]
    fn test_dates_and_plain_numbers_are_not_models() {
        let models = extractor().extract("Arrived 03/03/2022, model 2000 costs 300 dollars");
        assert!(models.is_empty());
    }

    #[test]
    fn test_case_insensitive_dedup_keeps_labeled_spelling() {
        let models = extractor().extract("Got 500GB then SSD970 and ref: ssd970 and 500GB again");
        assert_eq!(models, vec!["500GB", "ssd970"]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let p = ExtractorPatterns::default();
        let ex = ModelExtractor::new(&p.labeled_models, &p.attribute_models, &p.generic_models, 2)
            .unwrap();
        let models = ex.extract("AA11 BB22 CC33 DD44");
        assert_eq!(models, vec!["AA11", "BB22"]);
    }

    #[test]
    fn test_labeled_uppercase_code_without_digits() {
        let models = extractor().extract("the model is great, part: ABX fits");
        assert_eq!(models, vec!["ABX"]);
    }

    #[test]
    fn test_colour_and_shade_values() {
        let models = extractor().extract("Color: Midnight Blue. Looks fine, the color is great");
        assert_eq!(models, vec!["Midnight Blue"]);

        let models = extractor().extract("Bought shade 02 Ivory and Shade: N3");
        assert_eq!(models, vec!["02 Ivory", "N3"]);

        // A lowercase word or a bare number after the label is not a value
        assert!(extractor().extract("the colour red and shade 7").is_empty());
    }

    #[test]
    fn test_version_strings() {
        let models = extractor().extract("Updated to firmware v2.1.3, the app says version 4.0b");
        assert_eq!(models, vec!["v2.1.3", "4.0b"]);

        // Labeled wins on the same substring, so the label's spelling is kept once
        let models = extractor().extract("Version: V1.2 runs better than v1.1");
        assert_eq!(models, vec!["V1.2", "v1.1"]);

        assert!(extractor().extract("version 3 was fine").is_empty());
    }

    #[test]
    fn test_unit_sizes() {
        let models = extractor()
            .extract("The 12 oz bottle, a 250ml refill, 1.5 kg bag, 500 g jar and a 6.1 inch screen");
        assert_eq!(models, vec!["12 oz", "250ml", "1.5 kg", "500 g", "6.1 inch"]);

        let models = extractor().extract("Holds 8 fl oz or 30 CM of ribbon");
        assert_eq!(models, vec!["8 fl oz", "30 CM"]);

        // Units must stand alone: "500GB" stays a storage code, "10 grams" is prose
        assert_eq!(extractor().extract("500GB drive, 10 grams"), vec!["500GB"]);
    }

    #[test]
    fn test_attribute_precedence() {
        // Labeled "2.1" beats the longer overlapping generic "1-RC/3"
        assert_eq!(extractor().extract("Flashed version 2.1-RC/3 last night"), vec!["2.1"]);

        // A colour value stops before a size, which then stands on its own
        let models = extractor().extract("Color: Black 6.5 inch display, version 2.5 of the V2-100");
        assert_eq!(models, vec!["Black", "6.5 inch", "2.5", "V2-100"]);
    }
}
