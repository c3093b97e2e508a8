//! Gazetteer-based entity recognizer.
//!
//! A model is a set of term lists (brands, products, locations) plus person
//! cue words. Terms match case-insensitively on word boundaries and are
//! reported in their canonical model spelling. Persons are capitalized names
//! following a title ("Mr.", "Dr.") or a cue word ("from", "by", "my friend").

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use reviewgraph_core::{EntitySet, Error, Result};

use crate::recognizer::EntityRecognizer;

/// Capitalized words a cue can precede that are never names.
const NON_NAMES: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "Prof", "The", "This", "That", "My", "Our"];

static TITLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)")
        .expect("valid title-name regex")
});

/// On-disk gazetteer model (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteerModel {
    pub name: String,
    #[serde(default)]
    pub brands: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    /// Lowercase words after which a capitalized word is taken as a person.
    #[serde(default)]
    pub person_cues: Vec<String>,
    /// Texts longer than this (in bytes) are rejected.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    1_000_000
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl GazetteerModel {
    /// Load a model from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ModelUnavailable(format!("{}: {}", path.display(), e)))?;
        let model: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::ModelUnavailable(format!("{}: {}", path.display(), e)))?;
        if model.brands.is_empty() && model.products.is_empty() && model.locations.is_empty() {
            return Err(Error::ModelUnavailable(format!(
                "{}: model has no terms",
                path.display()
            )));
        }
        Ok(model)
    }

    /// Content hash over the terms, cues and limits, independent of list order
    /// and of duplicate spellings that compile to the same matcher.
    pub fn fingerprint(&self) -> String {
        fn canonical(items: &[String], fold: bool) -> Vec<String> {
            let mut out: Vec<String> = items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| if fold { s.to_lowercase() } else { s.to_string() })
                .collect();
            out.sort();
            out.dedup();
            out
        }

        let payload = serde_json::json!({
            "name": self.name,
            "brands": canonical(&self.brands, false),
            "products": canonical(&self.products, false),
            "locations": canonical(&self.locations, false),
            "person_cues": canonical(&self.person_cues, true),
            "max_chars": self.max_chars,
        });
        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());
        hex::encode(hasher.finalize())[..16].to_string()
    }

    /// The built-in consumer-electronics model.
    pub fn builtin() -> Self {
        Self {
            name: "builtin-gazetteer".into(),
            brands: owned(&[
                "Samsung", "Apple", "Sony", "LG", "Google", "Amazon", "Microsoft", "Dell", "HP",
                "Lenovo", "Asus", "Acer", "Bose", "Canon", "Nikon", "Xiaomi", "Huawei",
                "Motorola", "Nokia", "Philips", "Panasonic", "JBL", "Logitech", "Anker",
                "Nintendo", "Fitbit", "Garmin", "GoPro", "Sennheiser",
            ]),
            products: owned(&[
                "iPhone", "iPad", "MacBook", "AirPods", "Apple Watch", "Galaxy", "Galaxy Tab",
                "Pixel", "Kindle", "Kindle Paperwhite", "Fire TV", "Fire Stick", "Echo",
                "Echo Dot", "PlayStation", "Xbox", "Nintendo Switch", "ThinkPad", "Chromebook",
                "Fitbit Charge", "QuietComfort", "WH-1000XM4", "Roku",
            ]),
            locations: owned(&[
                "Mexico", "México", "Spain", "USA", "United States", "Canada", "UK", "England",
                "Germany", "France", "Italy", "Japan", "China", "India", "Brazil", "Argentina",
                "Colombia", "Chile", "Peru", "Australia", "New York", "California", "Texas",
                "Florida", "London", "Madrid", "Chicago",
            ]),
            person_cues: owned(&[
                "from", "by", "friend", "wife", "husband", "son", "daughter", "brother",
                "sister", "mother", "father", "mom", "dad", "named",
            ]),
            max_chars: default_max_chars(),
        }
    }
}

/// One compiled term category: an alternation regex plus canonical spellings.
struct TermMatcher {
    pattern: Option<Regex>,
    canonical: HashMap<String, String>,
}

impl TermMatcher {
    fn empty() -> Self {
        Self {
            pattern: None,
            canonical: HashMap::new(),
        }
    }

    fn compile(terms: &[String]) -> Result<Self> {
        let mut canonical = HashMap::new();
        for term in terms {
            let term = term.trim();
            if !term.is_empty() {
                canonical
                    .entry(term.to_lowercase())
                    .or_insert_with(|| term.to_string());
            }
        }
        if canonical.is_empty() {
            return Ok(Self {
                pattern: None,
                canonical,
            });
        }

        // Longest first so "Galaxy Tab" wins over "Galaxy"
        let mut keys: Vec<&String> = canonical.keys().collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{})\b", alternation))
            .map_err(|e| Error::ModelUnavailable(format!("term pattern: {}", e)))?;

        Ok(Self {
            pattern: Some(pattern),
            canonical,
        })
    }

    fn find(&self, text: &str) -> Vec<String> {
        let Some(pattern) = &self.pattern else {
            return Vec::new();
        };
        pattern
            .find_iter(text)
            .filter_map(|m| self.canonical.get(&m.as_str().to_lowercase()).cloned())
            .collect()
    }

    fn contains(&self, word: &str) -> bool {
        self.canonical.contains_key(&word.to_lowercase())
    }
}

/// Recognizer backed by a `GazetteerModel`.
pub struct GazetteerRecognizer {
    name: String,
    fingerprint: String,
    brands: TermMatcher,
    products: TermMatcher,
    locations: TermMatcher,
    cue_name: Option<Regex>,
    max_chars: usize,
}

impl GazetteerRecognizer {
    pub fn new(model: GazetteerModel) -> Result<Self> {
        let cue_name = if model.person_cues.is_empty() {
            None
        } else {
            let cues = model
                .person_cues
                .iter()
                .map(|c| regex::escape(c.trim()))
                .collect::<Vec<_>>()
                .join("|");
            // Cue words are case-insensitive, the name itself must be capitalized
            let re = Regex::new(&format!(r"\b(?i:{})\s+([A-Z][a-z]+)\b", cues))
                .map_err(|e| Error::ModelUnavailable(format!("person cue pattern: {}", e)))?;
            Some(re)
        };

        let fingerprint = model.fingerprint();
        Ok(Self {
            name: model.name,
            fingerprint,
            brands: TermMatcher::compile(&model.brands)?,
            products: TermMatcher::compile(&model.products)?,
            locations: TermMatcher::compile(&model.locations)?,
            cue_name,
            max_chars: model.max_chars,
        })
    }

    /// Recognizer over the built-in model.
    pub fn builtin() -> Self {
        // The built-in term lists are literals with no regex syntax after escaping
        Self::new(GazetteerModel::builtin()).unwrap_or_else(|e| {
            tracing::error!("Built-in gazetteer failed to compile: {}", e);
            Self {
                name: "builtin-gazetteer".into(),
                fingerprint: "empty".into(),
                brands: TermMatcher::empty(),
                products: TermMatcher::empty(),
                locations: TermMatcher::empty(),
                cue_name: None,
                max_chars: default_max_chars(),
            }
        })
    }

    fn is_known_term(&self, word: &str) -> bool {
        self.brands.contains(word) || self.products.contains(word) || self.locations.contains(word)
    }

    fn find_persons(&self, text: &str) -> Vec<String> {
        let mut persons: Vec<String> = TITLE_NAME_RE
            .captures_iter(text)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect();

        if let Some(re) = &self.cue_name {
            for cap in re.captures_iter(text) {
                if let Some(m) = cap.get(1) {
                    let word = m.as_str();
                    if !NON_NAMES.contains(&word) && !self.is_known_term(word) {
                        persons.push(word.to_string());
                    }
                }
            }
        }
        persons
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn recognize(&self, text: &str) -> Result<EntitySet> {
        if text.len() > self.max_chars {
            return Err(Error::Extraction(format!(
                "text of {} bytes exceeds recognizer limit of {}",
                text.len(),
                self.max_chars
            )));
        }

        let entities = EntitySet {
            products: self.products.find(text),
            brands: self.brands.find(text),
            locations: self.locations.find(text),
            persons: self.find_persons(text),
        };
        Ok(entities.normalized())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> String {
        format!("{}@{}", self.name, self.fingerprint)
    }

    fn is_available(&self) -> bool {
        self.brands.pattern.is_some()
            || self.products.pattern.is_some()
            || self.locations.pattern.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_person_and_location() {
        let ner = GazetteerRecognizer::builtin();
        let entities = ner
            .recognize("I bought the XYZ-200 for $49.99 on March 3, 2022 from John in Mexico")
            .unwrap();
        assert_eq!(entities.persons, vec!["John"]);
        assert_eq!(entities.locations, vec!["Mexico"]);
        assert!(entities.brands.is_empty());
    }

    #[test]
    fn test_canonical_spelling_and_dedup() {
        let ner = GazetteerRecognizer::builtin();
        let entities = ner
            .recognize("my samsung galaxy tab outlasts the SAMSUNG phone. Samsung rules")
            .unwrap();
        assert_eq!(entities.brands, vec!["Samsung"]);
        assert_eq!(entities.products, vec!["Galaxy Tab"]);
    }

    #[test]
    fn test_known_terms_are_not_persons() {
        let ner = GazetteerRecognizer::builtin();
        let entities = ner.recognize("Shipped from Canada by Amazon, gift from Dr. Ruiz").unwrap();
        assert_eq!(entities.persons, vec!["Ruiz"]);
        assert_eq!(entities.brands, vec!["Amazon"]);
        assert_eq!(entities.locations, vec!["Canada"]);
    }

    #[test]
    fn test_oversized_text_is_extraction_error() {
        let mut model = GazetteerModel::builtin();
        model.max_chars = 10;
        let ner = GazetteerRecognizer::new(model).unwrap();
        let err = ner.recognize("this text is clearly longer than ten bytes").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_load_model_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ner.json");
        std::fs::write(
            &path,
            r#"{"name": "tiendas", "brands": ["Bimbo"], "locations": ["Oaxaca"]}"#,
        )
        .unwrap();

        let ner = GazetteerRecognizer::new(GazetteerModel::load(&path).unwrap()).unwrap();
        assert_eq!(ner.name(), "tiendas");
        let entities = ner.recognize("pan Bimbo comprado en Oaxaca").unwrap();
        assert_eq!(entities.brands, vec!["Bimbo"]);
        assert_eq!(entities.locations, vec!["Oaxaca"]);
        assert!(entities.persons.is_empty());
    }

    #[test]
    fn test_fingerprint_tracks_terms_not_order() {
        let model = |brands: &[&str]| GazetteerModel {
            name: "shop".into(),
            brands: owned(brands),
            products: Vec::new(),
            locations: Vec::new(),
            person_cues: owned(&["from"]),
            max_chars: default_max_chars(),
        };

        let acme = GazetteerRecognizer::new(model(&["Acme", "Bolt"])).unwrap();
        let reordered = GazetteerRecognizer::new(model(&[" Bolt", "Acme", "Acme"])).unwrap();
        let edited = GazetteerRecognizer::new(model(&["Acme", "Zetatron"])).unwrap();

        assert_eq!(acme.name(), edited.name());
        assert_eq!(acme.fingerprint(), reordered.fingerprint());
        assert_ne!(acme.fingerprint(), edited.fingerprint());
        assert!(acme.fingerprint().starts_with("shop@"));

        let mut recased = model(&["Acme", "Bolt"]);
        recased.brands[0] = "ACME".into();
        assert_ne!(
            acme.fingerprint(),
            GazetteerRecognizer::new(recased).unwrap().fingerprint()
        );
    }

    #[test]
    fn test_empty_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, r#"{"name": "empty"}"#).unwrap();
        let err = GazetteerModel::load(&path).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }
}
