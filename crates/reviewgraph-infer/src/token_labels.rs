//! Label handling for token-classification NER models.
//!
//! A token classifier tags each sub-word token with a BIO label such as
//! `B-PER`, `I-ORG` or `O`. This module reads the label table from the
//! model's `config.json` and folds tagged tokens back into entity spans of
//! the source text. It has no inference dependencies.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use reviewgraph_core::{EntitySet, Error, Result};

/// Entity category a model label maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Product,
    Brand,
    Location,
    Person,
}

/// Position of a token inside an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Begin,
    Inside,
}

/// Map an entity type (without BIO prefix) to a category.
///
/// Organizations are reported as brands; miscellaneous names as products.
pub fn kind_for_type(entity_type: &str) -> Option<EntityKind> {
    match entity_type.to_ascii_uppercase().as_str() {
        "PER" | "PERSON" => Some(EntityKind::Person),
        "ORG" | "ORGANIZATION" | "BRAND" => Some(EntityKind::Brand),
        "LOC" | "LOCATION" | "GPE" | "FAC" => Some(EntityKind::Location),
        "PRODUCT" | "PROD" | "MISC" => Some(EntityKind::Product),
        _ => None,
    }
}

fn parse_label(label: &str) -> Option<(Position, EntityKind)> {
    let (position, entity_type) = match label.split_once('-') {
        Some(("B", rest)) | Some(("S", rest)) => (Position::Begin, rest),
        Some(("I", rest)) | Some(("E", rest)) => (Position::Inside, rest),
        // IO scheme: a bare type continues any open span of the same type
        _ => (Position::Inside, label),
    };
    kind_for_type(entity_type).map(|kind| (position, kind))
}

/// The parts of a HuggingFace `config.json` the classifier needs.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelConfig {
    id2label: HashMap<String, String>,
    /// BERT-style models take `token_type_ids`; DistilBERT and RoBERTa do not.
    #[serde(default)]
    type_vocab_size: Option<usize>,
}

impl LabelConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ModelUnavailable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&raw)
            .map_err(|e| Error::ModelUnavailable(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        if config.id2label.is_empty() {
            return Err(Error::ModelUnavailable("config has no id2label table".into()));
        }
        Ok(config)
    }

    /// Labels indexed by class id. Ids missing from the table read as `O`.
    pub fn labels(&self) -> Vec<String> {
        let indexed: Vec<(usize, &String)> = self
            .id2label
            .iter()
            .filter_map(|(id, label)| id.parse::<usize>().ok().map(|id| (id, label)))
            .collect();
        let len = indexed.iter().map(|(id, _)| id + 1).max().unwrap_or(0);
        let mut labels = vec!["O".to_string(); len];
        for (id, label) in indexed {
            labels[id] = label.clone();
        }
        labels
    }

    pub fn uses_token_types(&self) -> bool {
        self.type_vocab_size.unwrap_or(0) > 1
    }
}

/// One classified token: its label and byte span in the source text.
#[derive(Debug, Clone, Copy)]
pub struct TaggedToken<'a> {
    pub label: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Fold tagged tokens into entity sets.
///
/// A `B-` label opens a span unless it directly continues the open span of
/// the same type with no gap (a sub-word piece). An `I-` label extends an
/// open span of the same type and otherwise opens one. Unknown types and `O`
/// close the open span. Zero-width tokens (special tokens) are skipped.
pub fn decode_entities(text: &str, tokens: &[TaggedToken<'_>]) -> EntitySet {
    let mut spans: Vec<(EntityKind, usize, usize)> = Vec::new();
    let mut open: Option<(EntityKind, usize, usize)> = None;

    for token in tokens {
        if token.start >= token.end {
            continue;
        }
        let Some((position, kind)) = parse_label(token.label) else {
            spans.extend(open.take());
            continue;
        };
        match open {
            Some((open_kind, start, end))
                if open_kind == kind && (position == Position::Inside || token.start == end) =>
            {
                open = Some((kind, start, token.end));
            }
            _ => {
                spans.extend(open.take());
                open = Some((kind, token.start, token.end));
            }
        }
    }
    spans.extend(open);

    let mut entities = EntitySet::default();
    for (kind, start, end) in spans {
        let Some(value) = text.get(start..end) else {
            continue;
        };
        let value = value.to_string();
        match kind {
            EntityKind::Product => entities.products.push(value),
            EntityKind::Brand => entities.brands.push(value),
            EntityKind::Location => entities.locations.push(value),
            EntityKind::Person => entities.persons.push(value),
        }
    }
    entities.normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tag whitespace-separated words of `text` with `labels`, in order.
    fn tag<'a>(text: &str, labels: &[&'a str]) -> Vec<TaggedToken<'a>> {
        let mut tokens = Vec::new();
        let mut offset = 0;
        for (word, label) in text.split(' ').zip(labels) {
            tokens.push(TaggedToken {
                label,
                start: offset,
                end: offset + word.len(),
            });
            offset += word.len() + 1;
        }
        tokens
    }

    #[test]
    fn test_bio_spans_by_category() {
        let text = "John Smith bought a Samsung Galaxy in New York";
        let tokens = tag(
            text,
            &["B-PER", "I-PER", "O", "O", "B-ORG", "B-MISC", "O", "B-LOC", "I-LOC"],
        );
        let entities = decode_entities(text, &tokens);
        assert_eq!(entities.persons, vec!["John Smith"]);
        assert_eq!(entities.brands, vec!["Samsung"]);
        assert_eq!(entities.products, vec!["Galaxy"]);
        assert_eq!(entities.locations, vec!["New York"]);
    }

    #[test]
    fn test_subword_pieces_merge() {
        // "Zetatron" split as "Zeta" + "tron", both tagged B-ORG by the model
        let text = "Zetatron rocks";
        let tokens = [
            TaggedToken { label: "[CLS]", start: 0, end: 0 },
            TaggedToken { label: "B-ORG", start: 0, end: 4 },
            TaggedToken { label: "B-ORG", start: 4, end: 8 },
            TaggedToken { label: "O", start: 9, end: 14 },
        ];
        assert_eq!(decode_entities(text, &tokens).brands, vec!["Zetatron"]);
    }

    #[test]
    fn test_adjacent_entities_stay_separate() {
        let text = "Apple Google";
        let entities = decode_entities(text, &tag(text, &["B-ORG", "B-ORG"]));
        assert_eq!(entities.brands, vec!["Apple", "Google"]);

        // A type change inside a span starts a new one
        let text = "Paris Hilton";
        let entities = decode_entities(text, &tag(text, &["B-LOC", "I-PER"]));
        assert_eq!(entities.locations, vec!["Paris"]);
        assert_eq!(entities.persons, vec!["Hilton"]);
    }

    #[test]
    fn test_io_scheme_and_unknown_types() {
        let text = "Maria Lopez paid on Monday";
        let entities = decode_entities(text, &tag(text, &["PER", "PER", "O", "O", "DATE"]));
        assert_eq!(entities.persons, vec!["Maria Lopez"]);
        assert!(entities.products.is_empty() && entities.brands.is_empty());
    }

    #[test]
    fn test_out_of_range_offsets_are_ignored() {
        let tokens = [TaggedToken { label: "B-PER", start: 3, end: 40 }];
        assert!(decode_entities("Ana", &tokens).is_empty());
    }

    #[test]
    fn test_label_config() {
        let config = LabelConfig::from_json(
            r#"{"model_type": "bert", "type_vocab_size": 2,
                "id2label": {"0": "O", "1": "B-PER", "3": "B-ORG"}}"#,
        )
        .unwrap();
        assert_eq!(config.labels(), vec!["O", "B-PER", "O", "B-ORG"]);
        assert!(config.uses_token_types());

        let distil = LabelConfig::from_json(r#"{"id2label": {"0": "O"}}"#).unwrap();
        assert!(!distil.uses_token_types());

        assert!(LabelConfig::from_json(r#"{"id2label": {}}"#).is_err());
        assert!(LabelConfig::from_json(r#"{"model_type": "bert"}"#).is_err());
    }
}
