//! In-memory triple store.
//!
//! Primary index: `(subject, predicate) → {objects}`. Secondary indexes by
//! predicate (→ subjects) and by object (→ `(subject, predicate)`) serve the
//! wildcard combinations without a full scan. The store is always built in
//! full from an enriched record set; there is no incremental removal.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use reviewgraph_core::EnrichedRecord;

use crate::predicate::Predicate;

/// A (subject, predicate, object) fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: Predicate,
    pub object: String,
}

impl Triple {
    pub fn new(subject: impl Into<String>, predicate: Predicate, object: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }
}

/// Values that stand for "no value" in source data.
const SENTINELS: &[&str] = &["unknown", "n/a", "na", "nan", "none", "null"];

/// True for empty strings and "no value" markers.
pub fn is_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || SENTINELS.iter().any(|s| v.eq_ignore_ascii_case(s))
}

fn valid(values: &[String]) -> Vec<&str> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !is_sentinel(v))
        .collect()
}

/// Triples implied by one record. Every relation is anchored on a product,
/// so a record without products yields nothing.
pub fn derive_triples(record: &EnrichedRecord) -> Vec<Triple> {
    let entities = &record.entities;
    let brands = valid(&entities.brands);
    let locations = valid(&entities.locations);
    let persons = valid(&entities.persons);
    let problems = valid(&record.problems);
    let sentiment = record.sentiment.label();

    let mut out = Vec::new();
    for product in valid(&entities.products) {
        for brand in &brands {
            out.push(Triple::new(product, Predicate::IsBrandOf, *brand));
            out.push(Triple::new(*brand, Predicate::Manufactures, product));
        }
        for location in &locations {
            out.push(Triple::new(product, Predicate::SoldIn, *location));
            out.push(Triple::new(*location, Predicate::Sells, product));
        }
        for person in &persons {
            out.push(Triple::new(*person, Predicate::Purchased, product));
            out.push(Triple::new(product, Predicate::PurchasedBy, *person));
        }
        out.push(Triple::new(product, Predicate::HasSentiment, sentiment));
        out.push(Triple::new(sentiment, Predicate::AssociatedWith, product));
        for problem in &problems {
            out.push(Triple::new(product, Predicate::HasProblem, *problem));
            out.push(Triple::new(*problem, Predicate::Affects, product));
        }
    }
    out
}

/// `review_<id> mentions_problem <tag>` for each problem detected in a record.
pub fn problem_mentions(record: &EnrichedRecord) -> Vec<Triple> {
    let subject = format!("review_{}", record.id());
    valid(&record.problems)
        .into_iter()
        .map(|p| Triple::new(subject.clone(), Predicate::MentionsProblem, p))
        .collect()
}

/// Aggregate counts over a triple set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripleStats {
    pub total_triples: usize,
    pub unique_subjects: usize,
    pub unique_predicates: usize,
    pub unique_objects: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TripleStore {
    primary: BTreeMap<(String, Predicate), BTreeSet<String>>,
    by_predicate: HashMap<Predicate, BTreeSet<String>>,
    by_object: HashMap<String, BTreeSet<(String, Predicate)>>,
    len: usize,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from every record's derived triples.
    pub fn build(records: &[EnrichedRecord]) -> Self {
        let mut store = Self::new();
        for record in records {
            store.add_facts(record);
        }
        debug!("Triple store built: {} triples from {} records", store.len, records.len());
        store
    }

    /// Insert every triple derived from `record`. Returns how many were new.
    pub fn add_facts(&mut self, record: &EnrichedRecord) -> usize {
        derive_triples(record)
            .into_iter()
            .map(|t| self.insert(t))
            .filter(|inserted| *inserted)
            .count()
    }

    /// Insert one triple. Returns false for duplicates and for triples with
    /// an empty or sentinel subject or object.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;
        let (subject, object) = (subject.trim().to_string(), object.trim().to_string());
        if is_sentinel(&subject) || is_sentinel(&object) {
            return false;
        }

        let objects = self.primary.entry((subject.clone(), predicate)).or_default();
        if !objects.insert(object.clone()) {
            return false;
        }
        self.by_predicate
            .entry(predicate)
            .or_default()
            .insert(subject.clone());
        self.by_object
            .entry(object)
            .or_default()
            .insert((subject, predicate));
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every triple, ordered by subject, predicate, object.
    pub fn iter(&self) -> impl Iterator<Item = Triple> + '_ {
        self.primary.iter().flat_map(|((s, p), objects)| {
            objects.iter().map(move |o| Triple::new(s.clone(), *p, o.clone()))
        })
    }

    /// Objects stored under `(subject, predicate)`.
    pub fn objects(&self, subject: &str, predicate: Predicate) -> Vec<&str> {
        self.primary
            .get(&(subject.to_string(), predicate))
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Distinct subjects that have at least one `predicate` triple.
    pub fn subjects_with(&self, predicate: Predicate) -> Vec<&str> {
        self.by_predicate
            .get(&predicate)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Pattern query; `None` is a wildcard. Results are sorted.
    pub fn query(
        &self,
        subject: Option<&str>,
        predicate: Option<Predicate>,
        object: Option<&str>,
    ) -> Vec<Triple> {
        let mut out: Vec<Triple> = match (subject, predicate, object) {
            (Some(s), Some(p), _) => self
                .objects(s, p)
                .into_iter()
                .filter(|o| object.map_or(true, |want| want == *o))
                .map(|o| Triple::new(s, p, o))
                .collect(),
            (Some(s), None, _) => self
                .primary
                .range((s.to_string(), Predicate::FIRST)..=(s.to_string(), Predicate::LAST))
                .flat_map(move |((s, p), objects)| {
                    objects
                        .iter()
                        .filter(move |o| object.map_or(true, |want| want == o.as_str()))
                        .map(move |o| Triple::new(s.clone(), *p, o.clone()))
                })
                .collect(),
            (None, _, Some(o)) => self
                .by_object
                .get(o)
                .map(|pairs| {
                    pairs
                        .iter()
                        .filter(|(_, p)| predicate.map_or(true, |want| want == *p))
                        .map(|(s, p)| Triple::new(s.clone(), *p, o))
                        .collect()
                })
                .unwrap_or_default(),
            (None, Some(p), None) => self
                .subjects_with(p)
                .into_iter()
                .flat_map(|s| self.objects(s, p).into_iter().map(move |o| Triple::new(s, p, o)))
                .collect(),
            (None, None, None) => self.iter().collect(),
        };
        out.sort();
        out
    }

    pub fn stats(&self) -> TripleStats {
        stats_of(self.iter())
    }
}

/// Aggregate counts for any triple sequence.
pub fn stats_of(triples: impl IntoIterator<Item = Triple>) -> TripleStats {
    let mut subjects = BTreeSet::new();
    let mut predicates = BTreeSet::new();
    let mut objects = BTreeSet::new();
    let mut total = 0;
    for t in triples {
        total += 1;
        subjects.insert(t.subject);
        predicates.insert(t.predicate);
        objects.insert(t.object);
    }
    TripleStats {
        total_triples: total,
        unique_subjects: subjects.len(),
        unique_predicates: predicates.len(),
        unique_objects: objects.len(),
    }
}
