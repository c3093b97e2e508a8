//! Retrieval engine: plain BM25 search, intent-boosted diverse search and
//! attribute-filtered search over one enriched record set.
//!
//! The engine is built once per dataset and is read-only afterwards. When
//! no record tokenizes to anything it stays `Unindexed` and ranked searches
//! report `NotReady`.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use reviewgraph_core::{
    AppConfig, BoostConfig, EnrichedRecord, IntentRules, SearchConfig, Sentiment, SynonymTable,
};

use crate::bm25::Bm25Index;
use crate::expand::expand_query;
use crate::intent::{classify, QueryIntent};
use crate::tokenize::Tokenizer;
use crate::types::{Hit, IndexState, SearchFilters, SearchOutcome, SearchStatus};

pub struct RetrievalEngine {
    records: Arc<Vec<EnrichedRecord>>,
    /// review id → position in `records`
    positions: HashMap<usize, usize>,
    tokenizer: Tokenizer,
    /// Keyed by position in `records`.
    index: Option<Bm25Index>,
    search: SearchConfig,
    intents: IntentRules,
    synonyms: SynonymTable,
    boosts: BoostConfig,
}

impl RetrievalEngine {
    /// Tokenize every record's cleaned text and build the BM25 index.
    pub fn build(records: Arc<Vec<EnrichedRecord>>, config: &AppConfig) -> Self {
        let tokenizer = Tokenizer::new(&config.tokenizer);
        let index = Bm25Index::build(
            records
                .iter()
                .enumerate()
                .map(|(pos, r)| (pos, tokenizer.tokenize(&r.cleaned_text))),
            &config.search,
        );
        let positions = records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id(), pos))
            .collect();

        match &index {
            Some(ix) => info!(
                "Retrieval index built: {} of {} records indexed",
                ix.len(),
                records.len()
            ),
            None => info!(
                "Retrieval index not built: none of {} records has searchable tokens",
                records.len()
            ),
        }

        Self {
            records,
            positions,
            tokenizer,
            index,
            search: config.search.clone(),
            intents: config.intents.clone(),
            synonyms: config.synonyms.clone(),
            boosts: config.boosts.clone(),
        }
    }

    pub fn state(&self) -> IndexState {
        if self.index.is_some() {
            IndexState::Indexed
        } else {
            IndexState::Unindexed
        }
    }

    pub fn indexed_count(&self) -> usize {
        self.index.as_ref().map_or(0, Bm25Index::len)
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn record(&self, review_id: usize) -> Option<&EnrichedRecord> {
        self.positions.get(&review_id).map(|&pos| &self.records[pos])
    }

    /// Descending score, ties by review id.
    fn rank(&self, scored: &mut [(usize, f64)]) {
        scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => self.records[a.0].id().cmp(&self.records[b.0].id()),
            other => other,
        });
    }

    fn ready(&self, query: &str) -> Result<&Bm25Index, SearchOutcome> {
        if query.trim().is_empty() {
            return Err(SearchOutcome::empty(SearchStatus::EmptyQuery));
        }
        self.index
            .as_ref()
            .ok_or_else(|| SearchOutcome::empty(SearchStatus::NotReady))
    }

    /// Records scoring strictly above `min_score`, best first, at most `top_n`.
    pub fn search(&self, query: &str, top_n: usize) -> SearchOutcome {
        let index = match self.ready(query) {
            Ok(index) => index,
            Err(outcome) => return outcome,
        };
        let tokens = self.tokenizer.tokenize(query);
        debug!("search {:?} → tokens {:?}", query, tokens);
        if tokens.is_empty() {
            return SearchOutcome::from_hits(Vec::new());
        }

        let mut scored: Vec<(usize, f64)> = index
            .scores(&tokens)
            .into_iter()
            .filter(|(_, score)| *score > self.search.min_score)
            .collect();
        self.rank(&mut scored);
        scored.truncate(top_n);

        SearchOutcome::from_hits(
            scored
                .into_iter()
                .map(|(pos, score)| Hit::new(&self.records[pos], score))
                .collect(),
        )
    }

    /// Intent-classified, synonym-expanded, boosted search with at most one
    /// result per product once `diversity_floor` results are chosen.
    pub fn enhanced_search(&self, query: &str, top_n: usize) -> SearchOutcome {
        let index = match self.ready(query) {
            Ok(index) => index,
            Err(outcome) => return outcome,
        };
        let intent = classify(query, &self.intents);
        let expanded = expand_query(query, &self.synonyms);
        let tokens = self.tokenizer.tokenize(&expanded);
        debug!(
            "enhanced search {:?}: rules {:?}, {} tokens",
            query,
            intent.matched_rules,
            tokens.len()
        );
        if tokens.is_empty() {
            return SearchOutcome::from_hits(Vec::new());
        }

        let mut boosted: Vec<(usize, f64)> = index
            .scores(&tokens)
            .into_iter()
            .map(|(pos, score)| (pos, score * self.boost(&self.records[pos], &intent)))
            .collect();
        self.rank(&mut boosted);

        let candidates = top_n.saturating_mul(self.search.candidate_factor);
        let mut seen_products = HashSet::new();
        let mut hits: Vec<Hit> = Vec::new();
        for (pos, score) in boosted.into_iter().take(candidates) {
            if hits.len() >= top_n {
                break;
            }
            if score <= self.search.enhanced_min_score {
                continue;
            }
            let record = &self.records[pos];
            let product = record.product_key();
            if seen_products.contains(&product) && hits.len() >= self.search.diversity_floor {
                continue;
            }
            if !product.is_empty() {
                seen_products.insert(product);
            }
            let mut hit = Hit::new(record, score);
            hit.intent = Some(intent.clone());
            hits.push(hit);
        }
        SearchOutcome::from_hits(hits)
    }

    /// Score multiplier for `record` under `intent`.
    pub fn boost(&self, record: &EnrichedRecord, intent: &QueryIntent) -> f64 {
        let text = record.record.text.to_lowercase();
        let mentions = |keywords: &[String]| keywords.iter().any(|k| text.contains(&k.to_lowercase()));
        let mut boost = 1.0;

        let sentiment_keywords = match intent.sentiment {
            Some(Sentiment::Negative) => Some(self.boosts.negative_keywords.as_slice()),
            Some(Sentiment::Positive) => Some(self.boosts.positive_keywords.as_slice()),
            _ => None,
        };
        if sentiment_keywords.is_some_and(&mentions) {
            boost *= self.boosts.sentiment_boost;
        }
        if intent.problem_focus && mentions(self.boosts.problem_keywords.as_slice()) {
            boost *= self.boosts.problem_boost;
        }
        if intent.location_focus && location_matches(record, intent) {
            boost *= self.boosts.location_boost;
        }
        boost
    }

    /// Records matching every filter. With a keyword the subset is re-ranked
    /// by a BM25 index built over the subset alone; without one the first
    /// `top_n` matches are returned in record order with score 1.0.
    pub fn filtered_search(
        &self,
        filters: &SearchFilters,
        keyword: Option<&str>,
        top_n: usize,
    ) -> SearchOutcome {
        let subset: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| filters.matches(r))
            .map(|(pos, _)| pos)
            .collect();
        debug!("filtered search {:?}: {} matches", filters, subset.len());

        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        let Some(keyword) = keyword else {
            return SearchOutcome::from_hits(
                subset
                    .into_iter()
                    .take(top_n)
                    .map(|pos| Hit::new(&self.records[pos], 1.0))
                    .collect(),
            );
        };

        let query = self.tokenizer.tokenize(keyword);
        let local = Bm25Index::build(
            subset
                .iter()
                .map(|&pos| (pos, self.tokenizer.tokenize(&self.records[pos].cleaned_text))),
            &self.search,
        );
        let scores: HashMap<usize, f64> = local
            .map(|ix| ix.scores(&query).into_iter().collect())
            .unwrap_or_default();

        let mut scored: Vec<(usize, f64)> = subset
            .into_iter()
            .map(|pos| (pos, scores.get(&pos).copied().unwrap_or(0.0)))
            .collect();
        self.rank(&mut scored);
        scored.truncate(top_n);

        SearchOutcome::from_hits(
            scored
                .into_iter()
                .map(|(pos, score)| Hit::new(&self.records[pos], score))
                .collect(),
        )
    }
}

/// A record matches when it names one of the query's locations, or any
/// location at all when the query names none.
fn location_matches(record: &EnrichedRecord, intent: &QueryIntent) -> bool {
    let locations: Vec<String> = record
        .entities
        .locations
        .iter()
        .map(|l| l.to_lowercase())
        .collect();
    if intent.locations.is_empty() {
        return !locations.is_empty();
    }
    locations
        .iter()
        .any(|l| intent.locations.iter().any(|want| l.contains(want.as_str())))
}
