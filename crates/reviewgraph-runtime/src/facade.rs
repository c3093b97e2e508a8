//! Query façade: the single owner of the loaded dataset.
//!
//! Loads enrich off-lock and swap a fully built `Dataset` in under a short
//! write lock; queries clone the current `Arc<Dataset>` and never see a
//! half-built one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use reviewgraph_core::{AppConfig, EnrichedRecord, Error, Result, ReviewRecord};
use reviewgraph_infer::{create_recognizer, EntityRecognizer};
use reviewgraph_ingest::{
    dataset_digest, load_reviews, write_enriched, Enricher, Enrichment, EnrichmentReport,
    ReviewTable,
};
use reviewgraph_resolve::{Hit, SearchFilters, SearchOutcome};
use reviewgraph_store::{
    derive_triples, export_triples, problem_mentions, EnrichmentCache, EntityGraph, ExportSummary,
    Predicate, SemanticResult, Triple, TripleStore,
};

use crate::dataset::Dataset;
use crate::types::{
    DatasetStats, DecoratedHit, FilteredAnswer, GraphView, LoadSummary, SemanticAnswer,
};

/// Store triples kept per predicate when decorating an enhanced hit.
const TRIPLES_PER_PREDICATE: usize = 3;

/// Cached form of one enrichment run.
#[derive(Serialize, Deserialize)]
struct CachedEnrichment {
    records: Vec<EnrichedRecord>,
    report: EnrichmentReport,
}

pub struct QueryFacade {
    config: AppConfig,
    enricher: Enricher,
    cache: Option<EnrichmentCache>,
    current: RwLock<Arc<Dataset>>,
}

impl QueryFacade {
    /// Façade with the recognizer named by `config.ner_model` (or the built-in one).
    pub fn new(config: AppConfig, cache: Option<EnrichmentCache>) -> Result<Self> {
        let recognizer = create_recognizer(config.ner_model.as_deref());
        Self::with_recognizer(config, recognizer, cache)
    }

    pub fn with_recognizer(
        config: AppConfig,
        recognizer: Arc<dyn EntityRecognizer>,
        cache: Option<EnrichmentCache>,
    ) -> Result<Self> {
        let enricher = Enricher::new(&config, recognizer)?;
        let empty = Dataset::empty(&config);
        Ok(Self {
            config,
            enricher,
            cache,
            current: RwLock::new(Arc::new(empty)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The current dataset. Holding the `Arc` keeps it alive across reloads.
    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.current.read())
    }

    fn swap(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        *self.current.write() = Arc::clone(&dataset);
        dataset
    }

    fn summary(dataset: &Dataset) -> LoadSummary {
        LoadSummary {
            source: dataset.source.clone(),
            from_cache: dataset.from_cache,
            report: dataset.report.clone(),
            triples: dataset.store.len(),
            index_state: dataset.engine.state(),
        }
    }

    /// Load and enrich a review file, replacing the current dataset.
    ///
    /// Input errors fail before anything is swapped, so the previous
    /// dataset stays in service.
    pub fn load(&self, path: &Path) -> Result<LoadSummary> {
        let table = load_reviews(path)?;
        let headers = table.headers.clone();

        let cache_key = match &self.cache {
            Some(_) => Some(EnrichmentCache::cache_key(
                &dataset_digest(path)?,
                &self.config.extractor_fingerprint(),
                &self.enricher.recognizer_fingerprint(),
            )),
            None => None,
        };

        let (enrichment, from_cache) = match self.cached(path, cache_key.as_deref()) {
            Some(hit) => (hit, true),
            None => {
                let enrichment = self.enrich_table(table);
                self.remember(path, cache_key.as_deref(), &enrichment);
                (enrichment, false)
            }
        };

        if enrichment.records.is_empty() {
            warn!("{}: every record was dropped during enrichment", path.display());
        }
        let mut dataset = Dataset::build(enrichment.records, enrichment.report, &self.config)
            .with_source(path.to_path_buf(), headers);
        dataset.from_cache = from_cache;
        let dataset = self.swap(dataset);
        info!(
            "Loaded {} ({} records{})",
            path.display(),
            dataset.records.len(),
            if from_cache { ", from cache" } else { "" }
        );
        Ok(Self::summary(&dataset))
    }

    /// Reload the current source file.
    pub fn reload(&self) -> Result<LoadSummary> {
        let source = self
            .dataset()
            .source
            .clone()
            .ok_or_else(|| Error::InvalidInput("no dataset loaded".into()))?;
        self.load(&source)
    }

    /// Enrich in-memory records, replacing the current dataset. Not cached.
    pub fn load_records(&self, records: Vec<ReviewRecord>) -> Result<LoadSummary> {
        if records.is_empty() {
            return Err(Error::EmptyDataset("no records supplied".into()));
        }
        let enrichment = self.enricher.enrich(records);
        let dataset = self.swap(Dataset::build(
            enrichment.records,
            enrichment.report,
            &self.config,
        ));
        Ok(Self::summary(&dataset))
    }

    fn enrich_table(&self, table: ReviewTable) -> Enrichment {
        if table.is_enriched() {
            info!("Input already carries entity columns; restoring");
            self.enricher.restore(table)
        } else {
            self.enricher.enrich(table.records)
        }
    }

    fn cached(&self, path: &Path, key: Option<&str>) -> Option<Enrichment> {
        let (cache, key) = (self.cache.as_ref()?, key?);
        match cache.get::<CachedEnrichment>(path, key) {
            Ok(Some(hit)) => Some(Enrichment {
                records: hit.records,
                report: hit.report,
            }),
            Ok(None) => None,
            Err(e) => {
                warn!("Enrichment cache lookup failed: {}", e);
                None
            }
        }
    }

    fn remember(&self, path: &Path, key: Option<&str>, enrichment: &Enrichment) {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), key) else {
            return;
        };
        let entry = CachedEnrichment {
            records: enrichment.records.clone(),
            report: enrichment.report.clone(),
        };
        if let Err(e) = cache.store(path, key, entry.records.len(), &entry) {
            warn!("Could not cache enrichment for {}: {}", path.display(), e);
        }
    }

    /// Free-text query: enhanced search and the semantic triple query, run
    /// independently over the same dataset snapshot.
    pub fn search(&self, query: &str, top_n: Option<usize>) -> SemanticAnswer {
        let dataset = self.dataset();
        let top_n = top_n.unwrap_or(self.config.search.default_top_n);
        let outcome = dataset.engine.enhanced_search(query, top_n);
        let semantic = self.semantic_on(&dataset, query);

        let SearchOutcome {
            status,
            message,
            hits,
        } = outcome;
        SemanticAnswer {
            query: query.to_string(),
            status,
            message,
            hits: hits
                .into_iter()
                .map(|hit| decorate_from_store(&dataset, hit))
                .collect(),
            semantic,
        }
    }

    /// Plain BM25 search without intent, expansion or decoration.
    pub fn keyword_search(&self, query: &str, top_n: Option<usize>) -> SearchOutcome {
        let top_n = top_n.unwrap_or(self.config.search.default_top_n);
        self.dataset().engine.search(query, top_n)
    }

    pub fn semantic_query(&self, query: &str) -> SemanticResult {
        self.semantic_on(&self.dataset(), query)
    }

    fn semantic_on(&self, dataset: &Dataset, query: &str) -> SemanticResult {
        if query.trim().is_empty() {
            return SemanticResult::default();
        }
        dataset.store.semantic_query(query, &self.config.semantic)
    }

    /// Attribute-filtered search; each hit carries triples derived afresh
    /// from its record.
    pub fn filtered_search(
        &self,
        filters: &SearchFilters,
        keyword: Option<&str>,
        top_n: Option<usize>,
    ) -> FilteredAnswer {
        let dataset = self.dataset();
        let top_n = top_n.unwrap_or(self.config.search.default_filtered_top_n);
        let SearchOutcome {
            status,
            message,
            hits,
        } = dataset.engine.filtered_search(filters, keyword, top_n);
        FilteredAnswer {
            filters: filters.clone(),
            keyword: keyword.map(str::to_string),
            status,
            message,
            hits: hits
                .into_iter()
                .map(|hit| decorate_fresh(&dataset, hit))
                .collect(),
        }
    }

    pub fn export_triples(&self, path: &Path) -> Result<ExportSummary> {
        export_triples(&self.dataset().store, path)
    }

    /// Write the enriched table (pass-through plus derived columns).
    pub fn write_enriched(&self, path: &Path) -> Result<PathBuf> {
        let dataset = self.dataset();
        let headers = (!dataset.headers.is_empty()).then_some(dataset.headers.as_slice());
        write_enriched(path, &dataset.records, headers)?;
        Ok(path.to_path_buf())
    }

    pub fn graph(&self, view: GraphView) -> EntityGraph {
        let dataset = self.dataset();
        match view {
            GraphView::Full => EntityGraph::build(&dataset.store),
            GraphView::Sentiment => EntityGraph::sentiment_network(&dataset.store),
            GraphView::Product => EntityGraph::product_network(&dataset.store),
        }
    }

    pub fn stats(&self) -> DatasetStats {
        let dataset = self.dataset();
        DatasetStats {
            source: dataset.source.clone(),
            records: dataset.records.len(),
            indexed_records: dataset.engine.indexed_count(),
            index_state: dataset.engine.state(),
            triples: dataset.store.stats(),
            graph: EntityGraph::build(&dataset.store).stats(),
            enrichment: dataset.report.clone(),
            recognizer: self.enricher.recognizer_name().to_string(),
            from_cache: dataset.from_cache,
            loaded_at: dataset.loaded_at,
        }
    }
}

/// Up to `TRIPLES_PER_PREDICATE` store triples per predicate for each of the
/// record's products, then its problem mentions.
fn store_triples(store: &TripleStore, record: &EnrichedRecord) -> Vec<Triple> {
    let mut out = Vec::new();
    for product in &record.entities.products {
        let about = store.query(Some(product), None, None);
        for predicate in Predicate::all() {
            out.extend(
                about
                    .iter()
                    .filter(|t| t.predicate == *predicate)
                    .take(TRIPLES_PER_PREDICATE)
                    .cloned(),
            );
        }
    }
    out.extend(problem_mentions(record));
    out
}

fn decorate_from_store(dataset: &Dataset, hit: Hit) -> DecoratedHit {
    match dataset.engine.record(hit.review_id) {
        Some(record) => DecoratedHit {
            triples: store_triples(&dataset.store, record),
            problems: record.problems.clone(),
            hit,
        },
        None => DecoratedHit {
            hit,
            triples: Vec::new(),
            problems: Vec::new(),
        },
    }
}

fn decorate_fresh(dataset: &Dataset, hit: Hit) -> DecoratedHit {
    match dataset.engine.record(hit.review_id) {
        Some(record) => DecoratedHit {
            triples: derive_triples(record)
                .into_iter()
                .filter(|t| Predicate::forward().contains(&t.predicate))
                .collect(),
            problems: record.problems.clone(),
            hit,
        },
        None => DecoratedHit {
            hit,
            triples: Vec::new(),
            problems: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewgraph_core::Sentiment;
    use reviewgraph_resolve::{IndexState, SearchStatus};

    fn facade() -> QueryFacade {
        let mut config = AppConfig::default();
        config.search.min_score = 0.0;
        config.search.enhanced_min_score = 0.0;
        QueryFacade::new(config, None).unwrap()
    }

    fn reviews() -> Vec<ReviewRecord> {
        vec![
            ReviewRecord::new(0, "My Samsung Galaxy battery is terrible and dies fast"),
            ReviewRecord::new(1, "The Apple iPhone screen is great, excellent display"),
            ReviewRecord::new(2, "Bought a Kindle in Mexico, the battery lasts weeks"),
            ReviewRecord::new(3, "Sony headphones sound amazing on long flights"),
            ReviewRecord::new(4, "Cable arrived late and frayed"),
        ]
    }

    #[test]
    fn test_unloaded_facade_is_not_ready() {
        let facade = facade();
        let answer = facade.search("battery", None);
        assert_eq!(answer.status, SearchStatus::NotReady);
        assert!(answer.hits.is_empty());
        assert_eq!(facade.stats().index_state, IndexState::Unindexed);
        assert!(matches!(facade.reload(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_search_decorates_from_store() {
        let facade = facade();
        facade.load_records(reviews()).unwrap();
        let answer = facade.search("battery complaints", Some(5));
        assert_eq!(answer.status, SearchStatus::Ok);
        let top = &answer.hits[0];
        assert_eq!(top.hit.review_id, 0);
        assert!(top
            .triples
            .contains(&Triple::new("Galaxy", Predicate::IsBrandOf, "Samsung")));
        assert!(top
            .triples
            .contains(&Triple::new("review_0", Predicate::MentionsProblem, "battery")));
        assert_eq!(answer.semantic.matched_rules, vec!["negative_feedback", "battery_problems"]);
    }

    #[test]
    fn test_filtered_search_derives_forward_triples() {
        let facade = facade();
        facade.load_records(reviews()).unwrap();
        let filters = SearchFilters {
            location: Some("mexico".into()),
            ..Default::default()
        };
        let answer = facade.filtered_search(&filters, None, None);
        assert_eq!(answer.hits.len(), 1);
        let hit = &answer.hits[0];
        assert_eq!(hit.hit.review_id, 2);
        assert!(hit
            .triples
            .contains(&Triple::new("Kindle", Predicate::SoldIn, "Mexico")));
        assert!(hit.triples.iter().all(|t| t.predicate != Predicate::Sells));
    }

    #[test]
    fn test_reload_swaps_whole_dataset() {
        let facade = facade();
        facade.load_records(reviews()).unwrap();
        let before = facade.dataset();
        facade
            .load_records(vec![ReviewRecord::new(0, "Pixel phone from Google works well")])
            .unwrap();
        let after = facade.dataset();
        assert_eq!(before.records.len(), 5);
        assert_eq!(after.records.len(), 1);
        assert_eq!(after.records[0].sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_load_records_rejects_empty() {
        assert!(matches!(
            facade().load_records(Vec::new()),
            Err(Error::EmptyDataset(_))
        ));
    }
}
