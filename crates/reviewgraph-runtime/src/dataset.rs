//! A loaded dataset: enriched records plus everything derived from them.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use reviewgraph_core::{AppConfig, EnrichedRecord};
use reviewgraph_ingest::EnrichmentReport;
use reviewgraph_resolve::RetrievalEngine;
use reviewgraph_store::TripleStore;

/// Records, triple store and retrieval engine built together. Immutable once
/// built; a reload replaces the whole value.
pub struct Dataset {
    pub source: Option<PathBuf>,
    /// Column order of the source file, for writing the enriched table back.
    pub headers: Vec<String>,
    pub records: Arc<Vec<EnrichedRecord>>,
    pub store: TripleStore,
    pub engine: RetrievalEngine,
    pub report: EnrichmentReport,
    pub from_cache: bool,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl Dataset {
    /// The state before any load: no records, unindexed.
    pub fn empty(config: &AppConfig) -> Self {
        let records = Arc::new(Vec::new());
        Self {
            source: None,
            headers: Vec::new(),
            engine: RetrievalEngine::build(Arc::clone(&records), config),
            store: TripleStore::new(),
            records,
            report: EnrichmentReport::default(),
            from_cache: false,
            loaded_at: None,
        }
    }

    pub fn build(
        records: Vec<EnrichedRecord>,
        report: EnrichmentReport,
        config: &AppConfig,
    ) -> Self {
        let store = TripleStore::build(&records);
        let records = Arc::new(records);
        let engine = RetrievalEngine::build(Arc::clone(&records), config);
        info!(
            "Dataset built: {} records, {} triples, {} indexed",
            records.len(),
            store.len(),
            engine.indexed_count()
        );
        Self {
            source: None,
            headers: Vec::new(),
            records,
            store,
            engine,
            report,
            from_cache: false,
            loaded_at: Some(Utc::now()),
        }
    }

    pub fn with_source(mut self, source: PathBuf, headers: Vec<String>) -> Self {
        self.source = Some(source);
        self.headers = headers;
        self
    }
}
