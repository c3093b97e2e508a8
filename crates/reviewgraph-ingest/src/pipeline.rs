//! Record enrichment pipeline: raw records → enriched records.
//!
//! Per record: price/date/model extraction on raw text, normalization,
//! drop checks, then sentiment and problems on cleaned text. Named entities
//! come from one batched recognizer call over the surviving records. The
//! per-record stage runs on rayon when enabled; results carry their source
//! index and are re-sorted, so output order never depends on scheduling.

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use reviewgraph_core::record::columns;
use reviewgraph_core::{
    AppConfig, EnrichedRecord, EntitySet, PipelineConfig, Result, ReviewRecord, Sentiment,
};
use reviewgraph_infer::EntityRecognizer;

use crate::extract::FactExtractors;
use crate::language::looks_english;
use crate::loader::{split_joined, ReviewTable};
use crate::normalize::{normalize, word_count};

/// Counts describing one enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    pub total: usize,
    pub kept: usize,
    pub dropped_short: usize,
    pub dropped_language: usize,
    pub with_prices: usize,
    pub with_dates: usize,
    pub with_models: usize,
    pub with_products: usize,
    pub with_brands: usize,
    pub with_locations: usize,
    pub with_persons: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    /// Records whose entity recognition failed and were kept with empty entities.
    pub ner_failures: usize,
}

impl EnrichmentReport {
    fn tally(&mut self, records: &[EnrichedRecord]) {
        self.kept = records.len();
        for r in records {
            self.with_prices += usize::from(!r.prices.is_empty());
            self.with_dates += usize::from(!r.dates.is_empty());
            self.with_models += usize::from(!r.models.is_empty());
            self.with_products += usize::from(!r.entities.products.is_empty());
            self.with_brands += usize::from(!r.entities.brands.is_empty());
            self.with_locations += usize::from(!r.entities.locations.is_empty());
            self.with_persons += usize::from(!r.entities.persons.is_empty());
            match r.sentiment {
                Sentiment::Positive => self.positive += 1,
                Sentiment::Negative => self.negative += 1,
                Sentiment::Neutral => self.neutral += 1,
            }
        }
    }

    fn log(&self) {
        info!(
            total = self.total,
            kept = self.kept,
            dropped_short = self.dropped_short,
            dropped_language = self.dropped_language,
            with_prices = self.with_prices,
            with_dates = self.with_dates,
            with_models = self.with_models,
            with_products = self.with_products,
            with_brands = self.with_brands,
            with_locations = self.with_locations,
            with_persons = self.with_persons,
            ner_failures = self.ner_failures,
            "Enrichment complete"
        );
    }
}

/// Enriched records plus the run summary.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub records: Vec<EnrichedRecord>,
    pub report: EnrichmentReport,
}

enum DropReason {
    Short,
    Language,
}

/// Applies normalization and every extractor to a batch of records.
pub struct Enricher {
    extractors: FactExtractors,
    recognizer: Arc<dyn EntityRecognizer>,
    pipeline: PipelineConfig,
}

impl Enricher {
    pub fn new(config: &AppConfig, recognizer: Arc<dyn EntityRecognizer>) -> Result<Self> {
        Ok(Self {
            extractors: FactExtractors::from_config(config)?,
            recognizer,
            pipeline: config.pipeline.clone(),
        })
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// Identity of the recognizer's model contents, for cache keys.
    pub fn recognizer_fingerprint(&self) -> String {
        self.recognizer.fingerprint()
    }

    /// Everything except named entities, or the reason the record is dropped.
    fn prepare(&self, record: ReviewRecord) -> std::result::Result<EnrichedRecord, DropReason> {
        if word_count(&record.text) < self.pipeline.min_words {
            return Err(DropReason::Short);
        }
        let cleaned = normalize(&record.text);
        if cleaned.is_empty() {
            return Err(DropReason::Short);
        }
        if self.pipeline.require_english && !looks_english(&cleaned) {
            return Err(DropReason::Language);
        }

        let raw = self.extractors.extract_raw(&record.text);
        let sentiment = self.extractors.sentiment(&cleaned);
        let problems = self.extractors.problems(&cleaned);

        let mut enriched = EnrichedRecord::bare(record, cleaned);
        enriched.prices = raw.prices;
        enriched.dates = raw.dates;
        enriched.models = raw.models;
        enriched.sentiment = sentiment;
        enriched.problems = problems;
        Ok(enriched)
    }

    /// Run `prepare` over all records, in source order.
    fn prepare_all(
        &self,
        records: Vec<ReviewRecord>,
        report: &mut EnrichmentReport,
    ) -> Vec<EnrichedRecord> {
        report.total = records.len();

        let mut outcomes: Vec<(usize, std::result::Result<EnrichedRecord, DropReason>)> =
            if self.pipeline.parallel {
                records
                    .into_par_iter()
                    .enumerate()
                    .map(|(idx, r)| (idx, self.prepare(r)))
                    .collect()
            } else {
                records
                    .into_iter()
                    .enumerate()
                    .map(|(idx, r)| (idx, self.prepare(r)))
                    .collect()
            };
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut kept = Vec::with_capacity(outcomes.len());
        for (_, outcome) in outcomes {
            match outcome {
                Ok(record) => kept.push(record),
                Err(DropReason::Short) => report.dropped_short += 1,
                Err(DropReason::Language) => report.dropped_language += 1,
            }
        }
        kept
    }

    /// Enrich a batch. Never fails: per-record problems drop or degrade the
    /// record and are counted in the report.
    pub fn enrich(&self, records: Vec<ReviewRecord>) -> Enrichment {
        let mut report = EnrichmentReport::default();
        let mut kept = self.prepare_all(records, &mut report);

        let inputs: Vec<String> = kept.iter().map(ner_input).collect();
        let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        let results = self.recognizer.recognize_batch(&refs);

        if results.len() != kept.len() {
            warn!(
                "Recognizer '{}' returned {} results for {} texts; entities left empty",
                self.recognizer.name(),
                results.len(),
                kept.len()
            );
            report.ner_failures = kept.len();
        } else {
            for (record, result) in kept.iter_mut().zip(results) {
                match result {
                    Ok(entities) => record.entities = entities.normalized(),
                    Err(e) => {
                        debug!("Record {}: entity recognition failed: {}", record.id(), e);
                        report.ner_failures += 1;
                    }
                }
            }
        }
        if report.ner_failures > 0 {
            warn!("{} records kept without entities", report.ner_failures);
        }

        report.tally(&kept);
        report.log();
        Enrichment {
            records: kept,
            report,
        }
    }

    /// Rebuild enriched records from a previously enriched table.
    ///
    /// Entity columns are taken from the file; everything else is
    /// recomputed from raw text, since the persisted comma-joined form is
    /// lossy for values that contain commas (e.g. "march 3, 2022").
    pub fn restore(&self, table: ReviewTable) -> Enrichment {
        let mut report = EnrichmentReport::default();
        let mut kept = self.prepare_all(table.records, &mut report);

        for record in &mut kept {
            let column = |name: &str| {
                record
                    .record
                    .metadata_value(name)
                    .map(split_joined)
                    .unwrap_or_default()
            };
            let entities = EntitySet {
                products: column(columns::NER_PRODUCTS),
                brands: column(columns::NER_BRANDS),
                locations: column(columns::NER_LOCATIONS),
                persons: column(columns::NER_PERSONS),
            };
            record.entities = entities.normalized();
            record.record.metadata.retain(|(k, _)| !columns::is_derived(k));
        }

        report.tally(&kept);
        report.log();
        Enrichment {
            records: kept,
            report,
        }
    }
}

/// NER input: the cleaned title and text, joined as one passage.
fn ner_input(record: &EnrichedRecord) -> String {
    match record.record.title.as_deref().map(normalize) {
        Some(title) if !title.is_empty() => format!("{}. {}", title, record.cleaned_text),
        _ => record.cleaned_text.clone(),
    }
}
