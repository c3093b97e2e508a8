//! ReviewGraph Ingest: review loading, normalization, fact extraction,
//! enrichment, and enriched CSV output.

pub mod extract;
pub mod language;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod writer;

pub use extract::{FactExtractors, RawFacts};
pub use language::looks_english;
pub use loader::{dataset_digest, load_reviews, read_reviews, ReviewTable};
pub use normalize::normalize;
pub use pipeline::{Enricher, Enrichment, EnrichmentReport};
pub use writer::write_enriched;
