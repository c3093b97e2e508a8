//! ReviewGraph Store: triple store, semantic rule routing, triple export,
//! graph projection and the SQLite enrichment cache.

pub mod cache;
pub mod export;
pub mod graph;
pub mod predicate;
pub mod schema;
pub mod semantic;
pub mod triples;

#[cfg(test)]
mod fixtures;

pub use cache::EnrichmentCache;
pub use export::{export_triples, read_export, read_stats, stats_path_for, ExportSummary};
pub use graph::{EntityGraph, GraphNode, GraphStats, Neighbor, NodeKind, RankedEntity};
pub use predicate::Predicate;
pub use semantic::SemanticResult;
pub use triples::{derive_triples, is_sentinel, problem_mentions, Triple, TripleStats, TripleStore};
