//! Façade answer types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reviewgraph_core::Error;
use reviewgraph_ingest::EnrichmentReport;
use reviewgraph_resolve::{Hit, IndexState, SearchFilters, SearchStatus};
use reviewgraph_store::{GraphStats, SemanticResult, Triple, TripleStats};

/// A hit with the triples that explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecoratedHit {
    #[serde(flatten)]
    pub hit: Hit,
    pub triples: Vec<Triple>,
    /// Problem tags detected in the hit's review.
    pub problems: Vec<String>,
}

/// Free-text answer: ranked reviews and matching triples, found independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticAnswer {
    pub query: String,
    pub status: SearchStatus,
    pub message: String,
    pub hits: Vec<DecoratedHit>,
    pub semantic: SemanticResult,
}

/// Attribute-filtered answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredAnswer {
    pub filters: SearchFilters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    pub status: SearchStatus,
    pub message: String,
    pub hits: Vec<DecoratedHit>,
}

/// What a load or reload produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub from_cache: bool,
    pub report: EnrichmentReport,
    pub triples: usize,
    pub index_state: IndexState,
}

/// Snapshot of the loaded dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub records: usize,
    pub indexed_records: usize,
    pub index_state: IndexState,
    pub triples: TripleStats,
    pub graph: GraphStats,
    pub enrichment: EnrichmentReport,
    pub recognizer: String,
    pub from_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_at: Option<DateTime<Utc>>,
}

/// Which part of the entity graph to project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphView {
    #[default]
    Full,
    Sentiment,
    Product,
}

impl fmt::Display for GraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full",
            Self::Sentiment => "sentiment",
            Self::Product => "product",
        };
        f.write_str(name)
    }
}

impl FromStr for GraphView {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" | "all" => Ok(Self::Full),
            "sentiment" => Ok(Self::Sentiment),
            "product" | "products" => Ok(Self::Product),
            other => Err(Error::InvalidInput(format!("unknown graph view '{}'", other))),
        }
    }
}
