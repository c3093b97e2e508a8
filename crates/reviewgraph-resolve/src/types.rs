//! Search result types.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use reviewgraph_core::EnrichedRecord;

use crate::intent::QueryIntent;

/// Whether the engine has a lexical index to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    /// No record produced any tokens; ranked search is unavailable.
    Unindexed,
    Indexed,
}

/// Why a search returned what it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Ok,
    NoResults,
    EmptyQuery,
    NotReady,
}

impl SearchStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoResults => "no results above the relevance threshold",
            Self::EmptyQuery => "query is empty",
            Self::NotReady => "search index not built",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::NoResults => "no_results",
            Self::EmptyQuery => "empty_query",
            Self::NotReady => "not_ready",
        };
        f.write_str(name)
    }
}

/// One ranked or filtered record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub review_id: usize,
    pub score: f64,
    /// Display fields: product, brand, location, person, price, date,
    /// model, rating and event.
    pub fields: BTreeMap<String, String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<QueryIntent>,
}

impl Hit {
    pub fn new(record: &EnrichedRecord, score: f64) -> Self {
        Self {
            review_id: record.id(),
            score,
            fields: crate::format::display_fields(record),
            text: record.record.text.clone(),
            intent: None,
        }
    }
}

/// Search result with a status the caller can tell apart from failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub message: String,
    pub hits: Vec<Hit>,
}

impl SearchOutcome {
    /// `Ok` with hits, or `NoResults` when there are none.
    pub fn from_hits(hits: Vec<Hit>) -> Self {
        let status = if hits.is_empty() {
            SearchStatus::NoResults
        } else {
            SearchStatus::Ok
        };
        Self {
            status,
            message: status.message().to_string(),
            hits,
        }
    }

    /// An empty outcome with the given status.
    pub fn empty(status: SearchStatus) -> Self {
        Self {
            status,
            message: status.message().to_string(),
            hits: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SearchStatus::Ok
    }
}

/// Attribute filters for `filtered_search`. Each present, non-blank value
/// must occur (case-insensitively) in the matching record field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub product: Option<String>,
    pub brand: Option<String>,
    pub sentiment: Option<String>,
    pub location: Option<String>,
}

fn wanted(filter: &Option<String>) -> Option<String> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn any_contains(values: &[String], needle: &str) -> bool {
    values.iter().any(|v| v.to_lowercase().contains(needle))
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        [&self.product, &self.brand, &self.sentiment, &self.location]
            .iter()
            .all(|f| wanted(f).is_none())
    }

    pub fn matches(&self, record: &EnrichedRecord) -> bool {
        let entities = &record.entities;
        wanted(&self.product).map_or(true, |p| any_contains(&entities.products, &p))
            && wanted(&self.brand).map_or(true, |b| any_contains(&entities.brands, &b))
            && wanted(&self.location).map_or(true, |l| any_contains(&entities.locations, &l))
            && wanted(&self.sentiment).map_or(true, |s| record.sentiment.label().contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewgraph_core::{ReviewRecord, Sentiment};

    fn record() -> EnrichedRecord {
        let mut rec = EnrichedRecord::bare(ReviewRecord::new(3, "text"), "text".into());
        rec.entities.products = vec!["Galaxy Tab".into()];
        rec.entities.brands = vec!["Samsung".into()];
        rec.entities.locations = vec!["Mexico".into()];
        rec.sentiment = Sentiment::Negative;
        rec
    }

    #[test]
    fn test_filters_are_case_insensitive_substrings() {
        let rec = record();
        let filters = SearchFilters {
            product: Some("galaxy".into()),
            brand: Some("SAMS".into()),
            sentiment: Some("Negative".into()),
            location: Some("mex".into()),
        };
        assert!(filters.matches(&rec));
    }

    #[test]
    fn test_filters_and_together() {
        let rec = record();
        let filters = SearchFilters {
            product: Some("galaxy".into()),
            brand: Some("apple".into()),
            ..Default::default()
        };
        assert!(!filters.matches(&rec));
    }

    #[test]
    fn test_blank_filters_ignored() {
        let filters = SearchFilters {
            product: Some("  ".into()),
            ..Default::default()
        };
        assert!(filters.is_empty());
        assert!(filters.matches(&record()));
    }

    #[test]
    fn test_outcome_status() {
        assert_eq!(SearchOutcome::from_hits(vec![]).status, SearchStatus::NoResults);
        let outcome = SearchOutcome::empty(SearchStatus::NotReady);
        assert_eq!(outcome.message, "search index not built");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "not_ready");
    }
}
