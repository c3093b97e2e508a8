//! Natural-language triple queries through a keyword rule table.
//!
//! Each `SemanticRule` fires when any of its keywords occurs in the query
//! as a whole word or phrase; every fired rule runs its `QueryPattern`
//! against the store. Results are deduplicated in first-seen order and
//! capped. When no rule fires, a sample of the store is returned instead.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use reviewgraph_core::{QueryPattern, QueryText, SemanticRule, SemanticRules};

use crate::predicate::Predicate;
use crate::triples::{Triple, TripleStore};

/// Answer to a natural-language triple query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticResult {
    /// Names of the rules that fired, in table order.
    pub matched_rules: Vec<String>,
    /// True when no rule fired and `triples` is a general sample.
    pub fallback: bool,
    pub triples: Vec<Triple>,
}

impl TripleStore {
    /// Route `query` through `rules` and collect the matching triples.
    pub fn semantic_query(&self, query: &str, rules: &SemanticRules) -> SemanticResult {
        let text = QueryText::new(query);
        let mut matched_rules = Vec::new();
        let mut results = Vec::new();

        for rule in &rules.rules {
            let hits = text.matching(&rule.keywords);
            if hits.is_empty() {
                continue;
            }
            matched_rules.push(rule.name.clone());
            results.extend(self.run_pattern(rule, &hits));
        }

        if matched_rules.is_empty() {
            debug!("No semantic rule matched {:?}; returning sample", query);
            return SemanticResult {
                matched_rules,
                fallback: true,
                triples: self.iter().take(rules.max_results).collect(),
            };
        }

        let mut seen = HashSet::new();
        let triples: Vec<Triple> = results
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .take(rules.max_results)
            .collect();
        debug!(
            "Semantic query {:?}: rules {:?}, {} triples",
            query,
            matched_rules,
            triples.len()
        );
        SemanticResult {
            matched_rules,
            fallback: false,
            triples,
        }
    }

    fn run_pattern(&self, rule: &SemanticRule, hits: &[&str]) -> Vec<Triple> {
        match &rule.pattern {
            QueryPattern::SentimentProblems { sentiment } => self
                .objects(sentiment.label(), Predicate::AssociatedWith)
                .into_iter()
                .flat_map(|product| self.query(Some(product), Some(Predicate::HasProblem), None))
                .collect(),
            QueryPattern::SentimentProducts { sentiment } => {
                self.query(None, Some(Predicate::HasSentiment), Some(sentiment.label()))
            }
            QueryPattern::ProductsSoldIn => {
                let wanted: Vec<String> = hits.iter().map(|h| h.to_lowercase()).collect();
                self.subjects_with(Predicate::Sells)
                    .into_iter()
                    .filter(|location| wanted.contains(&location.to_lowercase()))
                    .flat_map(|location| self.objects(location, Predicate::Sells))
                    .flat_map(|product| self.query(Some(product), None, None))
                    .collect()
            }
            QueryPattern::ProblemProducts { problem } => {
                self.query(None, Some(Predicate::HasProblem), Some(problem))
            }
        }
    }
}
