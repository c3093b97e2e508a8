//! Query intent classification through the ordered `IntentRules` table.

use serde::{Deserialize, Serialize};

use reviewgraph_core::{IntentAction, IntentRules, QueryText, Sentiment};

/// Boost directives derived from a free-text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryIntent {
    /// Polarity sought, if any sentiment rule matched.
    pub sentiment: Option<Sentiment>,
    pub problem_focus: bool,
    pub location_focus: bool,
    pub brand_focus: bool,
    /// Known locations named in the query, lowercased.
    pub locations: Vec<String>,
    /// Rules that matched, in table order.
    pub matched_rules: Vec<String>,
}

impl QueryIntent {
    /// True when no rule matched.
    pub fn is_neutral(&self) -> bool {
        self.matched_rules.is_empty()
    }
}

/// Run every rule against `query`. Each matching rule applies its action,
/// except that only the first matching sentiment rule sets the polarity.
pub fn classify(query: &str, rules: &IntentRules) -> QueryIntent {
    let text = QueryText::new(query);
    let mut intent = QueryIntent::default();

    for rule in &rules.rules {
        if text.matching(&rule.keywords).is_empty() {
            continue;
        }
        match &rule.action {
            IntentAction::Sentiment(polarity) => {
                if intent.sentiment.is_some() {
                    continue;
                }
                intent.sentiment = Some(*polarity);
            }
            IntentAction::ProblemFocus => intent.problem_focus = true,
            IntentAction::LocationFocus => intent.location_focus = true,
            IntentAction::BrandFocus => intent.brand_focus = true,
        }
        intent.matched_rules.push(rule.name.clone());
    }

    intent.locations = text
        .matching(&rules.known_locations)
        .into_iter()
        .map(str::to_lowercase)
        .collect();
    intent
}
