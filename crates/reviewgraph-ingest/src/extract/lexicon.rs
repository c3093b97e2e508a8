//! Keyword-count sentiment and problem-category detection.

use reviewgraph_core::{ProblemCategory, ProblemLexicon, Sentiment, SentimentLexicon};

pub struct LexiconDetector {
    positive: Vec<String>,
    negative: Vec<String>,
    categories: Vec<ProblemCategory>,
}

fn lowered(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

impl LexiconDetector {
    pub fn new(sentiment: &SentimentLexicon, problems: &ProblemLexicon) -> Self {
        Self {
            positive: lowered(&sentiment.positive),
            negative: lowered(&sentiment.negative),
            categories: problems
                .categories
                .iter()
                .map(|c| ProblemCategory {
                    tag: c.tag.clone(),
                    keywords: lowered(&c.keywords),
                })
                .collect(),
        }
    }

    /// Positive if more positive lexicon words occur than negative ones,
    /// negative if fewer, otherwise neutral. Each word counts once.
    pub fn sentiment(&self, text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        let pos = self.positive.iter().filter(|w| lower.contains(w.as_str())).count();
        let neg = self.negative.iter().filter(|w| lower.contains(w.as_str())).count();
        match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }

    /// Tags of every category with at least one keyword present, in lexicon order.
    pub fn problems(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.categories
            .iter()
            .filter(|c| c.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|c| c.tag.clone())
            .collect()
    }
}
