//! Regex and lexicon fact extractors.
//!
//! Each extractor is compiled once from its configuration table and is a
//! pure function of the text it is given. Price, date and model extraction
//! read raw text; sentiment and problems read cleaned text.

pub mod dates;
pub mod lexicon;
pub mod models;
pub mod prices;

use reviewgraph_core::{AppConfig, Price, Result, Sentiment};

pub use dates::DateExtractor;
pub use lexicon::LexiconDetector;
pub use models::ModelExtractor;
pub use prices::PriceExtractor;

/// Facts read from raw text, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFacts {
    pub prices: Vec<Price>,
    pub dates: Vec<String>,
    pub models: Vec<String>,
}

/// All non-NER extractors, compiled from one configuration.
pub struct FactExtractors {
    prices: PriceExtractor,
    dates: DateExtractor,
    models: ModelExtractor,
    lexicon: LexiconDetector,
}

impl FactExtractors {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let patterns = &config.patterns;
        Ok(Self {
            prices: PriceExtractor::new(&patterns.prices)?,
            dates: DateExtractor::new(&patterns.dates)?,
            models: ModelExtractor::new(
                &patterns.labeled_models,
                &patterns.attribute_models,
                &patterns.generic_models,
                config.pipeline.max_models,
            )?,
            lexicon: LexiconDetector::new(&config.sentiment, &config.problems),
        })
    }

    pub fn extract_raw(&self, raw: &str) -> RawFacts {
        RawFacts {
            prices: self.prices.extract(raw),
            dates: self.dates.extract(raw),
            models: self.models.extract(raw),
        }
    }

    pub fn sentiment(&self, cleaned: &str) -> Sentiment {
        self.lexicon.sentiment(cleaned)
    }

    pub fn problems(&self, cleaned: &str) -> Vec<String> {
        self.lexicon.problems(cleaned)
    }
}
