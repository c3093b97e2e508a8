//! Canonical review and enriched-record types shared by every component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed column names of the tabular input/output contract.
pub mod columns {
    pub const TEXT: &str = "text";
    pub const TITLE: &str = "title";
    pub const RATING: &str = "rating";
    pub const EXTRACTED_PRICES: &str = "extracted_prices";
    pub const EXTRACTED_DATES: &str = "extracted_purchase_dates";
    pub const EXTRACTED_MODELS: &str = "extracted_product_models";
    pub const NER_PRODUCTS: &str = "ner_products";
    pub const NER_BRANDS: &str = "ner_brands";
    pub const NER_LOCATIONS: &str = "ner_locations";
    pub const NER_PERSONS: &str = "ner_persons";

    /// Derived columns, in the order they are appended on output.
    pub const DERIVED: &[&str] = &[
        EXTRACTED_PRICES,
        EXTRACTED_DATES,
        EXTRACTED_MODELS,
        NER_PRODUCTS,
        NER_BRANDS,
        NER_LOCATIONS,
        NER_PERSONS,
    ];

    /// True if the column is produced by enrichment rather than passed through.
    pub fn is_derived(name: &str) -> bool {
        DERIVED.contains(&name)
    }
}

/// A review row as loaded from tabular input. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Row index within the load.
    pub id: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Pass-through columns in source order.
    #[serde(default)]
    pub metadata: Vec<(String, String)>,
}

impl ReviewRecord {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            title: None,
            rating: None,
            metadata: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    /// Look up a pass-through column by name.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A currency amount held in cents so ordering and dedup are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price {
    cents: u64,
}

impl Price {
    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    /// Parse a plain amount such as `49`, `49.9` or `49.99`.
    ///
    /// Returns `None` for anything else, including amounts that overflow.
    pub fn parse(amount: &str) -> Option<Self> {
        let amount = amount.trim().trim_start_matches('$');
        let (whole, frac) = match amount.split_once('.') {
            Some((w, f)) => (w, f),
            None => (amount, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let whole: u64 = whole.parse().ok()?;
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };
        whole.checked_mul(100)?.checked_add(frac).map(Self::from_cents)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// Review polarity from the keyword-count heuristic.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }

    pub fn all() -> &'static [Sentiment] {
        &[Self::Positive, Self::Negative, Self::Neutral]
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sentiment {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            other => Err(crate::Error::InvalidInput(format!("unknown sentiment '{}'", other))),
        }
    }
}

/// Named entities found in one record, partitioned by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub products: Vec<String>,
    /// Organizations; the recognizer reports brands as organizations.
    pub brands: Vec<String>,
    pub locations: Vec<String>,
    pub persons: Vec<String>,
}

impl EntitySet {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.brands.is_empty()
            && self.locations.is_empty()
            && self.persons.is_empty()
    }

    /// Trim, drop empties, sort and dedup by exact string within each category.
    pub fn normalized(mut self) -> Self {
        for values in [
            &mut self.products,
            &mut self.brands,
            &mut self.locations,
            &mut self.persons,
        ] {
            for v in values.iter_mut() {
                *v = v.trim().to_string();
            }
            values.retain(|v| !v.is_empty());
            values.sort();
            values.dedup();
        }
        self
    }
}

/// A review plus everything extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub record: ReviewRecord,
    pub cleaned_text: String,
    /// Ascending, deduplicated.
    pub prices: Vec<Price>,
    /// Matched substrings as found; no calendar normalization.
    pub dates: Vec<String>,
    /// At most the configured maximum (5 by default).
    pub models: Vec<String>,
    pub entities: EntitySet,
    pub sentiment: Sentiment,
    /// Problem-category tags, in lexicon order.
    pub problems: Vec<String>,
}

impl EnrichedRecord {
    /// A record with nothing extracted yet.
    pub fn bare(record: ReviewRecord, cleaned_text: String) -> Self {
        Self {
            record,
            cleaned_text,
            prices: Vec::new(),
            dates: Vec::new(),
            models: Vec::new(),
            entities: EntitySet::default(),
            sentiment: Sentiment::Neutral,
            problems: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.record.id
    }

    /// The product value used for diversity and display: every product joined.
    pub fn product_key(&self) -> String {
        self.entities.products.join(", ")
    }

    pub fn prices_joined(&self) -> String {
        self.prices
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
