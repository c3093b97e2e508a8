//! Entity recognizer trait and the no-op fallback.

use reviewgraph_core::{EntitySet, Result};

/// Trait for named-entity backends.
pub trait EntityRecognizer: Send + Sync {
    /// Tag entities in one text. An `Err` is a per-record failure the caller
    /// recovers from; it never aborts a batch.
    fn recognize(&self, text: &str) -> Result<EntitySet>;

    /// Tag a batch of texts in one call.
    fn recognize_batch(&self, texts: &[&str]) -> Vec<Result<EntitySet>> {
        texts.iter().map(|t| self.recognize(t)).collect()
    }

    /// Human-readable model name.
    fn name(&self) -> &str;

    /// Identifies the loaded model contents. Part of the enrichment cache
    /// key, so it must change whenever the model would tag differently.
    fn fingerprint(&self) -> String {
        self.name().to_string()
    }

    /// Check if a model is loaded.
    fn is_available(&self) -> bool;
}

/// Recognizer used when no model is available. Always yields empty sets.
pub struct NoopRecognizer;

impl EntityRecognizer for NoopRecognizer {
    fn recognize(&self, _text: &str) -> Result<EntitySet> {
        Ok(EntitySet::default())
    }

    fn name(&self) -> &str {
        "noop"
    }

    fn is_available(&self) -> bool {
        false
    }
}
