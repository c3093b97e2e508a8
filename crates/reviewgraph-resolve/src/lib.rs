//! ReviewGraph Resolve: lexical retrieval over enriched reviews.
//!
//! Plain BM25 search, intent-boosted search with synonym expansion and
//! product diversity, and attribute-filtered search with optional
//! keyword re-ranking.

pub mod bm25;
pub mod engine;
pub mod expand;
pub mod format;
pub mod intent;
pub mod tokenize;
pub mod types;

pub use bm25::Bm25Index;
pub use engine::RetrievalEngine;
pub use expand::expand_query;
pub use intent::{classify, QueryIntent};
pub use tokenize::Tokenizer;
pub use types::{Hit, IndexState, SearchFilters, SearchOutcome, SearchStatus};
