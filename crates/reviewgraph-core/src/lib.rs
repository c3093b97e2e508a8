//! ReviewGraph Core: canonical record types, configuration tables, error taxonomy.

pub mod config;
pub mod error;
pub mod record;
pub mod text;

pub use config::{
    AppConfig, BoostConfig, DataPaths, ExtractorPatterns, IntentAction, IntentRule, IntentRules,
    PipelineConfig, ProblemCategory, ProblemLexicon, QueryPattern, SearchConfig, SemanticRule,
    SemanticRules, SentimentLexicon, ServerConfig, SynonymEntry, SynonymTable, TokenizerConfig,
};
pub use error::{Error, Result};
pub use record::{EnrichedRecord, EntitySet, Price, ReviewRecord, Sentiment};
pub use text::QueryText;
