//! Configuration: data directories plus every vocabulary and rule table the
//! pipeline uses.
//!
//! Each table is a plain serde struct with a `Default` carrying the built-in
//! English vocabulary, so tests can construct components with controlled
//! vocabularies and deployments can override any table from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::record::Sentiment;
use crate::{Error, Result};

/// Paths to ReviewGraph data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Enrichment cache database (`data/cache/enrichment.db`).
    pub cache_db: PathBuf,
    /// Triple and enriched-CSV exports (`data/exports/`).
    pub exports: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            cache_db: root.join("cache").join("enrichment.db"),
            exports: root.join("exports"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.cache_db.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.exports)?;
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_locations() -> Vec<String> {
    strings(&[
        "mexico", "spain", "usa", "united states", "canada", "uk", "england", "germany",
        "france", "italy", "japan", "china", "india", "brazil", "argentina", "colombia",
        "chile", "peru", "australia", "new york", "california", "texas", "florida",
    ])
}

// ---------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------

/// Batch-level enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records whose raw text has fewer words are dropped.
    pub min_words: usize,
    /// Drop records that do not look like English.
    pub require_english: bool,
    /// Enrich records on the rayon pool.
    pub parallel: bool,
    /// Cap on extracted model tokens per record.
    pub max_models: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_words: 1,
            require_english: false,
            parallel: true,
            max_models: 5,
        }
    }
}

/// Regex sources for the price, date and model extractors.
///
/// Price patterns must have one capture group holding the amount. Date and
/// model patterns may name a `date`/`model` group; otherwise the whole match
/// is taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorPatterns {
    pub prices: Vec<String>,
    pub dates: Vec<String>,
    /// Label-anchored model patterns ("model:", "SKU", "ref"). Preferred over generic ones.
    pub labeled_models: Vec<String>,
    /// Label-anchored attributes (colour or shade, version). Same precedence as
    /// labeled models, but the value need not look like a code.
    pub attribute_models: Vec<String>,
    /// Shape-based model patterns, applied case-sensitively to raw text.
    pub generic_models: Vec<String>,
}

impl Default for ExtractorPatterns {
    fn default() -> Self {
        Self {
            prices: strings(&[
                r"\$\s*(\d+(?:\.\d{1,2})?)",
                r"(\d+(?:\.\d{1,2})?)\s*dollars?\b",
                r"(\d+(?:\.\d{1,2})?)\s*\$",
                r"\b(?:price|cost|paid)\s*:?\s*\$?\s*(\d+(?:\.\d{1,2})?)",
            ]),
            dates: strings(&[
                r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b",
                r"\b(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},?\s+\d{2,4}\b",
                r"\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)\.?\s+\d{1,2},?\s+\d{2,4}\b",
                r"\b(?:purchased|bought|ordered)\s+(?:on\s+)?(?P<date>[a-z]+\s+\d{1,2},?\s+\d{2,4})\b",
            ]),
            labeled_models: strings(&[
                r"(?i:\b(?:model|sku|ref|part|product\s+(?:id|code|number))\b)\s*(?:#|no\.?)?\s*[:\-]?\s*(?P<model>[A-Za-z0-9][A-Za-z0-9\-/]*)",
            ]),
            attribute_models: strings(&[
                r"(?i:\b(?:colou?r|shade|tono)\b)\s*:?\s*(?P<model>[A-Z0-9][A-Za-z0-9\-]*(?:[ \t]+[A-Z][A-Za-z\-]*)*)",
                r"(?i:\b(?:version|versi[oó]n|firmware)\b)\s*:?\s*(?P<model>[vV]?\d+(?:\.\d+)+[a-z]?)\b",
            ]),
            generic_models: strings(&[
                r"\b[A-Z]{2,}-\d{2,}[A-Z]?\b",
                r"\b\d{3,}[A-Z]+\b",
                r"\b[A-Z]{2,}\d{2,}[A-Z]*\b",
                r"\b[A-Z0-9]+(?:[/-][A-Z0-9]+)+\b",
                r"\b[vV]\d+(?:\.\d+)+\b",
                r"(?i)\b\d+(?:[.,]\d+)?[ \t]*(?:fl\.?[ \t]*oz|oz|ml|kg|g|l|mm|cm|inch(?:es)?)\b",
            ]),
        }
    }
}

/// Keyword lists for the sentiment heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentLexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            positive: strings(&["good", "great", "excellent", "amazing", "perfect", "love", "best"]),
            negative: strings(&["bad", "terrible", "awful", "horrible", "worst", "hate", "problem"]),
        }
    }
}

/// One problem category and the keywords that signal it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemCategory {
    pub tag: String,
    pub keywords: Vec<String>,
}

impl ProblemCategory {
    pub fn new(tag: &str, keywords: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            keywords: strings(keywords),
        }
    }
}

/// Ordered problem categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemLexicon {
    pub categories: Vec<ProblemCategory>,
}

impl Default for ProblemLexicon {
    fn default() -> Self {
        Self {
            categories: vec![
                ProblemCategory::new("battery", &["battery", "charge", "power"]),
                ProblemCategory::new("screen", &["screen", "display"]),
                ProblemCategory::new("durability", &["break", "broken", "crack", "fragile"]),
                ProblemCategory::new("performance", &["slow", "lag", "performance", "freeze"]),
            ],
        }
    }
}

// ---------------------------------------------------------------
// Retrieval
// ---------------------------------------------------------------

/// Tokenization rules shared by indexing and querying.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub stopwords: Vec<String>,
    /// Tokens with this many characters or fewer are dropped.
    pub max_dropped_len: usize,
    /// Stray markup and other junk tokens.
    pub noise_tokens: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            stopwords: strings(ENGLISH_STOPWORDS),
            max_dropped_len: 2,
            noise_tokens: strings(&["br", "nbsp", "quot", "amp", "http", "https", "www", "com"]),
        }
    }
}

/// BM25 parameters and result thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub k1: f64,
    pub b: f64,
    /// Floor for negative IDF values, as a fraction of the mean IDF.
    pub epsilon: f64,
    /// Plain search keeps results scoring strictly above this.
    pub min_score: f64,
    /// Enhanced search keeps boosted results scoring strictly above this.
    pub enhanced_min_score: f64,
    /// Results accepted before the one-per-product rule kicks in.
    pub diversity_floor: usize,
    /// Enhanced search considers this many times `top_n` candidates.
    pub candidate_factor: usize,
    pub default_top_n: usize,
    pub default_filtered_top_n: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
            min_score: 2.0,
            enhanced_min_score: 1.5,
            diversity_floor: 3,
            candidate_factor: 2,
            default_top_n: 10,
            default_filtered_top_n: 15,
        }
    }
}

/// What a matched intent rule does to the query intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum IntentAction {
    /// Seek reviews of this polarity. The first matching sentiment rule wins.
    Sentiment(Sentiment),
    ProblemFocus,
    LocationFocus,
    BrandFocus,
}

/// `keywords` present in the query ⇒ `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub action: IntentAction,
}

impl IntentRule {
    pub fn new(name: &str, keywords: &[&str], action: IntentAction) -> Self {
        Self {
            name: name.to_string(),
            keywords: strings(keywords),
            action,
        }
    }
}

/// Ordered intent classification table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentRules {
    pub rules: Vec<IntentRule>,
    /// Place names recognized in queries and in record locations.
    pub known_locations: Vec<String>,
}

impl Default for IntentRules {
    fn default() -> Self {
        let locations = default_locations();
        let mut location_keywords: Vec<&str> = vec!["location", "where", "country"];
        location_keywords.extend(locations.iter().map(String::as_str));
        let location_rule = IntentRule::new("location_focus", &location_keywords, IntentAction::LocationFocus);

        Self {
            rules: vec![
                IntentRule::new(
                    "negative_sentiment",
                    &["complaints", "complaint", "problems", "bad", "negative", "issues", "worst"],
                    IntentAction::Sentiment(Sentiment::Negative),
                ),
                IntentRule::new(
                    "positive_sentiment",
                    &["good", "positive", "recommended", "great", "best"],
                    IntentAction::Sentiment(Sentiment::Positive),
                ),
                IntentRule::new(
                    "problem_focus",
                    &["battery", "screen", "display", "durability", "performance"],
                    IntentAction::ProblemFocus,
                ),
                location_rule,
                IntentRule::new(
                    "brand_focus",
                    &["samsung", "apple", "sony", "brand", "lg", "google"],
                    IntentAction::BrandFocus,
                ),
            ],
            known_locations: locations,
        }
    }
}

/// A term and the expansions appended to any query containing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymEntry {
    pub term: String,
    pub expansions: Vec<String>,
}

/// Bilingual query expansion table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynonymTable {
    pub entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    fn entry(term: &str, expansions: &[&str]) -> SynonymEntry {
        SynonymEntry {
            term: term.to_string(),
            expansions: strings(expansions),
        }
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        Self {
            entries: vec![
                Self::entry("batería", &["battery", "power", "charge", "duración", "energía"]),
                Self::entry("battery", &["batería", "power", "charge", "duration", "energy"]),
                Self::entry("pantalla", &["screen", "display", "monitor", "visualización"]),
                Self::entry("screen", &["pantalla", "display", "monitor", "visualization"]),
                Self::entry("problems", &["problemas", "issues", "defects", "fallas"]),
                Self::entry("problemas", &["problems", "issues", "defects", "failures"]),
                Self::entry("méxico", &["mexico", "mexican", "latinoamerica"]),
                Self::entry("mexico", &["méxico", "mexican", "latin", "america"]),
            ],
        }
    }
}

/// Score multipliers applied by enhanced search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    pub sentiment_boost: f64,
    pub problem_boost: f64,
    pub location_boost: f64,
    /// Text keywords that count as matching a negative-sentiment intent.
    pub negative_keywords: Vec<String>,
    /// Text keywords that count as matching a positive-sentiment intent.
    pub positive_keywords: Vec<String>,
    /// Text keywords that count as matching a problem-focused intent.
    pub problem_keywords: Vec<String>,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            sentiment_boost: 1.5,
            problem_boost: 1.3,
            location_boost: 1.4,
            negative_keywords: strings(&["bad", "terrible", "problem", "issue"]),
            positive_keywords: strings(&["good", "great", "excellent", "amazing"]),
            problem_keywords: strings(&["battery", "screen", "break", "slow"]),
        }
    }
}

// ---------------------------------------------------------------
// Triple store routing
// ---------------------------------------------------------------

/// Store lookup run when a semantic rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryPattern {
    /// Products with this sentiment, then their `has_problem` triples.
    SentimentProblems { sentiment: Sentiment },
    /// Products with this sentiment, as `has_sentiment` triples.
    SentimentProducts { sentiment: Sentiment },
    /// Every triple about products sold in the matched location keyword.
    ProductsSoldIn,
    /// Products affected by this problem, as `has_problem` triples.
    ProblemProducts { problem: String },
}

/// `keywords` present in the query ⇒ run `pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRule {
    pub name: String,
    pub keywords: Vec<String>,
    pub pattern: QueryPattern,
}

impl SemanticRule {
    pub fn new(name: &str, keywords: &[&str], pattern: QueryPattern) -> Self {
        Self {
            name: name.to_string(),
            keywords: strings(keywords),
            pattern,
        }
    }
}

/// Keyword-to-query routing table for natural-language triple queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticRules {
    pub rules: Vec<SemanticRule>,
    /// Cap on returned triples.
    pub max_results: usize,
}

impl Default for SemanticRules {
    fn default() -> Self {
        let locations = default_locations();
        let location_keywords: Vec<&str> = locations.iter().map(String::as_str).collect();
        Self {
            rules: vec![
                SemanticRule::new(
                    "negative_feedback",
                    &["complaints", "complaint", "problems", "negative", "bad"],
                    QueryPattern::SentimentProblems {
                        sentiment: Sentiment::Negative,
                    },
                ),
                SemanticRule::new(
                    "positive_feedback",
                    &["positive", "praise", "recommended"],
                    QueryPattern::SentimentProducts {
                        sentiment: Sentiment::Positive,
                    },
                ),
                SemanticRule::new("sold_in_location", &location_keywords, QueryPattern::ProductsSoldIn),
                SemanticRule::new(
                    "battery_problems",
                    &["battery", "charge"],
                    QueryPattern::ProblemProducts {
                        problem: "battery".into(),
                    },
                ),
                SemanticRule::new(
                    "screen_problems",
                    &["screen", "display"],
                    QueryPattern::ProblemProducts {
                        problem: "screen".into(),
                    },
                ),
                SemanticRule::new(
                    "durability_problems",
                    &["durability", "broken", "fragile"],
                    QueryPattern::ProblemProducts {
                        problem: "durability".into(),
                    },
                ),
                SemanticRule::new(
                    "performance_problems",
                    &["performance", "slow", "lag"],
                    QueryPattern::ProblemProducts {
                        problem: "performance".into(),
                    },
                ),
            ],
            max_results: 20,
        }
    }
}

// ---------------------------------------------------------------
// Top level
// ---------------------------------------------------------------

/// Top-level ReviewGraph configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub patterns: ExtractorPatterns,
    pub sentiment: SentimentLexicon,
    pub problems: ProblemLexicon,
    pub tokenizer: TokenizerConfig,
    pub search: SearchConfig,
    pub intents: IntentRules,
    pub synonyms: SynonymTable,
    pub boosts: BoostConfig,
    pub semantic: SemanticRules,
    /// Entity recognizer model: a gazetteer JSON file, or an ONNX model directory
    /// (`onnx` feature). `None` uses the built-in gazetteer.
    pub ner_model: Option<PathBuf>,
}

impl AppConfig {
    /// Load from a TOML file; omitted tables fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply scalar overrides from the environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("REVIEWGRAPH_MIN_WORDS") {
            match raw.parse() {
                Ok(min_words) => self.pipeline.min_words = min_words,
                Err(_) => tracing::warn!("Ignoring invalid REVIEWGRAPH_MIN_WORDS={:?}", raw),
            }
        }
        if let Ok(model) = std::env::var("REVIEWGRAPH_NER_MODEL") {
            if !model.is_empty() {
                self.ner_model = Some(PathBuf::from(model));
            }
        }
        self
    }

    /// Fingerprint of everything that influences enrichment output.
    ///
    /// Part of the enrichment cache key: a changed table invalidates cached records.
    pub fn extractor_fingerprint(&self) -> String {
        let payload = serde_json::json!({
            "pipeline": self.pipeline,
            "patterns": self.patterns,
            "sentiment": self.sentiment,
            "problems": self.problems,
            "ner_model": self.ner_model,
        });
        let mut hasher = Sha256::new();
        hasher.update(payload.to_string().as_bytes());
        hex::encode(hasher.finalize())[..16].to_string()
    }
}

/// Server settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_paths: DataPaths,
}

impl ServerConfig {
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("REVIEWGRAPH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3030);

        Ok(Self {
            port,
            data_paths: DataPaths::new(data_dir)?,
        })
    }
}

/// NLTK's English stopword list.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];
