//! SQLite schema for the enrichment cache.

/// One row per dataset path; a re-enrichment replaces the row.
pub const CACHE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS enrichment_cache (
    dataset_path TEXT PRIMARY KEY,
    cache_key TEXT NOT NULL,
    record_count INTEGER NOT NULL,
    records_json TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_enrichment_cache_key ON enrichment_cache(cache_key);
"#;
