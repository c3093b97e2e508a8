//! Tabular review loading.
//!
//! A dataset is a CSV file with at least a `text` column. `title` and
//! `rating` are recognized; every other column is carried through as
//! metadata, including derived columns from an earlier enrichment run.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use reviewgraph_core::record::columns;
use reviewgraph_core::{Error, Result, ReviewRecord};

/// Loaded rows plus the header order they came with.
#[derive(Debug, Clone)]
pub struct ReviewTable {
    pub headers: Vec<String>,
    pub records: Vec<ReviewRecord>,
}

impl ReviewTable {
    /// True if every derived column is present, i.e. the file is the output
    /// of a previous enrichment run.
    pub fn is_enriched(&self) -> bool {
        columns::DERIVED
            .iter()
            .all(|c| self.headers.iter().any(|h| h == c))
    }
}

/// Load a CSV dataset. Fails fast on a missing file, a missing `text`
/// column, or zero rows; there is no partial load.
pub fn load_reviews(path: &Path) -> Result<ReviewTable> {
    let file = File::open(path).map_err(|e| {
        Error::InvalidInput(format!("cannot open dataset {}: {}", path.display(), e))
    })?;
    let table = read_reviews(file, &path.display().to_string())?;
    info!("Loaded {} reviews from {}", table.records.len(), path.display());
    Ok(table)
}

/// Parse CSV from any reader. `source` names the input in errors.
pub fn read_reviews<R: Read>(reader: R, source: &str) -> Result<ReviewTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::EmptyDataset(source.to_string()));
    }
    let text_idx = headers
        .iter()
        .position(|h| h == columns::TEXT)
        .ok_or_else(|| Error::MissingColumn(columns::TEXT.to_string()))?;
    let title_idx = headers.iter().position(|h| h == columns::TITLE);
    let rating_idx = headers.iter().position(|h| h == columns::RATING);

    let mut records = Vec::new();
    for (id, row) in rdr.records().enumerate() {
        let row = row?;
        let field = |idx: usize| row.get(idx).unwrap_or("").to_string();

        let mut record = ReviewRecord::new(id, field(text_idx));
        if let Some(idx) = title_idx {
            let title = field(idx);
            if !title.trim().is_empty() {
                record.title = Some(title);
            }
        }
        if let Some(idx) = rating_idx {
            record.rating = parse_rating(&field(idx));
            if record.rating.is_none() && !field(idx).trim().is_empty() {
                debug!("Row {}: ignoring rating {:?}", id, field(idx));
            }
        }
        for (idx, name) in headers.iter().enumerate() {
            if idx != text_idx && Some(idx) != title_idx && Some(idx) != rating_idx {
                record.metadata.push((name.clone(), field(idx)));
            }
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(Error::EmptyDataset(source.to_string()));
    }
    Ok(ReviewTable { headers, records })
}

/// A rating in 0..=5, or `None`.
fn parse_rating(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite() && (0.0..=5.0).contains(r))
}

/// Split a persisted comma-joined column back into values.
pub fn split_joined(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// SHA-256 of the dataset file contents, hex-encoded.
pub fn dataset_digest(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_known_and_passthrough_columns() {
        let csv = "asin,title,text,rating\nB01,Nice,Great phone,4.5\nB02,,Bad,\n";
        let table = read_reviews(csv.as_bytes(), "inline").unwrap();
        assert_eq!(table.records.len(), 2);

        let first = &table.records[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.text, "Great phone");
        assert_eq!(first.title.as_deref(), Some("Nice"));
        assert_eq!(first.rating, Some(4.5));
        assert_eq!(first.metadata_value("asin"), Some("B01"));

        let second = &table.records[1];
        assert_eq!(second.id, 1);
        assert!(second.title.is_none());
        assert!(second.rating.is_none());
        assert!(!table.is_enriched());
    }

    #[test]
    fn test_missing_text_column() {
        let err = read_reviews("title,rating\nA,5\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "text"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(
            read_reviews("".as_bytes(), "empty.csv").unwrap_err(),
            Error::EmptyDataset(_)
        ));
        assert!(matches!(
            read_reviews("text\n".as_bytes(), "header-only.csv").unwrap_err(),
            Error::EmptyDataset(_)
        ));
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let err = load_reviews(Path::new("/nonexistent/reviews.csv")).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_out_of_range_rating_dropped() {
        let table = read_reviews("text,rating\na,9\nb,abc\nc,0\n".as_bytes(), "inline").unwrap();
        let ratings: Vec<_> = table.records.iter().map(|r| r.rating).collect();
        assert_eq!(ratings, vec![None, None, Some(0.0)]);
    }

    #[test]
    fn test_split_joined() {
        assert_eq!(split_joined("Apple, Sony ,,"), vec!["Apple", "Sony"]);
        assert!(split_joined("").is_empty());
    }

    #[test]
    fn test_dataset_digest_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.csv");
        std::fs::write(&path, "text\na\n").unwrap();
        let a = dataset_digest(&path).unwrap();
        std::fs::write(&path, "text\nb\n").unwrap();
        assert_ne!(a, dataset_digest(&path).unwrap());
        assert_eq!(a.len(), 64);
    }
}
