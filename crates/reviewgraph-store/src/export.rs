//! Triple export: a flat CSV (`subject,predicate,object,type`) plus a
//! `<stem>_stats.json` summary beside it.
//!
//! Both files are written to temporary siblings and renamed into place, so
//! an unwritable destination leaves nothing behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use reviewgraph_core::{Error, Result};

use crate::predicate::Predicate;
use crate::triples::{Triple, TripleStats, TripleStore};

/// Value of the `type` column for every exported row.
pub const RELATION_TYPE: &str = "semantic_relation";

#[derive(Debug, Serialize, Deserialize)]
struct ExportRow {
    subject: String,
    predicate: String,
    object: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Where an export landed and what it contained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub stats_path: PathBuf,
    pub stats: TripleStats,
}

/// `<dir>/<stem>_stats.json` for an export at `<dir>/<stem>.<ext>`.
pub fn stats_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("triples");
    path.with_file_name(format!("{}_stats.json", stem))
}

fn export_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Export(format!("{}: {}", path.display(), e))
}

fn temp_beside(path: &Path) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(parent).map_err(|e| export_err(path, e))
}

/// Write every triple in `store` to `path`. Returns the summary on success.
pub fn export_triples(store: &TripleStore, path: &Path) -> Result<ExportSummary> {
    let stats_path = stats_path_for(path);
    let csv_tmp = temp_beside(path)?;
    let mut stats_tmp = temp_beside(&stats_path)?;

    {
        // Header written explicitly so an empty store still yields a valid table
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(csv_tmp.as_file());
        wtr.write_record(["subject", "predicate", "object", "type"])
            .map_err(|e| export_err(path, e))?;
        for t in store.iter() {
            wtr.serialize(ExportRow {
                subject: t.subject,
                predicate: t.predicate.as_str().to_string(),
                object: t.object,
                kind: RELATION_TYPE.to_string(),
            })
            .map_err(|e| export_err(path, e))?;
        }
        wtr.flush().map_err(|e| export_err(path, e))?;
    }

    let stats = store.stats();
    let json = serde_json::to_string_pretty(&stats)?;
    stats_tmp
        .write_all(json.as_bytes())
        .map_err(|e| export_err(&stats_path, e))?;

    csv_tmp.persist(path).map_err(|e| export_err(path, e))?;
    if let Err(e) = stats_tmp.persist(&stats_path) {
        // A table without its matching stats file is not an export
        if let Err(rm) = std::fs::remove_file(path) {
            warn!("Could not remove {} after a failed export: {}", path.display(), rm);
        }
        return Err(export_err(&stats_path, e));
    }

    info!(
        "Exported {} triples to {} (stats: {})",
        stats.total_triples,
        path.display(),
        stats_path.display()
    );
    Ok(ExportSummary {
        path: path.to_path_buf(),
        stats_path,
        stats,
    })
}

/// Read an export back into triples, in file order.
pub fn read_export(path: &Path) -> Result<Vec<Triple>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut triples = Vec::new();
    for row in rdr.deserialize() {
        let row: ExportRow = row?;
        let predicate: Predicate = row.predicate.parse()?;
        triples.push(Triple::new(row.subject, predicate, row.object));
    }
    Ok(triples)
}

/// Read a stats companion file.
pub fn read_stats(path: &Path) -> Result<TripleStats> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::record;
    use reviewgraph_core::Sentiment;

    fn store() -> TripleStore {
        TripleStore::build(&[
            record(0, &["Galaxy"], &["Samsung"], &["Mexico"], Sentiment::Negative, &["battery"]),
            record(1, &["Widget, Pro"], &["Acme \"Co\""], &[], Sentiment::Positive, &[]),
        ])
    }

    #[test]
    fn test_roundtrip_matches_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triples.csv");
        let store = store();
        let summary = export_triples(&store, &path).unwrap();

        let mut read = read_export(&path).unwrap();
        read.sort();
        assert_eq!(read, store.query(None, None, None));
        assert_eq!(summary.stats.total_triples, store.len());
    }

    #[test]
    fn test_stats_companion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.csv");
        let summary = export_triples(&store(), &path).unwrap();

        assert_eq!(summary.stats_path, dir.path().join("graph_stats.json"));
        let stats = read_stats(&summary.stats_path).unwrap();
        assert_eq!(stats, summary.stats);
        assert_eq!(stats, crate::triples::stats_of(read_export(&path).unwrap()));
    }

    #[test]
    fn test_header_and_type_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        export_triples(&store(), &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert_eq!(lines.next(), Some("subject,predicate,object,type"));
        assert!(lines.all(|l| l.ends_with(",semantic_relation")));
    }

    #[test]
    fn test_empty_store_exports_header_only_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let summary = export_triples(&TripleStore::new(), &path).unwrap();
        assert_eq!(summary.stats.total_triples, 0);
        assert!(read_export(&path).unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_destination() {
        let err = export_triples(&store(), Path::new("/nonexistent/dir/t.csv")).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }

    #[test]
    fn test_failed_export_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        // Destination is a directory, so the final rename fails
        let path = dir.path().join("taken");
        std::fs::create_dir(&path).unwrap();
        assert!(export_triples(&store(), &path).is_err());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("taken")]);
    }

    #[test]
    fn test_failed_stats_write_removes_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triples.csv");
        // The stats destination is a directory, so only the second rename fails
        std::fs::create_dir(dir.path().join("triples_stats.json")).unwrap();

        let err = export_triples(&store(), &path).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
        assert!(!path.exists());
        assert!(dir.path().join("triples_stats.json").is_dir());
    }
}
