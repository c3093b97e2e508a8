//! Enriched CSV output: pass-through columns followed by the derived columns,
//! each a comma-joined string (empty when nothing was found).

use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use reviewgraph_core::record::columns;
use reviewgraph_core::{EnrichedRecord, Error, Result};

/// Pass-through header order: the source headers when known, otherwise
/// `text`, `title`, `rating` and the first record's metadata keys.
fn passthrough_headers(records: &[EnrichedRecord], source_headers: Option<&[String]>) -> Vec<String> {
    let headers: Vec<String> = match source_headers {
        Some(h) if !h.is_empty() => h.to_vec(),
        _ => {
            let mut h = vec![
                columns::TEXT.to_string(),
                columns::TITLE.to_string(),
                columns::RATING.to_string(),
            ];
            if let Some(first) = records.first() {
                h.extend(first.record.metadata.iter().map(|(k, _)| k.clone()));
            }
            h
        }
    };
    headers.into_iter().filter(|h| !columns::is_derived(h)).collect()
}

fn passthrough_value(record: &EnrichedRecord, header: &str) -> String {
    match header {
        columns::TEXT => record.record.text.clone(),
        columns::TITLE => record.record.title.clone().unwrap_or_default(),
        columns::RATING => record.record.rating.map(|r| r.to_string()).unwrap_or_default(),
        other => record.record.metadata_value(other).unwrap_or("").to_string(),
    }
}

/// Derived column values in `columns::DERIVED` order.
pub fn derived_values(record: &EnrichedRecord) -> [String; 7] {
    [
        record.prices_joined(),
        record.dates.join(", "),
        record.models.join(", "),
        record.entities.products.join(", "),
        record.entities.brands.join(", "),
        record.entities.locations.join(", "),
        record.entities.persons.join(", "),
    ]
}

/// Write enriched records to `path`. The file is written to a temporary
/// sibling and renamed into place, so a failed write leaves no partial file.
pub fn write_enriched(
    path: &Path,
    records: &[EnrichedRecord],
    source_headers: Option<&[String]>,
) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(parent)
        .map_err(|e| Error::Export(format!("{}: {}", parent.display(), e)))?;

    let headers = passthrough_headers(records, source_headers);
    {
        let mut wtr = csv::Writer::from_writer(tmp.as_file());
        let mut header_row: Vec<&str> = headers.iter().map(String::as_str).collect();
        header_row.extend(columns::DERIVED.iter().copied());
        wtr.write_record(&header_row)?;

        for record in records {
            let mut row: Vec<String> = headers.iter().map(|h| passthrough_value(record, h)).collect();
            row.extend(derived_values(record));
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
    }

    tmp.persist(path)
        .map_err(|e| Error::Export(format!("{}: {}", path.display(), e)))?;
    info!("Wrote {} enriched records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewgraph_core::{Price, ReviewRecord};

    use crate::loader::load_reviews;

    fn sample() -> EnrichedRecord {
        let mut rec = EnrichedRecord::bare(
            ReviewRecord::new(0, "Paid $5 and $12")
                .with_title("Ok")
                .with_metadata("asin", "B01"),
            "Paid $5 and $12".into(),
        );
        rec.prices = vec![Price::from_cents(500), Price::from_cents(1200)];
        rec.entities.brands = vec!["Acme".into(), "Globex".into()];
        rec
    }

    #[test]
    fn test_writes_passthrough_then_derived_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let headers = vec!["asin".to_string(), "text".to_string(), "title".to_string()];
        write_enriched(&path, &[sample()], Some(&headers)).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert_eq!(
            lines.next().unwrap(),
            "asin,text,title,extracted_prices,extracted_purchase_dates,extracted_product_models,\
             ner_products,ner_brands,ner_locations,ner_persons"
        );
        assert_eq!(
            lines.next().unwrap(),
            "B01,Paid $5 and $12,Ok,\"$5.00, $12.00\",,,,\"Acme, Globex\",,"
        );
    }

    #[test]
    fn test_output_reloads_as_enriched_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_enriched(&path, &[sample()], None).unwrap();

        let table = load_reviews(&path).unwrap();
        assert!(table.is_enriched());
        assert_eq!(table.records[0].metadata_value("ner_brands"), Some("Acme, Globex"));
        assert_eq!(table.records[0].title.as_deref(), Some("Ok"));
    }

    #[test]
    fn test_unwritable_destination_is_export_error() {
        let err = write_enriched(Path::new("/nonexistent/dir/out.csv"), &[sample()], None)
            .unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }
}
