//! Façade behaviour over real files: load, cache, search, export, restore.

use std::path::{Path, PathBuf};

use reviewgraph_core::{AppConfig, Error};
use reviewgraph_resolve::{IndexState, SearchFilters, SearchStatus};
use reviewgraph_runtime::{GraphView, QueryFacade};
use reviewgraph_store::{read_export, read_stats, EnrichmentCache, Predicate, Triple};

const REVIEWS: &str = "\
text,title,rating,asin
\"My Samsung Galaxy battery is terrible, it dies fast. Paid $199.99\",Bad battery,1.5,B001
\"I bought the XYZ-200 for $49.99 on March 3, 2022 from John in Mexico\",Gift,4,B002
\"The Apple iPhone screen is great and the display is excellent\",Love it,5,B003
\"Sony headphones sound amazing, see https://example.com for details\",Great sound,4.5,B004
\"Cable arrived late and frayed, contact me at someone@example.com\",Meh,2,B005
\"Pixel from Google works well, lasts two days\",Solid,4,B006
";

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.search.min_score = 0.0;
    config.search.enhanced_min_score = 0.0;
    config
}

fn write_reviews(dir: &Path) -> PathBuf {
    let path = dir.join("reviews.csv");
    std::fs::write(&path, REVIEWS).unwrap();
    path
}

fn facade_with_cache(dir: &Path) -> QueryFacade {
    let cache = EnrichmentCache::open(dir.join("cache").join("enrichment.db")).unwrap();
    QueryFacade::new(config(), Some(cache)).unwrap()
}

#[test]
fn test_load_and_query() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    let facade = QueryFacade::new(config(), None).unwrap();

    let summary = facade.load(&path).unwrap();
    assert_eq!(summary.report.total, 6);
    assert_eq!(summary.report.kept, 6);
    assert_eq!(summary.index_state, IndexState::Indexed);
    assert!(!summary.from_cache);
    assert!(summary.triples > 0);

    let answer = facade.search("battery complaints", Some(5));
    assert_eq!(answer.status, SearchStatus::Ok);
    assert_eq!(answer.hits[0].hit.review_id, 0);
    assert!(answer.hits[0].problems.contains(&"battery".to_string()));
    assert!(!answer.semantic.triples.is_empty());

    let stats = facade.stats();
    assert_eq!(stats.records, 6);
    assert_eq!(stats.recognizer, "builtin-gazetteer");
    assert_eq!(stats.triples.total_triples, summary.triples);
}

#[test]
fn test_scenario_record_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    let facade = QueryFacade::new(config(), None).unwrap();
    facade.load(&path).unwrap();

    let dataset = facade.dataset();
    let record = dataset.engine.record(1).unwrap();
    assert_eq!(record.prices_joined(), "$49.99");
    assert!(record.dates.iter().any(|d| d.contains("march 3, 2022")));
    assert!(record.models.iter().any(|m| m == "XYZ-200"));
    assert_eq!(record.entities.persons, vec!["John"]);
    assert_eq!(record.entities.locations, vec!["Mexico"]);

    let filters = SearchFilters {
        location: Some("mex".into()),
        ..Default::default()
    };
    let answer = facade.filtered_search(&filters, None, None);
    assert_eq!(answer.hits.len(), 1);
    let fields = &answer.hits[0].hit.fields;
    assert_eq!(fields["price"], "$49.99");
    assert_eq!(fields["rating"], "★★★★☆ (4.0/5)");
    assert_eq!(fields["person"], "John");
}

#[test]
fn test_second_load_comes_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    let facade = facade_with_cache(dir.path());

    let first = facade.load(&path).unwrap();
    assert!(!first.from_cache);
    let second = facade.reload().unwrap();
    assert!(second.from_cache);
    assert_eq!(first.report, second.report);
    assert_eq!(first.triples, second.triples);

    // A changed file misses the cache
    std::fs::write(&path, format!("{}\"Nokia phone is slow\",Old,3,B007\n", REVIEWS)).unwrap();
    let third = facade.load(&path).unwrap();
    assert!(!third.from_cache);
    assert_eq!(third.report.total, 7);
}

#[test]
fn test_cache_survives_new_facade() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    facade_with_cache(dir.path()).load(&path).unwrap();
    let summary = facade_with_cache(dir.path()).load(&path).unwrap();
    assert!(summary.from_cache);
}

#[test]
fn test_model_edit_misses_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.csv");
    std::fs::write(
        &path,
        "text,rating\n\"The Zetatron blender is loud but it crushes ice fine\",3\n",
    )
    .unwrap();
    let model = dir.path().join("ner.json");
    let open = |model_json: &str| {
        std::fs::write(&model, model_json).unwrap();
        let mut config = config();
        config.ner_model = Some(model.clone());
        let cache = EnrichmentCache::open(dir.path().join("cache").join("enrichment.db")).unwrap();
        QueryFacade::new(config, Some(cache)).unwrap()
    };

    let first = open(r#"{"name": "shop", "brands": ["Acme"]}"#);
    assert!(!first.load(&path).unwrap().from_cache);
    assert!(first.dataset().records[0].entities.brands.is_empty());
    assert!(open(r#"{"name": "shop", "brands": ["Acme"]}"#)
        .load(&path)
        .unwrap()
        .from_cache);

    // Same path, same model name, different terms
    let edited = open(r#"{"name": "shop", "brands": ["Zetatron"]}"#);
    let summary = edited.load(&path).unwrap();
    assert!(!summary.from_cache);
    assert_eq!(summary.report.with_brands, 1);
    assert_eq!(edited.dataset().records[0].entities.brands, vec!["Zetatron"]);
}

#[test]
fn test_bad_input_keeps_previous_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    let facade = QueryFacade::new(config(), None).unwrap();
    facade.load(&path).unwrap();

    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "body,rating\nhello,3\n").unwrap();
    let err = facade.load(&bad).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(ref c) if c == "text"));

    let empty = dir.path().join("empty.csv");
    std::fs::write(&empty, "text,rating\n").unwrap();
    assert!(matches!(facade.load(&empty), Err(Error::EmptyDataset(_))));

    assert!(matches!(
        facade.load(&dir.path().join("missing.csv")),
        Err(Error::InvalidInput(_))
    ));

    assert_eq!(facade.stats().records, 6);
    assert_eq!(facade.dataset().source.as_deref(), Some(path.as_path()));
}

#[test]
fn test_export_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    let facade = QueryFacade::new(config(), None).unwrap();
    facade.load(&path).unwrap();

    let out = dir.path().join("exports").join("triples.csv");
    std::fs::create_dir_all(out.parent().unwrap()).unwrap();
    let summary = facade.export_triples(&out).unwrap();

    let mut read = read_export(&out).unwrap();
    read.sort();
    let dataset = facade.dataset();
    assert_eq!(read, dataset.store.query(None, None, None));
    assert_eq!(read_stats(&summary.stats_path).unwrap(), summary.stats);
    assert!(read.contains(&Triple::new("Galaxy", Predicate::IsBrandOf, "Samsung")));

    let unwritable = facade.export_triples(Path::new("/nonexistent/dir/triples.csv"));
    assert!(matches!(unwritable, Err(Error::Export(_))));
}

#[test]
fn test_enriched_file_restores_entities() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    let facade = QueryFacade::new(config(), None).unwrap();
    facade.load(&path).unwrap();
    let before = facade.dataset();

    let enriched = dir.path().join("reviews_enriched.csv");
    facade.write_enriched(&enriched).unwrap();

    let restored = QueryFacade::new(config(), None).unwrap();
    restored.load(&enriched).unwrap();
    let dataset = restored.dataset();
    assert_eq!(dataset.records.len(), before.records.len());
    for (a, b) in before.records.iter().zip(dataset.records.iter()) {
        assert_eq!(a.entities, b.entities);
        assert_eq!(a.prices, b.prices);
        assert_eq!(a.dates, b.dates);
        assert_eq!(a.sentiment, b.sentiment);
    }
    assert_eq!(dataset.store.len(), before.store.len());
}

#[test]
fn test_graph_views() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_reviews(dir.path());
    let facade = QueryFacade::new(config(), None).unwrap();
    facade.load(&path).unwrap();

    let full = facade.graph(GraphView::Full);
    let sentiment = facade.graph(GraphView::Sentiment);
    assert!(full.stats().edge_count > sentiment.stats().edge_count);
    assert!(full
        .neighbors("Galaxy")
        .iter()
        .any(|n| n.label == "Samsung" && n.predicate == Predicate::IsBrandOf));
    assert!(!facade.graph(GraphView::Product).contains("negative"));
}
