//! Record builders shared by this crate's tests.

use reviewgraph_core::{EnrichedRecord, EntitySet, ReviewRecord, Sentiment};

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn record(
    id: usize,
    products: &[&str],
    brands: &[&str],
    locations: &[&str],
    sentiment: Sentiment,
    problems: &[&str],
) -> EnrichedRecord {
    let mut rec = EnrichedRecord::bare(ReviewRecord::new(id, "text"), "text".into());
    rec.entities = EntitySet {
        products: owned(products),
        brands: owned(brands),
        locations: owned(locations),
        persons: vec![],
    };
    rec.sentiment = sentiment;
    rec.problems = owned(problems);
    rec
}
