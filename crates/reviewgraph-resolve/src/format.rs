//! Display fields for search hits.

use std::collections::BTreeMap;

use reviewgraph_core::EnrichedRecord;

/// Placeholder for a field with no value.
pub const MISSING: &str = "N/A";

fn joined(values: &[String]) -> String {
    if values.is_empty() {
        MISSING.to_string()
    } else {
        values.join(", ")
    }
}

/// `★★★½☆ (3.5/5)`, or `no rating`.
pub fn star_rating(rating: Option<f64>) -> String {
    let Some(value) = rating.filter(|r| r.is_finite()) else {
        return "no rating".to_string();
    };
    let value = value.clamp(0.0, 5.0);
    let full = value.floor() as usize;
    let half = usize::from(value - full as f64 >= 0.5);
    let empty = 5 - full - half;
    format!(
        "{}{}{} ({:.1}/5)",
        "★".repeat(full),
        "½".repeat(half),
        "☆".repeat(empty),
        value
    )
}

/// A one-line description of the purchase the review describes.
pub fn event_sentence(person: &str, product: &str, date: &str) -> String {
    let has = |v: &str| v != MISSING;
    match (has(person), has(product), has(date)) {
        (true, true, true) => format!("{} bought {} on {}", person, product, date),
        (true, true, false) => format!("{} bought {}", person, product),
        (false, true, true) => format!("Purchase of {} on {}", product, date),
        (_, true, _) => format!("Experience with {}", product),
        _ => "User experience".to_string(),
    }
}

pub fn display_fields(record: &EnrichedRecord) -> BTreeMap<String, String> {
    let entities = &record.entities;
    let product = joined(&entities.products);
    let person = joined(&entities.persons);
    let date = joined(&record.dates);
    let price = if record.prices.is_empty() {
        MISSING.to_string()
    } else {
        record.prices_joined()
    };

    let mut fields = BTreeMap::new();
    fields.insert("event".to_string(), event_sentence(&person, &product, &date));
    fields.insert("brand".to_string(), joined(&entities.brands));
    fields.insert("location".to_string(), joined(&entities.locations));
    fields.insert("model".to_string(), joined(&record.models));
    fields.insert("rating".to_string(), star_rating(record.record.rating));
    fields.insert("price".to_string(), price);
    fields.insert("product".to_string(), product);
    fields.insert("person".to_string(), person);
    fields.insert("date".to_string(), date);
    fields
}
