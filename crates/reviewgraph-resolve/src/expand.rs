//! Synonym expansion for enhanced search.

use reviewgraph_core::{QueryText, SynonymTable};

/// `query` followed by the expansions of every table term it contains, in
/// table order.
pub fn expand_query(query: &str, table: &SynonymTable) -> String {
    let text = QueryText::new(query);
    let mut expanded = query.to_string();
    for entry in &table.entries {
        if text.has(&entry.term) {
            for word in &entry.expansions {
                expanded.push(' ');
                expanded.push_str(word);
            }
        }
    }
    expanded
}
