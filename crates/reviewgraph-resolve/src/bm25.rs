//! BM25 Okapi index over pre-tokenized documents.
//!
//! IDF is `ln((N - n + 0.5) / (n + 0.5))`; terms whose IDF comes out
//! negative (present in more than half the corpus) get `epsilon * mean_idf`
//! instead. Query terms absent from the corpus contribute nothing, and a
//! term repeated in the query counts once per occurrence.

use std::collections::HashMap;

use reviewgraph_core::SearchConfig;

#[derive(Debug, Clone)]
pub struct Bm25Index {
    /// Caller-supplied key of each indexed document.
    keys: Vec<usize>,
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
    idf: HashMap<String, f64>,
    k1: f64,
    b: f64,
}

impl Bm25Index {
    /// Build from `(key, tokens)` pairs. Documents with no tokens are left
    /// out; `None` when nothing remains.
    pub fn build<I>(docs: I, config: &SearchConfig) -> Option<Self>
    where
        I: IntoIterator<Item = (usize, Vec<String>)>,
    {
        let mut keys = Vec::new();
        let mut term_freqs = Vec::new();
        let mut doc_lens = Vec::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for (key, tokens) in docs {
            if tokens.is_empty() {
                continue;
            }
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in &tokens {
                *freqs.entry(token.clone()).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            keys.push(key);
            doc_lens.push(tokens.len());
            term_freqs.push(freqs);
        }

        if keys.is_empty() {
            return None;
        }

        let n = keys.len() as f64;
        let avg_doc_len = doc_lens.iter().sum::<usize>() as f64 / n;

        let mut idf: HashMap<String, f64> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                (term, ((n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();
        let mean_idf = idf.values().sum::<f64>() / idf.len() as f64;
        let floor = config.epsilon * mean_idf;
        for value in idf.values_mut() {
            if *value < 0.0 {
                *value = floor;
            }
        }

        Some(Self {
            keys,
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
            k1: config.k1,
            b: config.b,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Score of every indexed document for `query`, as `(key, score)` in
    /// index order.
    pub fn scores(&self, query: &[String]) -> Vec<(usize, f64)> {
        let weighted: Vec<(&str, f64)> = query
            .iter()
            .filter_map(|q| self.idf.get(q).map(|idf| (q.as_str(), *idf)))
            .collect();

        self.keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let freqs = &self.term_freqs[i];
                let norm = self.k1 * (1.0 - self.b + self.b * self.doc_lens[i] as f64 / self.avg_doc_len);
                let score = weighted
                    .iter()
                    .map(|(term, idf)| {
                        let tf = freqs.get(*term).copied().unwrap_or(0) as f64;
                        idf * tf * (self.k1 + 1.0) / (tf + norm)
                    })
                    .sum();
                (*key, score)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(key: usize, text: &str) -> (usize, Vec<String>) {
        (key, text.split_whitespace().map(str::to_string).collect())
    }

    fn corpus() -> Bm25Index {
        Bm25Index::build(
            vec![
                doc(0, "battery died fast"),
                doc(1, "screen cracked"),
                doc(2, ""),
                doc(3, "great sound quality"),
                doc(4, "battery battery battery lasts"),
                doc(5, "cheap cable"),
                doc(6, "fast shipping"),
            ],
            &SearchConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_documents_excluded() {
        let index = corpus();
        assert_eq!(index.len(), 6);
        let keys: Vec<usize> = index.scores(&[]).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 3, 4, 5, 6]);
    }

    #[test]
    fn test_nothing_indexable_is_none() {
        assert!(Bm25Index::build(vec![doc(0, ""), doc(1, "")], &SearchConfig::default()).is_none());
        assert!(Bm25Index::build(Vec::new(), &SearchConfig::default()).is_none());
    }

    #[test]
    fn test_matching_documents_score_higher() {
        let index = corpus();
        let scores: HashMap<usize, f64> =
            index.scores(&["battery".to_string()]).into_iter().collect();
        assert!(scores[&0] > 0.0);
        assert!(scores[&4] > scores[&0]);
        assert_eq!(scores[&1], 0.0);
        assert_eq!(scores[&3], 0.0);
    }

    #[test]
    fn test_unknown_terms_score_zero() {
        let index = corpus();
        assert!(index
            .scores(&["nonexistent".to_string()])
            .iter()
            .all(|(_, s)| *s == 0.0));
    }

    #[test]
    fn test_repeated_query_terms_accumulate() {
        let index = corpus();
        let once = index.scores(&["screen".to_string()]);
        let twice = index.scores(&["screen".to_string(), "screen".to_string()]);
        assert!((twice[1].1 - 2.0 * once[1].1).abs() < 1e-9);
    }

    #[test]
    fn test_common_term_gets_epsilon_floor() {
        // "phone" is in 3 of 4 documents so its raw IDF is negative
        let index = Bm25Index::build(
            vec![
                doc(0, "phone good"),
                doc(1, "phone bad"),
                doc(2, "phone fine"),
                doc(3, "tablet"),
            ],
            &SearchConfig::default(),
        )
        .unwrap();
        let scores = index.scores(&["phone".to_string()]);
        assert!(scores[0].1 > 0.0);
        assert_eq!(scores[3].1, 0.0);
    }

    fn assert_scores(index: &Bm25Index, query: &[&str], expected: &[f64]) {
        let query: Vec<String> = query.iter().map(|t| t.to_string()).collect();
        let got: Vec<f64> = index.scores(&query).into_iter().map(|(_, s)| s).collect();
        assert_eq!(got.len(), expected.len());
        for (i, (g, e)) in got.iter().zip(expected).enumerate() {
            assert!((g - e).abs() < 1e-9, "doc {}: got {}, expected {}", i, g, e);
        }
    }

    #[test]
    fn test_scores_match_okapi_reference() {
        // Reference values from rank_bm25's BM25Okapi (k1=1.5, b=0.75, epsilon=0.25).
        // "phone" is in 4 of 5 documents: raw IDF ln(1.5/4.5) < 0, floored to
        // 0.25 * mean_idf = 0.1417421906873841.
        let index = Bm25Index::build(
            vec![
                doc(0, "phone battery died phone"),
                doc(1, "phone screen great"),
                doc(2, "phone battery great battery great"),
                doc(3, "tablet case"),
                doc(4, "phone"),
            ],
            &SearchConfig::default(),
        )
        .unwrap();

        assert_scores(
            &index,
            &["battery", "great"],
            &[0.2925845535836634, 0.3364722366212129, 0.7916993802852068, 0.0, 0.0],
        );
        assert_scores(
            &index,
            &["phone"],
            &[
                0.18289314927404401,
                0.1417421906873841,
                0.10903245437491085,
                0.0,
                0.20248884383912016,
            ],
        );
    }
}
