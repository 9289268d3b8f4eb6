//! TF-IDF cosine scorer.
//!
//! The query is treated as one more document: the corpus for a call is
//! `{query} ∪ candidates`. Weights use raw term counts and smoothed inverse
//! document frequency,
//!
//! ```text
//! idf(t) = ln((1 + n) / (1 + df(t))) + 1
//! ```
//!
//! where `n` counts the query too. Each passage scores the cosine between
//! its weight vector and the query's. A passage sharing no vocabulary with
//! the query (or with an empty vector) scores `0.0`.
//!
//! Vocabularies are ordered maps, so every sum is taken in the same term
//! order and results are bit-identical across runs.

use std::collections::BTreeMap;

use crate::models::Method;
use crate::text::normalize_terms;

use super::{rank, Candidate, ScoredPassage, Scorer};

type TermCounts<'a> = BTreeMap<&'a str, f64>;

/// Smoothed TF-IDF cosine scorer.
#[derive(Debug, Clone, Default)]
pub struct TfidfScorer {
    _private: (),
}

impl TfidfScorer {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Scorer for TfidfScorer {
    fn method(&self) -> Method {
        Method::Tfidf
    }

    fn score<'g>(&self, query: &str, candidates: &[Candidate<'g>]) -> Vec<ScoredPassage<'g>> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let query_terms = normalize_terms(query);
        let query_tf = term_counts(query_terms.iter().map(String::as_str));
        let passage_tfs: Vec<TermCounts> = candidates
            .iter()
            .map(|c| term_counts(c.passage.normalized_terms().iter().map(String::as_str)))
            .collect();

        let n_docs = (candidates.len() + 1) as f64;
        let mut df: BTreeMap<&str, f64> = BTreeMap::new();
        for tf in std::iter::once(&query_tf).chain(passage_tfs.iter()) {
            for term in tf.keys() {
                *df.entry(*term).or_insert(0.0) += 1.0;
            }
        }
        let idf = |term: &str| -> f64 {
            let d = df.get(term).copied().unwrap_or(0.0);
            ((1.0 + n_docs) / (1.0 + d)).ln() + 1.0
        };

        let query_vec = weigh(&query_tf, &idf);
        let query_norm = l2_norm(&query_vec);

        let scored = candidates
            .iter()
            .zip(passage_tfs.iter())
            .enumerate()
            .map(|(position, (c, tf))| {
                let passage_vec = weigh(tf, &idf);
                let passage_norm = l2_norm(&passage_vec);
                let score = if query_norm < f64::EPSILON || passage_norm < f64::EPSILON {
                    0.0
                } else {
                    let dot: f64 = query_vec
                        .iter()
                        .filter_map(|(term, q)| passage_vec.get(term).map(|p| q * p))
                        .sum();
                    (dot / (query_norm * passage_norm)).clamp(0.0, 1.0)
                };
                ScoredPassage {
                    bucket: c.bucket,
                    passage: c.passage,
                    position,
                    score,
                }
            })
            .collect();

        rank(scored)
    }
}

fn term_counts<'a>(terms: impl Iterator<Item = &'a str>) -> TermCounts<'a> {
    let mut counts = BTreeMap::new();
    for t in terms {
        *counts.entry(t).or_insert(0.0) += 1.0;
    }
    counts
}

fn weigh<'a>(tf: &TermCounts<'a>, idf: &impl Fn(&str) -> f64) -> TermCounts<'a> {
    tf.iter().map(|(term, count)| (*term, count * idf(*term))).collect()
}

fn l2_norm(vec: &TermCounts<'_>) -> f64 {
    vec.values().map(|w| w * w).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketId, TextPassage};

    fn cands(passages: &[TextPassage]) -> Vec<Candidate<'_>> {
        passages
            .iter()
            .map(|passage| Candidate {
                bucket: BucketId::Install,
                passage,
            })
            .collect()
    }

    #[test]
    fn test_known_value_two_document_corpus() {
        // query terms {install, sdk}; passage {run, pip, install, example, sdk}.
        // Shared terms have df=2 → idf=1; passage-only terms idf=ln(3/2)+1.
        let passages = vec![TextPassage::new("Run: pip install example-sdk")];
        let ranked = TfidfScorer::new().score("How do I install the sdk?", &cands(&passages));
        let rare = (3.0f64 / 2.0).ln() + 1.0;
        let expected = 2.0 / (2.0f64.sqrt() * (2.0 + 3.0 * rare * rare).sqrt());
        assert!((ranked[0].score - expected).abs() < 1e-12);
        assert!(ranked[0].score > 0.1);
    }

    #[test]
    fn test_identical_text_scores_one() {
        let passages = vec![TextPassage::new("battery pools")];
        let ranked = TfidfScorer::new().score("battery pools", &cands(&passages));
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_shared_vocabulary_scores_zero() {
        let passages = vec![TextPassage::new("A toolkit for energy automation.")];
        let ranked = TfidfScorer::new().score("weather today", &cands(&passages));
        assert_eq!(ranked[0].score, 0.0);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let passages = vec![TextPassage::new("battery")];
        let ranked = TfidfScorer::new().score("?", &cands(&passages));
        assert_eq!(ranked[0].score, 0.0);
    }

    #[test]
    fn test_no_candidates_empty_result() {
        assert!(TfidfScorer::new().score("battery", &[]).is_empty());
    }

    #[test]
    fn test_rare_term_outranks_common_term() {
        let passages = vec![
            TextPassage::new("microgrid battery"),
            TextPassage::new("microgrid inverter"),
            TextPassage::new("microgrid solar"),
        ];
        let ranked = TfidfScorer::new().score("battery microgrid", &cands(&passages));
        assert_eq!(ranked[0].passage.raw_text(), "microgrid battery");
        assert!(ranked[0].score > ranked[1].score);
        // The two non-matching passages tie and keep their order.
        assert_eq!(ranked[1].position, 1);
        assert_eq!(ranked[2].position, 2);
    }

    #[test]
    fn test_scores_bounded() {
        let passages = vec![
            TextPassage::new("sdk sdk sdk"),
            TextPassage::new("sdk install"),
            TextPassage::new(""),
        ];
        for sp in TfidfScorer::new().score("sdk install sdk", &cands(&passages)) {
            assert!((0.0..=1.0).contains(&sp.score), "score out of range: {}", sp.score);
        }
    }
}
