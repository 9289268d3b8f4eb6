//! Keyword-overlap scorer.
//!
//! `score = |distinct query terms ∩ passage terms| / |distinct query terms|`
//!
//! A passage containing every query term scores `1.0`, one containing none
//! scores `0.0`. A query with no content terms scores `0.0` everywhere.

use std::collections::BTreeSet;

use crate::models::{Method, TextPassage};
use crate::text::normalize_terms;

use super::{rank, Candidate, ScoredPassage, Scorer};

/// Fraction-of-query-terms scorer. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl Scorer for KeywordScorer {
    fn method(&self) -> Method {
        Method::Keyword
    }

    fn score<'g>(&self, query: &str, candidates: &[Candidate<'g>]) -> Vec<ScoredPassage<'g>> {
        let query_terms = normalize_terms(query);
        let distinct: BTreeSet<&str> = query_terms.iter().map(String::as_str).collect();

        let scored = candidates
            .iter()
            .enumerate()
            .map(|(position, c)| {
                ScoredPassage {
                    bucket: c.bucket,
                    passage: c.passage,
                    position,
                    score: overlap(&distinct, c.passage),
                }
            })
            .collect();

        rank(scored)
    }
}

/// Fraction of `query_terms` found in `passage`; `0.0` for no query terms.
pub fn overlap(query_terms: &BTreeSet<&str>, passage: &TextPassage) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let passage_terms: BTreeSet<&str> = passage
        .normalized_terms()
        .iter()
        .map(String::as_str)
        .collect();
    let hits = query_terms.intersection(&passage_terms).count();
    hits as f64 / query_terms.len() as f64
}

/// Shared terms over all distinct terms of `query_terms` and `passage`.
pub fn jaccard(query_terms: &BTreeSet<&str>, passage: &TextPassage) -> f64 {
    let passage_terms: BTreeSet<&str> = passage
        .normalized_terms()
        .iter()
        .map(String::as_str)
        .collect();
    let union = query_terms.union(&passage_terms).count();
    if union == 0 {
        return 0.0;
    }
    query_terms.intersection(&passage_terms).count() as f64 / union as f64
}
