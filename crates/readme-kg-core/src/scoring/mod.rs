//! Passage scoring strategies.
//!
//! The [`Scorer`] trait ranks candidate passages against a query. Two
//! implementations exist:
//!
//! | Strategy | Module | Score |
//! |----------|--------|-------|
//! | TF-IDF cosine (primary) | [`tfidf`] | cosine between smoothed TF-IDF vectors of query and passage |
//! | Keyword overlap (fallback) | [`keyword`] | fraction of distinct query terms present in the passage |
//!
//! [`Strategy`] is the explicit selection between them. The TF-IDF variant
//! only exists when the crate is built with the `tfidf` feature; asking for
//! it otherwise yields [`ScorerError::StrategyUnavailable`].
//!
//! Every scorer returns results sorted by score (descending) with ties kept
//! in candidate order, so output is identical across runs.

pub mod keyword;
#[cfg(feature = "tfidf")]
pub mod tfidf;

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::ScorerError;
use crate::models::{BucketId, KnowledgeGraph, Method, TextPassage};

pub use keyword::KeywordScorer;
#[cfg(feature = "tfidf")]
pub use tfidf::TfidfScorer;

/// A passage offered to a scorer, tagged with the bucket it came from.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'g> {
    pub bucket: BucketId,
    pub passage: &'g TextPassage,
}

/// A candidate with its relevance score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredPassage<'g> {
    pub bucket: BucketId,
    pub passage: &'g TextPassage,
    /// Position of the passage in the candidate list.
    pub position: usize,
    /// Relevance in `[0.0, 1.0]`.
    pub score: f64,
}

/// Owned, serializable form of a [`ScoredPassage`], for explanations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedText {
    pub bucket: BucketId,
    pub text: String,
    pub score: f64,
}

impl From<&ScoredPassage<'_>> for RankedText {
    fn from(sp: &ScoredPassage<'_>) -> Self {
        Self {
            bucket: sp.bucket,
            text: sp.passage.raw_text().to_string(),
            score: sp.score,
        }
    }
}

/// Ranks candidate passages against a query.
pub trait Scorer: Send + Sync {
    /// Which [`Method`] this scorer reports.
    fn method(&self) -> Method;

    /// Score every candidate. Results are sorted by score descending; equal
    /// scores keep candidate order. An empty candidate list yields an empty
    /// result.
    fn score<'g>(&self, query: &str, candidates: &[Candidate<'g>]) -> Vec<ScoredPassage<'g>>;
}

/// The scoring strategy chosen for one call.
#[derive(Debug, Clone)]
pub enum Strategy {
    #[cfg(feature = "tfidf")]
    Tfidf(TfidfScorer),
    Keyword(KeywordScorer),
}

impl Strategy {
    /// The TF-IDF strategy, if this build includes it.
    #[cfg(feature = "tfidf")]
    pub fn tfidf() -> Result<Self, ScorerError> {
        Ok(Strategy::Tfidf(TfidfScorer::new()))
    }

    /// The TF-IDF strategy, if this build includes it.
    #[cfg(not(feature = "tfidf"))]
    pub fn tfidf() -> Result<Self, ScorerError> {
        Err(ScorerError::StrategyUnavailable(
            "built without the `tfidf` feature",
        ))
    }

    pub fn keyword() -> Self {
        Strategy::Keyword(KeywordScorer)
    }

    fn scorer(&self) -> &dyn Scorer {
        match self {
            #[cfg(feature = "tfidf")]
            Strategy::Tfidf(s) => s,
            Strategy::Keyword(s) => s,
        }
    }
}

impl Scorer for Strategy {
    fn method(&self) -> Method {
        self.scorer().method()
    }

    fn score<'g>(&self, query: &str, candidates: &[Candidate<'g>]) -> Vec<ScoredPassage<'g>> {
        self.scorer().score(query, candidates)
    }
}

/// Candidates from a single bucket, in extraction order.
pub fn bucket_candidates(graph: &KnowledgeGraph, bucket: BucketId) -> Vec<Candidate<'_>> {
    graph
        .passages(bucket)
        .iter()
        .map(|passage| Candidate { bucket, passage })
        .collect()
}

/// Candidates from every bucket, bucket by bucket in [`BucketId`] order.
pub fn all_candidates(graph: &KnowledgeGraph) -> Vec<Candidate<'_>> {
    graph
        .buckets()
        .flat_map(|(bucket, passages)| passages.iter().map(move |passage| Candidate { bucket, passage }))
        .collect()
}

/// Highest score in a ranked list (`0.0` when empty).
pub fn top_score(ranked: &[ScoredPassage<'_>]) -> f64 {
    ranked.first().map(|sp| sp.score).unwrap_or(0.0)
}

/// Stable descending sort shared by all scorers.
pub(crate) fn rank(mut scored: Vec<ScoredPassage<'_>>) -> Vec<ScoredPassage<'_>> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::builder("p", "d")
            .passage(BucketId::Install, "pip install p")
            .passages(BucketId::Features, ["fast", "small"])
            .passage(BucketId::License, "MIT")
            .build()
    }

    #[test]
    fn test_all_candidates_in_bucket_order() {
        let g = graph();
        let buckets: Vec<BucketId> = all_candidates(&g).iter().map(|c| c.bucket).collect();
        assert_eq!(
            buckets,
            vec![
                BucketId::Install,
                BucketId::Features,
                BucketId::Features,
                BucketId::License
            ]
        );
    }

    #[test]
    fn test_bucket_candidates_empty_bucket() {
        let g = graph();
        assert!(bucket_candidates(&g, BucketId::Example).is_empty());
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let g = graph();
        let cands = all_candidates(&g);
        let scored: Vec<ScoredPassage> = cands
            .iter()
            .enumerate()
            .map(|(i, c)| ScoredPassage {
                bucket: c.bucket,
                passage: c.passage,
                position: i,
                score: if i == 2 { 0.9 } else { 0.3 },
            })
            .collect();
        let ranked = rank(scored);
        let order: Vec<usize> = ranked.iter().map(|s| s.position).collect();
        assert_eq!(order, vec![2, 0, 1, 3]);
    }

    #[test]
    fn test_keyword_strategy_always_available() {
        assert_eq!(Strategy::keyword().method(), Method::Keyword);
    }

    #[cfg(feature = "tfidf")]
    #[test]
    fn test_tfidf_strategy_available_with_feature() {
        assert_eq!(Strategy::tfidf().unwrap().method(), Method::Tfidf);
    }

    #[cfg(not(feature = "tfidf"))]
    #[test]
    fn test_tfidf_strategy_unavailable_without_feature() {
        assert!(matches!(
            Strategy::tfidf(),
            Err(ScorerError::StrategyUnavailable(_))
        ));
    }
}
