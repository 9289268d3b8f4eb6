//! Retrieval orchestrator: the public entry point of the core.
//!
//! # Algorithm
//!
//! 1. A blank query answers generically with bucket `unknown`.
//! 2. Classify the query ([`BucketClassifier`]).
//! 3. An unclassified query is first matched against the graph's FAQ
//!    questions. The most similar question (Jaccard similarity of content
//!    terms, at least [`FAQ_MIN_SIMILARITY`] and the threshold) returns its
//!    accepted answer verbatim.
//! 4. Candidates are the classified bucket's passages, or every bucket's
//!    passages when the query is unclassified.
//! 5. Score with TF-IDF when available. If it is unavailable, or its top
//!    score is below the confidence threshold, score again by keyword
//!    overlap and keep whichever ranking has the higher top score (TF-IDF
//!    wins ties).
//! 6. An unclassified query whose best passage reaches the threshold is
//!    answered from that passage's bucket; otherwise it stays generic.
//! 7. Compose ([`compose`]).
//!
//! A [`Retriever`] owns its graph and scorers and never mutates them, so
//! `answer` is idempotent and may be called from several threads at once.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::classify::{validate_priority, BucketClassifier, BucketMatch, DEFAULT_PRIORITY};
use crate::compose::{compose, faq_answer, generic_answer};
use crate::error::ParamsError;
use crate::models::{
    AnswerResult, BucketId, FaqEntry, KnowledgeGraph, Method, DEFAULT_CONFIDENCE_THRESHOLD,
};
use crate::scoring::keyword::jaccard;
use crate::scoring::{
    all_candidates, bucket_candidates, top_score, RankedText, ScoredPassage, Scorer, Strategy,
};
use crate::text;

/// Smallest query/question similarity that answers from the FAQ.
pub const FAQ_MIN_SIMILARITY: f64 = 0.5;

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalParams {
    /// Top scores below this are considered inconclusive.
    pub confidence_threshold: f64,
    /// Bucket checking order for the classifier.
    pub priority: Vec<BucketId>,
    /// Whether the TF-IDF strategy may be used.
    pub tfidf_enabled: bool,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            priority: DEFAULT_PRIORITY.to_vec(),
            tfidf_enabled: true,
        }
    }
}

impl RetrievalParams {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ParamsError::InvalidThreshold(self.confidence_threshold));
        }
        validate_priority(&self.priority)
    }
}

/// Everything the orchestrator decided for one query.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub query: String,
    /// Buckets whose triggers matched, in priority order.
    pub matches: Vec<BucketMatch>,
    /// Bucket chosen by the classifier (`None` = unknown).
    pub classified: Option<BucketId>,
    pub candidates: usize,
    /// TF-IDF ranking, when the strategy ran.
    pub tfidf: Option<Vec<RankedText>>,
    /// Keyword ranking, when the fallback ran.
    pub keyword: Option<Vec<RankedText>>,
    pub answer: AnswerResult,
}

/// Answers questions about one knowledge graph.
#[derive(Debug)]
pub struct Retriever {
    graph: KnowledgeGraph,
    params: RetrievalParams,
    classifier: BucketClassifier,
    primary: Option<Strategy>,
    fallback: Strategy,
}

/// Intermediate result of the scoring stage.
struct Outcome<'g> {
    classified: Option<BucketId>,
    candidates: usize,
    tfidf: Option<Vec<ScoredPassage<'g>>>,
    keyword: Option<Vec<ScoredPassage<'g>>>,
    answer: AnswerResult,
}

impl Retriever {
    /// Build a retriever for `graph`. The TF-IDF strategy is set up once
    /// here; when it cannot be, keyword overlap is used for every query.
    pub fn new(graph: KnowledgeGraph, params: RetrievalParams) -> Result<Self, ParamsError> {
        params.validate()?;
        let classifier = BucketClassifier::with_priority(params.priority.clone())?;

        let primary = if params.tfidf_enabled {
            match Strategy::tfidf() {
                Ok(s) => Some(s),
                Err(e) => {
                    debug!(error = %e, "falling back to keyword scoring");
                    None
                }
            }
        } else {
            debug!("tf-idf disabled by configuration");
            None
        };

        debug!(
            fingerprint = %graph.fingerprint(),
            passages = graph.passage_count(),
            tfidf = primary.is_some(),
            "retriever ready"
        );

        Ok(Self {
            graph,
            params,
            classifier,
            primary,
            fallback: Strategy::keyword(),
        })
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn params(&self) -> &RetrievalParams {
        &self.params
    }

    /// Whether the TF-IDF strategy is in use.
    pub fn tfidf_available(&self) -> bool {
        self.primary.is_some()
    }

    /// Answer a free-text question.
    pub fn answer(&self, query: &str) -> AnswerResult {
        self.run(query).answer
    }

    /// Answer a question and report how the answer was reached.
    pub fn explain(&self, query: &str) -> Explanation {
        let outcome = self.run(query);
        Explanation {
            query: query.to_string(),
            matches: self.classifier.classify_all(query),
            classified: outcome.classified,
            candidates: outcome.candidates,
            tfidf: owned(outcome.tfidf),
            keyword: owned(outcome.keyword),
            answer: outcome.answer,
        }
    }

    fn run(&self, query: &str) -> Outcome<'_> {
        let threshold = self.params.confidence_threshold;

        if text::is_blank(query) {
            return Outcome {
                classified: None,
                candidates: 0,
                tfidf: None,
                keyword: None,
                answer: generic_answer(&self.graph, None),
            };
        }

        let classified = self.classifier.classify(query);
        let candidates = match classified {
            Some(bucket) => bucket_candidates(&self.graph, bucket),
            None => all_candidates(&self.graph),
        };
        debug!(?classified, candidates = candidates.len(), "classified query");

        if classified.is_none() {
            if let Some(answer) = self.faq_match(query) {
                return Outcome {
                    classified,
                    candidates: candidates.len(),
                    tfidf: None,
                    keyword: None,
                    answer,
                };
            }
        }

        if candidates.is_empty() {
            return Outcome {
                classified,
                candidates: 0,
                tfidf: None,
                keyword: None,
                answer: generic_answer(&self.graph, classified),
            };
        }

        let tfidf = self.primary.as_ref().map(|s| s.score(query, &candidates));
        let tfidf_top = tfidf.as_deref().map(top_score);

        let keyword = match tfidf_top {
            Some(top) if top >= threshold => None,
            _ => Some(self.fallback.score(query, &candidates)),
        };
        let keyword_top = keyword.as_deref().map(top_score);

        let (ranked, method): (&[ScoredPassage<'_>], Method) =
            match (tfidf.as_deref(), keyword.as_deref()) {
                (Some(t), Some(k)) if top_score(k) > top_score(t) => (k, Method::Keyword),
                (Some(t), _) => (t, Method::Tfidf),
                (None, Some(k)) => (k, Method::Keyword),
                (None, None) => (&[], Method::None),
            };
        debug!(?tfidf_top, ?keyword_top, %method, "scored candidates");

        let bucket = match classified {
            Some(b) => Some(b),
            None => ranked
                .first()
                .filter(|sp| sp.score >= threshold && sp.score > 0.0)
                .map(|sp| sp.bucket),
        };

        let answer = compose(&self.graph, bucket, ranked, method, threshold);
        Outcome {
            classified,
            candidates: candidates.len(),
            tfidf,
            keyword,
            answer,
        }
    }

    /// Answer from the FAQ entry whose question is most similar to `query`.
    fn faq_match(&self, query: &str) -> Option<AnswerResult> {
        let terms = text::normalize_terms(query);
        let distinct: BTreeSet<&str> = terms.iter().map(String::as_str).collect();
        let threshold = self.params.confidence_threshold;

        let mut best: Option<(&FaqEntry, f64)> = None;
        for entry in self.graph.faq() {
            let score = jaccard(&distinct, entry.question_passage());
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((entry, score));
            }
        }

        let (entry, score) = best?;
        if score <= 0.0 || score < threshold.max(FAQ_MIN_SIMILARITY) {
            return None;
        }
        debug!(question = entry.question(), score, "answered from FAQ");
        Some(faq_answer(entry, score, threshold))
    }
}

fn owned(ranked: Option<Vec<ScoredPassage<'_>>>) -> Option<Vec<RankedText>> {
    ranked.map(|r| r.iter().map(RankedText::from).collect())
}

/// One-shot answer for callers that do not keep a [`Retriever`].
///
/// Builds a retriever over a copy of `graph`; callers answering many
/// questions should keep a `Retriever` instead.
pub fn answer(
    graph: &KnowledgeGraph,
    query: &str,
    params: &RetrievalParams,
) -> Result<AnswerResult, ParamsError> {
    Ok(Retriever::new(graph.clone(), params.clone())?.answer(query))
}
