//! Core data types: buckets, passages, the knowledge graph, and answers.
//!
//! A [`KnowledgeGraph`] always carries all six [`BucketId`] keys; a bucket
//! with nothing extracted is an empty sequence. Graphs are built completely
//! (via [`KnowledgeGraphBuilder`] or [`KnowledgeGraph::from_buckets`]) and
//! are immutable afterwards.
//!
//! Besides its buckets a graph may hold [`FaqEntry`]s: question/answer
//! pairs read from the document's FAQ. They answer questions the bucket
//! classifier cannot place.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::classify;
use crate::error::GraphError;
use crate::text;

/// Confidence reported by every generic or no-match answer.
pub const CONFIDENCE_FLOOR: f64 = 0.0;

/// Default cutoff below which a scoring strategy is considered inconclusive.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.1;

/// Scores at or above this are reported as [`ConfidenceLevel::High`].
pub const HIGH_CONFIDENCE: f64 = 0.5;

/// One of the six topic categories extracted project knowledge is sorted into.
///
/// The declaration order is the default classifier priority and the order
/// buckets are iterated in everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketId {
    Purpose,
    Install,
    Example,
    Features,
    License,
    Dependencies,
}

impl BucketId {
    pub const ALL: [BucketId; 6] = [
        BucketId::Purpose,
        BucketId::Install,
        BucketId::Example,
        BucketId::Features,
        BucketId::License,
        BucketId::Dependencies,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BucketId::Purpose => "purpose",
            BucketId::Install => "install",
            BucketId::Example => "example",
            BucketId::Features => "features",
            BucketId::License => "license",
            BucketId::Dependencies => "dependencies",
        }
    }

    /// Human-readable topic name, used in generic answers.
    pub fn topic(self) -> &'static str {
        match self {
            BucketId::Purpose => "purpose",
            BucketId::Install => "installation",
            BucketId::Example => "usage example",
            BucketId::Features => "feature",
            BucketId::License => "license",
            BucketId::Dependencies => "dependency",
        }
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketId {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BucketId::ALL
            .into_iter()
            .find(|b| b.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| GraphError::UnknownBucket(s.to_string()))
    }
}

/// One retrievable unit of text: a README bullet, an installation step,
/// a code example block.
///
/// The raw text is never modified. Normalized terms are derived from it on
/// first use and cached; the cache is safe to fill from several threads.
#[derive(Debug, Clone)]
pub struct TextPassage {
    raw_text: String,
    terms: OnceLock<Vec<String>>,
}

impl TextPassage {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            terms: OnceLock::new(),
        }
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Lower-cased, punctuation-stripped content terms (see [`text::normalize_terms`]).
    pub fn normalized_terms(&self) -> &[String] {
        self.terms.get_or_init(|| text::normalize_terms(&self.raw_text))
    }
}

impl PartialEq for TextPassage {
    fn eq(&self, other: &Self) -> bool {
        self.raw_text == other.raw_text
    }
}

impl Eq for TextPassage {}

/// A question with its accepted answer.
///
/// The question is classified once, with the default priority, when the
/// entry is created.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqEntry {
    question: TextPassage,
    answer: String,
    bucket: Option<BucketId>,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let question = question.into();
        let bucket = classify::classify(&question);
        Self {
            question: TextPassage::new(question),
            answer: answer.into(),
            bucket,
        }
    }

    pub fn question(&self) -> &str {
        self.question.raw_text()
    }

    pub(crate) fn question_passage(&self) -> &TextPassage {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Bucket the question classifies to, if any.
    pub fn bucket(&self) -> Option<BucketId> {
        self.bucket
    }
}

/// The extracted facts for one project.
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    name: String,
    description: String,
    programming_language: Option<String>,
    code_repository: Option<String>,
    buckets: BTreeMap<BucketId, Vec<TextPassage>>,
    faq: Vec<FaqEntry>,
}

impl KnowledgeGraph {
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> KnowledgeGraphBuilder {
        KnowledgeGraphBuilder {
            name: name.into(),
            description: description.into(),
            ..KnowledgeGraphBuilder::default()
        }
    }

    /// Build a graph from an explicit bucket map.
    ///
    /// Every one of the six buckets must be present as a key (an empty
    /// sequence is fine). A missing key is a contract violation by the
    /// producer and yields [`GraphError::MalformedGraph`].
    pub fn from_buckets(
        name: impl Into<String>,
        description: impl Into<String>,
        buckets: BTreeMap<BucketId, Vec<TextPassage>>,
    ) -> Result<Self, GraphError> {
        let missing: Vec<&str> = BucketId::ALL
            .iter()
            .filter(|b| !buckets.contains_key(*b))
            .map(|b| b.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(GraphError::MalformedGraph(format!(
                "missing bucket key(s): {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            name: name.into(),
            description: description.into(),
            programming_language: None,
            code_repository: None,
            buckets,
            faq: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn programming_language(&self) -> Option<&str> {
        self.programming_language.as_deref()
    }

    pub fn code_repository(&self) -> Option<&str> {
        self.code_repository.as_deref()
    }

    /// Passages of one bucket, in extraction order.
    pub fn passages(&self, bucket: BucketId) -> &[TextPassage] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All buckets in [`BucketId`] order, each with its passages.
    pub fn buckets(&self) -> impl Iterator<Item = (BucketId, &[TextPassage])> + '_ {
        self.buckets.iter().map(|(b, p)| (*b, p.as_slice()))
    }

    pub fn passage_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// FAQ entries in document order.
    pub fn faq(&self) -> &[FaqEntry] {
        &self.faq
    }

    /// SHA-256 hex digest over name, description, every passage in bucket
    /// order, and the FAQ. Identifies which graph served a query.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.description.as_bytes());
        for (bucket, passages) in &self.buckets {
            hasher.update([0xffu8]);
            hasher.update(bucket.as_str().as_bytes());
            for p in passages {
                hasher.update([0u8]);
                hasher.update(p.raw_text.as_bytes());
            }
        }
        for entry in &self.faq {
            hasher.update([0xfeu8]);
            hasher.update(entry.question().as_bytes());
            hasher.update([0u8]);
            hasher.update(entry.answer.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// Collects passages bucket by bucket; [`build`](KnowledgeGraphBuilder::build)
/// always yields a graph with all six bucket keys.
#[derive(Debug, Default)]
pub struct KnowledgeGraphBuilder {
    name: String,
    description: String,
    programming_language: Option<String>,
    code_repository: Option<String>,
    buckets: BTreeMap<BucketId, Vec<TextPassage>>,
    faq: Vec<FaqEntry>,
}

impl KnowledgeGraphBuilder {
    /// Append a passage. Whitespace-only text is skipped.
    pub fn passage(mut self, bucket: BucketId, raw_text: impl Into<String>) -> Self {
        self.push(bucket, raw_text.into());
        self
    }

    pub fn passages<I, S>(mut self, bucket: BucketId, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for t in texts {
            self.push(bucket, t.into());
        }
        self
    }

    /// Append a FAQ entry. Skipped when the question or answer is blank.
    pub fn faq(mut self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let (question, answer) = (question.into(), answer.into());
        if !question.trim().is_empty() && !answer.trim().is_empty() {
            self.faq.push(FaqEntry::new(question, answer));
        }
        self
    }

    pub fn programming_language(mut self, language: Option<String>) -> Self {
        self.programming_language = language;
        self
    }

    pub fn code_repository(mut self, url: Option<String>) -> Self {
        self.code_repository = url;
        self
    }

    pub fn build(mut self) -> KnowledgeGraph {
        for bucket in BucketId::ALL {
            self.buckets.entry(bucket).or_default();
        }
        KnowledgeGraph {
            name: self.name,
            description: self.description,
            programming_language: self.programming_language,
            code_repository: self.code_repository,
            buckets: self.buckets,
            faq: self.faq,
        }
    }

    fn push(&mut self, bucket: BucketId, raw_text: String) {
        if raw_text.trim().is_empty() {
            return;
        }
        self.buckets
            .entry(bucket)
            .or_default()
            .push(TextPassage::new(raw_text));
    }
}

/// Which scoring strategy produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Tfidf,
    Keyword,
    /// No passage was used; the answer is generic.
    None,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Tfidf => "tfidf",
            Method::Keyword => "keyword",
            Method::None => "none",
        })
    }
}

/// Ordinal view of a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// `High` at or above both [`HIGH_CONFIDENCE`] and `threshold`,
    /// `Medium` at or above `threshold`, `Low` otherwise. A score below
    /// the threshold is never better than `Low`.
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score >= threshold.max(HIGH_CONFIDENCE) && score > CONFIDENCE_FLOOR {
            ConfidenceLevel::High
        } else if score >= threshold && score > CONFIDENCE_FLOOR {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        })
    }
}

/// The orchestrator's output for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    /// Selected bucket; `None` means the query could not be classified.
    #[serde(serialize_with = "serialize_bucket")]
    pub bucket: Option<BucketId>,
    /// Composed answer text.
    pub text: String,
    /// Score in `[0.0, 1.0]`; [`CONFIDENCE_FLOOR`] for generic answers.
    pub confidence: f64,
    pub level: ConfidenceLevel,
    pub method: Method,
    /// Raw text of the passages the answer was built from.
    pub sources: Vec<String>,
    /// The FAQ question whose answer was returned, for FAQ answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faq: Option<String>,
}

impl AnswerResult {
    /// Bucket label, or `"unknown"`.
    pub fn bucket_label(&self) -> &'static str {
        self.bucket.map(BucketId::as_str).unwrap_or("unknown")
    }

    pub fn is_generic(&self) -> bool {
        self.method == Method::None
    }
}

fn serialize_bucket<S: Serializer>(bucket: &Option<BucketId>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(bucket.map(BucketId::as_str).unwrap_or("unknown"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fills_every_bucket() {
        let graph = KnowledgeGraph::builder("p", "d")
            .passage(BucketId::Install, "pip install p")
            .build();
        for bucket in BucketId::ALL {
            let _ = graph.passages(bucket);
        }
        assert_eq!(graph.buckets().count(), 6);
        assert_eq!(graph.passages(BucketId::Install).len(), 1);
        assert!(graph.passages(BucketId::License).is_empty());
    }

    #[test]
    fn test_builder_skips_blank_passages() {
        let graph = KnowledgeGraph::builder("p", "d")
            .passages(BucketId::Features, ["fast", "   ", "", "small"])
            .build();
        assert_eq!(graph.passages(BucketId::Features).len(), 2);
    }

    #[test]
    fn test_from_buckets_rejects_missing_key() {
        let mut map = BTreeMap::new();
        for bucket in [BucketId::Purpose, BucketId::Install, BucketId::Example] {
            map.insert(bucket, Vec::new());
        }
        let err = KnowledgeGraph::from_buckets("p", "d", map).unwrap_err();
        match err {
            GraphError::MalformedGraph(msg) => {
                assert!(msg.contains("features"));
                assert!(msg.contains("license"));
                assert!(msg.contains("dependencies"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_buckets_accepts_empty_sequences() {
        let map: BTreeMap<BucketId, Vec<TextPassage>> =
            BucketId::ALL.into_iter().map(|b| (b, Vec::new())).collect();
        let graph = KnowledgeGraph::from_buckets("p", "d", map).unwrap();
        assert_eq!(graph.passage_count(), 0);
    }

    #[test]
    fn test_bucket_from_str() {
        assert_eq!("install".parse::<BucketId>().unwrap(), BucketId::Install);
        assert_eq!(" License ".parse::<BucketId>().unwrap(), BucketId::License);
        assert!("weather".parse::<BucketId>().is_err());
    }

    #[test]
    fn test_passage_terms_cached_and_raw_untouched() {
        let p = TextPassage::new("Run: pip install example-sdk");
        assert_eq!(p.normalized_terms(), ["run", "pip", "install", "example", "sdk"]);
        assert_eq!(p.normalized_terms().as_ptr(), p.normalized_terms().as_ptr());
        assert_eq!(p.raw_text(), "Run: pip install example-sdk");
    }

    #[test]
    fn test_fingerprint_stable_and_content_sensitive() {
        let a = KnowledgeGraph::builder("p", "d").passage(BucketId::License, "MIT").build();
        let b = KnowledgeGraph::builder("p", "d").passage(BucketId::License, "MIT").build();
        let c = KnowledgeGraph::builder("p", "d").passage(BucketId::License, "Apache-2.0").build();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_confidence_levels() {
        assert_eq!(ConfidenceLevel::from_score(0.0, 0.1), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.05, 0.1), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.1, 0.1), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.7, 0.1), ConfidenceLevel::High);
    }

    #[test]
    fn test_confidence_below_high_threshold_is_low() {
        assert_eq!(ConfidenceLevel::from_score(0.6, 0.8), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.8, 0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.3, 0.2), ConfidenceLevel::Medium);
    }

    #[test]
    fn test_faq_entries_classified_and_fingerprinted() {
        let graph = KnowledgeGraph::builder("p", "d")
            .faq("Who maintains it?", "The Frequenz team.")
            .faq("What license is it under?", "MIT")
            .faq("  ", "ignored")
            .faq("Where is it?", "")
            .build();
        assert_eq!(graph.faq().len(), 2);
        assert_eq!(graph.faq()[0].bucket(), None);
        assert_eq!(graph.faq()[1].bucket(), Some(BucketId::License));
        assert_eq!(graph.passage_count(), 0);

        let plain = KnowledgeGraph::builder("p", "d").build();
        assert_ne!(graph.fingerprint(), plain.fingerprint());
    }

    #[test]
    fn test_answer_serializes_unknown_bucket() {
        let result = AnswerResult {
            bucket: None,
            text: "x".into(),
            confidence: 0.0,
            level: ConfidenceLevel::Low,
            method: Method::None,
            sources: Vec::new(),
            faq: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("faq").is_none());
        assert_eq!(json["bucket"], "unknown");
        assert_eq!(json["method"], "none");
        assert_eq!(json["level"], "low");
    }
}
