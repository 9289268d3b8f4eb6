//! Answer composition.
//!
//! Turns a classified bucket and a ranked passage list into an
//! [`AnswerResult`]. Passage text is never edited: it is only wrapped with
//! a bucket-specific prefix (and, for examples, a code fence), so every
//! source passage appears verbatim in the answer.
//!
//! | Bucket | Rendering |
//! |--------|-----------|
//! | purpose | `"{name}: {text}"` |
//! | install | `"To install:\n{text}"`, several steps numbered `1. `, `2. ` |
//! | example | `"Example:\n```{lang}\n{text}\n```"` |
//! | features | `"Key features:\n- {text}"` |
//! | license | `"License: {text}"` |
//! | dependencies | `"Requirements:\n- {text}"` |

use crate::models::{
    AnswerResult, BucketId, ConfidenceLevel, FaqEntry, KnowledgeGraph, Method, CONFIDENCE_FLOOR,
};
use crate::scoring::ScoredPassage;

/// Opening sentence of every generic answer.
pub const NO_INFORMATION: &str = "I don't have information about that.";

/// Separator between passages that tie for the top score.
const TIE_SEPARATOR: &str = "\n\n";

/// Compose the final answer.
///
/// With no bucket, or no ranked passages, the answer is generic (confidence
/// at the floor, [`Method::None`]). Otherwise the top-scoring passage is
/// used; passages tying with it are all included in original order.
pub fn compose(
    graph: &KnowledgeGraph,
    bucket: Option<BucketId>,
    ranked: &[ScoredPassage<'_>],
    method: Method,
    threshold: f64,
) -> AnswerResult {
    let Some(bucket) = bucket else {
        return generic_answer(graph, None);
    };
    let Some(top) = ranked.first().map(|sp| sp.score) else {
        return generic_answer(graph, Some(bucket));
    };

    let mut tied: Vec<&ScoredPassage<'_>> = ranked
        .iter()
        .filter(|sp| sp.score == top && sp.bucket == bucket)
        .collect();
    if tied.is_empty() {
        return generic_answer(graph, Some(bucket));
    }
    tied.sort_by_key(|sp| sp.position);

    let texts: Vec<&str> = tied.iter().map(|sp| sp.passage.raw_text()).collect();
    let confidence = top.clamp(0.0, 1.0);

    AnswerResult {
        bucket: Some(bucket),
        text: render(graph, bucket, &texts),
        confidence,
        level: ConfidenceLevel::from_score(confidence, threshold),
        method,
        sources: texts.iter().map(|t| t.to_string()).collect(),
        faq: None,
    }
}

/// The "no information" answer. Keeps the bucket when one was classified
/// but had nothing to offer.
pub fn generic_answer(graph: &KnowledgeGraph, bucket: Option<BucketId>) -> AnswerResult {
    let subject = if graph.name().trim().is_empty() {
        "the project"
    } else {
        graph.name()
    };
    let text = match bucket {
        None => format!(
            "{} Try asking about {}'s purpose, installation, examples, features, license, or dependencies.",
            NO_INFORMATION, subject
        ),
        Some(b) => format!(
            "{} No {} details were extracted for {}.",
            NO_INFORMATION,
            b.topic(),
            subject
        ),
    };
    AnswerResult {
        bucket,
        text,
        confidence: CONFIDENCE_FLOOR,
        level: ConfidenceLevel::Low,
        method: Method::None,
        sources: Vec::new(),
        faq: None,
    }
}

/// Answer with a FAQ entry's accepted answer, verbatim. `score` is the
/// similarity between the query and the entry's question.
pub fn faq_answer(entry: &FaqEntry, score: f64, threshold: f64) -> AnswerResult {
    let confidence = score.clamp(0.0, 1.0);
    AnswerResult {
        bucket: entry.bucket(),
        text: entry.answer().to_string(),
        confidence,
        level: ConfidenceLevel::from_score(confidence, threshold),
        method: Method::Keyword,
        sources: vec![entry.answer().to_string()],
        faq: Some(entry.question().to_string()),
    }
}

fn render(graph: &KnowledgeGraph, bucket: BucketId, texts: &[&str]) -> String {
    match bucket {
        BucketId::Purpose => {
            let name = graph.name().trim();
            let prefix = if name.is_empty() {
                "Purpose: ".to_string()
            } else {
                format!("{}: ", name)
            };
            format!("{}{}", prefix, texts.join(TIE_SEPARATOR))
        }
        BucketId::Install => {
            if texts.len() == 1 {
                format!("To install:\n{}", texts[0])
            } else {
                let steps: Vec<String> = texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| format!("{}. {}", i + 1, t))
                    .collect();
                format!("To install:\n{}", steps.join("\n"))
            }
        }
        BucketId::Example => {
            let lang = graph
                .programming_language()
                .map(|l| l.trim().to_lowercase())
                .unwrap_or_default();
            let blocks: Vec<String> = texts
                .iter()
                .map(|t| format!("```{}\n{}\n```", lang, t))
                .collect();
            format!("Example:\n{}", blocks.join(TIE_SEPARATOR))
        }
        BucketId::Features => format!("Key features:\n{}", bulleted(texts)),
        BucketId::License => format!("License: {}", texts.join(TIE_SEPARATOR)),
        BucketId::Dependencies => format!("Requirements:\n{}", bulleted(texts)),
    }
}

fn bulleted(texts: &[&str]) -> String {
    texts
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextPassage;

    fn scored<'g>(
        bucket: BucketId,
        passages: &'g [TextPassage],
        scores: &[f64],
    ) -> Vec<ScoredPassage<'g>> {
        passages
            .iter()
            .zip(scores)
            .enumerate()
            .map(|(position, (passage, score))| ScoredPassage {
                bucket,
                passage,
                position,
                score: *score,
            })
            .collect()
    }

    fn graph() -> KnowledgeGraph {
        KnowledgeGraph::builder("Example SDK", "d")
            .programming_language(Some("Python".into()))
            .build()
    }

    #[test]
    fn test_unknown_bucket_is_generic() {
        let passages = vec![TextPassage::new("anything")];
        let ranked = scored(BucketId::Features, &passages, &[0.9]);
        let result = compose(&graph(), None, &ranked, Method::Tfidf, 0.1);
        assert_eq!(result.bucket, None);
        assert_eq!(result.method, Method::None);
        assert_eq!(result.confidence, CONFIDENCE_FLOOR);
        assert!(result.text.starts_with(NO_INFORMATION));
        assert!(result.sources.is_empty());
    }

    #[test]
    fn test_no_candidates_keeps_bucket() {
        let result = compose(&graph(), Some(BucketId::License), &[], Method::Tfidf, 0.1);
        assert_eq!(result.bucket, Some(BucketId::License));
        assert_eq!(result.method, Method::None);
        assert_eq!(result.confidence, CONFIDENCE_FLOOR);
        assert_eq!(result.level, ConfidenceLevel::Low);
        assert!(result.text.contains("license"));
    }

    #[test]
    fn test_top_passage_selected() {
        let passages = vec![TextPassage::new("MIT"), TextPassage::new("Apache-2.0")];
        let mut ranked = scored(BucketId::License, &passages, &[0.2, 0.8]);
        ranked.reverse();
        let result = compose(&graph(), Some(BucketId::License), &ranked, Method::Keyword, 0.1);
        assert_eq!(result.text, "License: Apache-2.0");
        assert!((result.confidence - 0.8).abs() < 1e-12);
        assert_eq!(result.level, ConfidenceLevel::High);
        assert_eq!(result.method, Method::Keyword);
    }

    #[test]
    fn test_ties_concatenate_in_original_order() {
        let passages = vec![
            TextPassage::new("pip install a"),
            TextPassage::new("pip install b"),
            TextPassage::new("unrelated"),
        ];
        let mut ranked = scored(BucketId::Install, &passages, &[0.4, 0.4, 0.1]);
        // Present tied entries out of order; composition restores candidate order.
        ranked.swap(0, 1);
        let result = compose(&graph(), Some(BucketId::Install), &ranked, Method::Tfidf, 0.1);
        assert_eq!(result.text, "To install:\n1. pip install a\n2. pip install b");
        assert_eq!(result.sources, vec!["pip install a", "pip install b"]);
    }

    #[test]
    fn test_example_is_fenced_verbatim() {
        let passages = vec![TextPassage::new("import sdk; sdk.run()")];
        let ranked = scored(BucketId::Example, &passages, &[0.0]);
        let result = compose(&graph(), Some(BucketId::Example), &ranked, Method::Tfidf, 0.1);
        assert_eq!(result.text, "Example:\n```python\nimport sdk; sdk.run()\n```");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_faq_answer_is_verbatim() {
        let entry = FaqEntry::new("Who maintains it?", "The Frequenz team.");
        let result = faq_answer(&entry, 1.0, 0.1);
        assert_eq!(result.text, "The Frequenz team.");
        assert_eq!(result.bucket, None);
        assert_eq!(result.method, Method::Keyword);
        assert_eq!(result.faq.as_deref(), Some("Who maintains it?"));
        assert_eq!(result.sources, vec!["The Frequenz team."]);
        assert!(!result.is_generic());
    }

    #[test]
    fn test_purpose_prefix_uses_name() {
        let passages = vec![TextPassage::new("A toolkit for energy automation.")];
        let ranked = scored(BucketId::Purpose, &passages, &[0.3]);
        let result = compose(&graph(), Some(BucketId::Purpose), &ranked, Method::Tfidf, 0.1);
        assert_eq!(result.text, "Example SDK: A toolkit for energy automation.");
        assert_eq!(result.level, ConfidenceLevel::Medium);
    }

    #[test]
    fn test_confidence_clamped() {
        let passages = vec![TextPassage::new("fast")];
        let ranked = scored(BucketId::Features, &passages, &[1.7]);
        let result = compose(&graph(), Some(BucketId::Features), &ranked, Method::Tfidf, 0.1);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.text, "Key features:\n- fast");
    }
}
