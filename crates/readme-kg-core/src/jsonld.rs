//! Conversion from a schema.org JSON-LD document to a [`KnowledgeGraph`].
//!
//! # Field mapping
//!
//! | JSON-LD field | Bucket |
//! |---------------|--------|
//! | `description` | purpose |
//! | `installInstructions.step[].text` (`HowTo` / `HowToStep`) | install |
//! | `exampleOfWork[].text` (`SoftwareSourceCode`) | example |
//! | `featureList` (array or string) | features |
//! | `license` (string, or object with `name` / `url`) | license |
//! | `softwareRequirements` (array or string) | dependencies |
//!
//! `subjectOf` entries of type `Question` become FAQ entries (`name` and
//! `acceptedAnswer.text`); other `subjectOf` items are ignored.
//!
//! Absent fields produce empty buckets. Fields present with the wrong JSON
//! type are rejected as [`GraphError::MalformedGraph`]: the producer broke
//! its contract and retrieval must not run on a silently truncated graph.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::GraphError;
use crate::models::{BucketId, KnowledgeGraph};

impl KnowledgeGraph {
    /// Parse JSON-LD text and convert it.
    pub fn from_jsonld_str(text: &str) -> Result<Self, GraphError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_jsonld(&value)
    }

    /// Convert a parsed JSON-LD document.
    pub fn from_jsonld(doc: &Value) -> Result<Self, GraphError> {
        let obj = doc.as_object().ok_or_else(|| {
            GraphError::MalformedGraph("JSON-LD root must be an object".to_string())
        })?;

        let name = optional_str(obj, "name")?.unwrap_or_default();
        let description = optional_str(obj, "description")?.unwrap_or_default();

        let install = match obj.get("installInstructions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(howto)) => match howto.get("step") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(steps)) => texts_of(steps, "installInstructions.step")?,
                Some(_) => return Err(wrong_type("installInstructions.step", "an array")),
            },
            Some(_) => return Err(wrong_type("installInstructions", "a HowTo object")),
        };

        let examples = match obj.get("exampleOfWork") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => texts_of(items, "exampleOfWork")?,
            Some(item @ Value::Object(_)) => texts_of(std::slice::from_ref(item), "exampleOfWork")?,
            Some(_) => return Err(wrong_type("exampleOfWork", "an array")),
        };

        let features = string_list(obj, "featureList")?;
        let requirements = string_list(obj, "softwareRequirements")?;

        let license = match obj.get("license") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(lic)) => lic
                .get("name")
                .or_else(|| lic.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string),
            Some(_) => return Err(wrong_type("license", "a string or object")),
        };

        let faq = faq_pairs(obj)?;

        let mut builder = KnowledgeGraph::builder(name, description.clone())
            .programming_language(optional_str(obj, "programmingLanguage")?)
            .code_repository(optional_str(obj, "codeRepository")?)
            .passage(BucketId::Purpose, description)
            .passages(BucketId::Install, install)
            .passages(BucketId::Example, examples)
            .passages(BucketId::Features, features)
            .passages(BucketId::License, license)
            .passages(BucketId::Dependencies, requirements);
        for (question, answer) in faq {
            builder = builder.faq(question, answer);
        }
        let graph = builder.build();

        debug!(
            name = graph.name(),
            passages = graph.passage_count(),
            faq = graph.faq().len(),
            "loaded knowledge graph from JSON-LD"
        );
        Ok(graph)
    }
}

fn wrong_type(field: &str, expected: &str) -> GraphError {
    GraphError::MalformedGraph(format!("'{}' must be {}", field, expected))
}

fn optional_str(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, GraphError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        // `programmingLanguage` may be a ComputerLanguage object.
        Some(Value::Object(o)) => Ok(o.get("name").and_then(Value::as_str).map(str::to_string)),
        Some(_) => Err(wrong_type(field, "a string")),
    }
}

/// `featureList` / `softwareRequirements`: an array of strings or a single string.
fn string_list(obj: &Map<String, Value>, field: &str) -> Result<Vec<String>, GraphError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                Value::Object(o) => o
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| wrong_type(field, "a list of strings")),
                _ => Err(wrong_type(field, "a list of strings")),
            })
            .collect(),
        Some(_) => Err(wrong_type(field, "a string or list of strings")),
    }
}

/// `(question, answer)` for every `Question` under `subjectOf`.
fn faq_pairs(obj: &Map<String, Value>) -> Result<Vec<(String, String)>, GraphError> {
    let items = match obj.get("subjectOf") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.as_slice(),
        Some(item @ Value::Object(_)) => std::slice::from_ref(item),
        Some(_) => return Err(wrong_type("subjectOf", "an array")),
    };

    let mut pairs = Vec::new();
    for item in items {
        let Some(q) = item.as_object() else { continue };
        if q.get("@type").and_then(Value::as_str) != Some("Question") {
            continue;
        }
        let question = optional_str(q, "name")?.unwrap_or_default();
        let answer = match q.get("acceptedAnswer") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(a)) => match a.get("text") {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(_) => return Err(wrong_type("subjectOf[].acceptedAnswer.text", "a string")),
            },
            Some(_) => return Err(wrong_type("subjectOf[].acceptedAnswer", "an Answer object")),
        };
        pairs.push((question, answer));
    }
    Ok(pairs)
}

/// The `text` of each `HowToStep` / `SoftwareSourceCode` entry.
fn texts_of(items: &[Value], field: &str) -> Result<Vec<String>, GraphError> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Object(o) => match o.get("text") {
                None | Some(Value::Null) => Ok(String::new()),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(wrong_type(&format!("{}[].text", field), "a string")),
            },
            _ => Err(wrong_type(field, "a list of objects")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "@context": {"@vocab": "https://schema.org/"},
            "@type": "SoftwareApplication",
            "name": "Frequenz SDK for Python",
            "description": "A development kit to interact with the Frequenz development platform.",
            "programmingLanguage": "Python",
            "codeRepository": "https://github.com/frequenz-floss/frequenz-sdk-python",
            "license": "https://opensource.org/licenses/MIT",
            "softwareRequirements": ["Python 3.11", "Python 3.12"],
            "installInstructions": {
                "@type": "HowTo",
                "name": "Install",
                "step": [
                    {"@type": "HowToStep", "text": "pip install frequenz-sdk"},
                    {"@type": "HowToStep", "text": "pip install frequenz-sdk==1.0.0"}
                ]
            },
            "featureList": ["Battery pools", "Resampling"],
            "exampleOfWork": [
                {"@type": "SoftwareSourceCode", "text": "import asyncio\nasync def run(): ..."}
            ]
        })
    }

    #[test]
    fn test_maps_every_bucket() {
        let g = KnowledgeGraph::from_jsonld(&sample()).unwrap();
        assert_eq!(g.name(), "Frequenz SDK for Python");
        assert_eq!(g.programming_language(), Some("Python"));
        assert_eq!(
            g.code_repository(),
            Some("https://github.com/frequenz-floss/frequenz-sdk-python")
        );
        assert_eq!(g.passages(BucketId::Purpose).len(), 1);
        assert_eq!(g.passages(BucketId::Install).len(), 2);
        assert_eq!(g.passages(BucketId::Example).len(), 1);
        assert_eq!(g.passages(BucketId::Features).len(), 2);
        assert_eq!(
            g.passages(BucketId::License)[0].raw_text(),
            "https://opensource.org/licenses/MIT"
        );
        assert_eq!(g.passages(BucketId::Dependencies)[1].raw_text(), "Python 3.12");
    }

    #[test]
    fn test_missing_fields_give_empty_buckets() {
        let g = KnowledgeGraph::from_jsonld(&json!({"name": "x"})).unwrap();
        assert_eq!(g.passage_count(), 0);
        assert_eq!(g.description(), "");
    }

    #[test]
    fn test_license_object() {
        let g = KnowledgeGraph::from_jsonld(&json!({
            "license": {"@type": "CreativeWork", "name": "MIT License", "url": "https://x"}
        }))
        .unwrap();
        assert_eq!(g.passages(BucketId::License)[0].raw_text(), "MIT License");
    }

    #[test]
    fn test_single_string_lists() {
        let g = KnowledgeGraph::from_jsonld(&json!({
            "featureList": "Battery pools",
            "softwareRequirements": "Python >= 3.11"
        }))
        .unwrap();
        assert_eq!(g.passages(BucketId::Features).len(), 1);
        assert_eq!(g.passages(BucketId::Dependencies).len(), 1);
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        for doc in [
            json!([1, 2, 3]),
            json!({"featureList": 42}),
            json!({"installInstructions": "pip install x"}),
            json!({"installInstructions": {"step": {"text": "x"}}}),
            json!({"exampleOfWork": [{"text": 5}]}),
            json!({"name": ["a"]}),
            json!({"subjectOf": "faq"}),
            json!({"subjectOf": [{"@type": "Question", "name": "q", "acceptedAnswer": 3}]}),
        ] {
            let err = KnowledgeGraph::from_jsonld(&doc).unwrap_err();
            assert!(
                matches!(err, GraphError::MalformedGraph(_)),
                "expected MalformedGraph for {}, got {}",
                doc,
                err
            );
        }
    }

    #[test]
    fn test_faq_read_from_subject_of() {
        let g = KnowledgeGraph::from_jsonld(&json!({
            "name": "x",
            "subjectOf": [
                {
                    "@type": "Question",
                    "name": "Who maintains it?",
                    "acceptedAnswer": {"@type": "Answer", "text": "The Frequenz team."}
                },
                {"@type": "Question", "name": "Unanswered?"},
                {"@type": "WebPage", "url": "https://example.com"},
                "https://example.com/faq"
            ]
        }))
        .unwrap();
        assert_eq!(g.passage_count(), 0);
        assert_eq!(g.faq().len(), 1);
        assert_eq!(g.faq()[0].question(), "Who maintains it?");
        assert_eq!(g.faq()[0].answer(), "The Frequenz team.");
        assert_eq!(g.faq()[0].bucket(), None);
    }

    #[test]
    fn test_invalid_json_text() {
        assert!(matches!(
            KnowledgeGraph::from_jsonld_str("{not json"),
            Err(GraphError::Json(_))
        ));
    }

    #[test]
    fn test_blank_example_text_skipped() {
        let g = KnowledgeGraph::from_jsonld(&json!({
            "exampleOfWork": [{"@type": "SoftwareSourceCode"}, {"text": "print(1)"}]
        }))
        .unwrap();
        assert_eq!(g.passages(BucketId::Example).len(), 1);
    }
}
