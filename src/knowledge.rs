//! Loading a knowledge graph from disk and setting up a retriever for it.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use readme_kg_core::models::KnowledgeGraph;
use readme_kg_core::retrieve::Retriever;

use crate::config::Config;

/// Command-line adjustments to the configured retrieval settings.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOverrides {
    pub threshold: Option<f64>,
    pub no_tfidf: bool,
}

/// Read and convert a JSON-LD knowledge file.
pub fn load_graph(path: &Path) -> Result<KnowledgeGraph> {
    let text = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read knowledge file: {} (run `rkg extract` first)",
            path.display()
        )
    })?;
    let graph = KnowledgeGraph::from_jsonld_str(&text)
        .with_context(|| format!("Failed to load knowledge graph from {}", path.display()))?;
    info!(
        path = %path.display(),
        name = graph.name(),
        passages = graph.passage_count(),
        "loaded knowledge graph"
    );
    Ok(graph)
}

/// Load the graph at `knowledge` (or `knowledge.path` from config) and
/// build a retriever with the configured parameters plus `overrides`.
pub fn open_retriever(
    config: &Config,
    knowledge: Option<&Path>,
    overrides: &RetrievalOverrides,
) -> Result<Retriever> {
    let path = knowledge.unwrap_or(config.knowledge.path.as_path());
    let graph = load_graph(path)?;

    let mut params = config.retrieval.to_params()?;
    if let Some(threshold) = overrides.threshold {
        params.confidence_threshold = threshold;
    }
    if overrides.no_tfidf {
        params.tfidf_enabled = false;
    }

    Retriever::new(graph, params).context("Invalid retrieval settings")
}

#[cfg(test)]
mod tests {
    use super::*;

    const KG: &str = r#"{
        "@type": "SoftwareApplication",
        "name": "Example SDK",
        "description": "A toolkit for energy automation.",
        "installInstructions": {"step": [{"text": "pip install example-sdk"}]}
    }"#;

    #[test]
    fn test_load_graph() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("kg.jsonld");
        std::fs::write(&path, KG).unwrap();
        let graph = load_graph(&path).unwrap();
        assert_eq!(graph.name(), "Example SDK");
        assert_eq!(graph.passage_count(), 2);
    }

    #[test]
    fn test_missing_file_mentions_extract() {
        let err = load_graph(Path::new("/nonexistent/kg.jsonld")).unwrap_err();
        assert!(format!("{:#}", err).contains("rkg extract"));
    }

    #[test]
    fn test_malformed_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("kg.jsonld");
        std::fs::write(&path, "[1, 2]").unwrap();
        let err = load_graph(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("malformed"));
    }

    #[test]
    fn test_overrides_applied() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("kg.jsonld");
        std::fs::write(&path, KG).unwrap();
        let overrides = RetrievalOverrides {
            threshold: Some(0.3),
            no_tfidf: true,
        };
        let r = open_retriever(&Config::default(), Some(path.as_path()), &overrides).unwrap();
        assert_eq!(r.params().confidence_threshold, 0.3);
        assert!(!r.tfidf_available());
    }

    #[test]
    fn test_invalid_threshold_override() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("kg.jsonld");
        std::fs::write(&path, KG).unwrap();
        let overrides = RetrievalOverrides {
            threshold: Some(2.0),
            no_tfidf: false,
        };
        assert!(open_retriever(&Config::default(), Some(path.as_path()), &overrides).is_err());
    }
}
