//! # readme-kg core
//!
//! Pure retrieval logic for readme-kg: the knowledge graph model, query
//! classification, passage scoring, and answer composition.
//!
//! This crate contains no filesystem, network, or terminal I/O. Callers
//! hand it a completed [`models::KnowledgeGraph`] and a query string and get
//! back an [`models::AnswerResult`].
//!
//! # Pipeline
//!
//! ```text
//! query ──▶ classify ──▶ candidates ──▶ score (TF-IDF, then keyword) ──▶ compose
//!              │              ▲
//!              ▼              │
//!          BucketId ──── KnowledgeGraph
//! ```
//!
//! # Example
//!
//! ```rust
//! use readme_kg_core::models::{BucketId, KnowledgeGraph};
//! use readme_kg_core::retrieve::{answer, RetrievalParams};
//!
//! let graph = KnowledgeGraph::builder("example-sdk", "A toolkit for energy automation.")
//!     .passage(BucketId::Install, "Run: pip install example-sdk")
//!     .build();
//!
//! let result = answer(&graph, "How do I install the sdk?", &RetrievalParams::default())?;
//! assert_eq!(result.bucket, Some(BucketId::Install));
//! assert!(result.text.contains("pip install example-sdk"));
//! # Ok::<(), readme_kg_core::error::ParamsError>(())
//! ```

pub mod classify;
pub mod compose;
pub mod error;
pub mod jsonld;
pub mod models;
pub mod retrieve;
pub mod scoring;
pub mod text;
