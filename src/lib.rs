//! # readme-kg
//!
//! Extract a JSON-LD knowledge graph from a project README and answer
//! natural-language questions about the project from it.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────────┐
//! │   README     │──▶│   extract     │──▶│ JSON-LD file   │
//! │ local / HTTP │   │ scan + facts  │   │ schema.org     │
//! └──────────────┘   └───────────────┘   └───────┬────────┘
//!                                                │ load
//!                                                ▼
//!                    ┌───────────────┐   ┌────────────────┐
//!                    │  rkg ask/chat │◀──│ readme-kg-core │
//!                    │    (CLI)      │   │   Retriever    │
//!                    └───────────────┘   └────────────────┘
//! ```
//!
//! Retrieval itself (classification, scoring, composition) lives in the
//! [`readme_kg_core`] crate; this crate adds configuration, README
//! acquisition, JSON-LD construction, and the command-line surface.
//!
//! ## Quick Start
//!
//! ```bash
//! rkg extract                              # fetch README, write project_knowledge.jsonld
//! rkg extract --readme ./README.md         # parse a local file instead
//! rkg ask "How do I install the SDK?"
//! rkg ask "What license is it under?" --json
//! rkg chat
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`readme`] | README fetching and Markdown scanning |
//! | [`extract`] | README facts and JSON-LD construction |
//! | [`knowledge`] | Knowledge file loading and retriever setup |
//! | [`ask`] | `ask` and `chat` commands |
//! | [`inspect`] | Knowledge graph overview |

pub mod ask;
pub mod config;
pub mod extract;
pub mod inspect;
pub mod knowledge;
pub mod readme;
