//! # readme-kg CLI (`rkg`)
//!
//! Extracts a JSON-LD knowledge graph from a project README and answers
//! questions about the project from it.
//!
//! ## Usage
//!
//! ```bash
//! rkg --config ./config/rkg.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rkg extract` | Fetch (or read) a README and write the JSON-LD knowledge file |
//! | `rkg ask "<question>"` | Answer one question |
//! | `rkg chat` | Answer questions line by line from stdin |
//! | `rkg inspect` | Summarize the knowledge file |
//!
//! ## Examples
//!
//! ```bash
//! # Build the knowledge file from the configured repository
//! rkg extract
//!
//! # Build it from a local README
//! rkg extract --readme ./README.md --out kg.jsonld
//!
//! # Ask, with the decision trace
//! rkg ask "How do I install the SDK?" --explain
//!
//! # Machine-readable answer
//! rkg ask "What license is it under?" --json
//! ```
//!
//! Logging goes to stderr and is controlled by `RKG_LOG`
//! (e.g. `RKG_LOG=debug rkg ask "..."`); the default level is `warn`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use readme_kg::ask;
use readme_kg::config;
use readme_kg::extract::{self, ReadmeSource};
use readme_kg::inspect;
use readme_kg::knowledge::{self, RetrievalOverrides};

/// readme-kg: ask questions about a project, answered from its README.
///
/// Commands read an optional TOML configuration file. See
/// `config/rkg.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "rkg",
    about = "readme-kg: extract a JSON-LD knowledge graph from a README and answer questions about it",
    version,
    long_about = "readme-kg turns a project README into a schema.org JSON-LD knowledge graph \
    (description, installation steps, examples, features, license, requirements) and answers \
    natural-language questions about the project using keyword bucket classification with \
    TF-IDF and keyword-overlap scoring."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/rkg.toml` when that file exists; otherwise
    /// built-in defaults are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the JSON-LD knowledge file from a README.
    ///
    /// Without `--readme`, the README is fetched over HTTP from the
    /// configured (or given) raw-content repository URL.
    Extract {
        /// Parse this local README instead of fetching one.
        #[arg(long, conflicts_with_all = ["repo_url", "branch"])]
        readme: Option<PathBuf>,

        /// Raw-content base URL of the repository, or a direct README URL.
        #[arg(long)]
        repo_url: Option<String>,

        /// Branch to fetch the README from.
        #[arg(long)]
        branch: Option<String>,

        /// Output file. Defaults to `knowledge.path` from config.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Answer a single question.
    Ask {
        /// The question, e.g. "How do I install the SDK?".
        question: String,

        #[command(flatten)]
        retrieval: RetrievalArgs,

        /// Print the answer as JSON.
        #[arg(long)]
        json: bool,

        /// Show how the answer was reached: trigger matches, candidate
        /// counts, and both rankings.
        #[arg(long)]
        explain: bool,
    },

    /// Answer questions read line by line from stdin.
    ///
    /// `quit`, `exit`, `q`, or end of input stops the session.
    Chat {
        #[command(flatten)]
        retrieval: RetrievalArgs,
    },

    /// Summarize the knowledge file: metadata, fingerprint, passages per bucket.
    Inspect {
        /// Knowledge file. Defaults to `knowledge.path` from config.
        #[arg(long)]
        knowledge: Option<PathBuf>,

        /// List every passage (first line).
        #[arg(long, short)]
        verbose: bool,
    },
}

#[derive(clap::Args)]
struct RetrievalArgs {
    /// Knowledge file. Defaults to `knowledge.path` from config.
    #[arg(long)]
    knowledge: Option<PathBuf>,

    /// Score by keyword overlap only.
    #[arg(long)]
    no_tfidf: bool,

    /// Confidence threshold in [0, 1], overriding config.
    #[arg(long)]
    threshold: Option<f64>,
}

impl RetrievalArgs {
    fn overrides(&self) -> RetrievalOverrides {
        RetrievalOverrides {
            threshold: self.threshold,
            no_tfidf: self.no_tfidf,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RKG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            readme,
            repo_url,
            branch,
            out,
        } => {
            let out = out.unwrap_or_else(|| cfg.knowledge.path.clone());
            let repo_url = repo_url.unwrap_or_else(|| cfg.extract.repo_url.clone());
            let branch = branch.unwrap_or_else(|| cfg.extract.branch.clone());
            let source = match readme.as_deref() {
                Some(path) => ReadmeSource::Local(path),
                None => ReadmeSource::Remote {
                    repo_url: &repo_url,
                    branch: &branch,
                },
            };
            extract::run_extract(&cfg, source, &out)?;
        }
        Commands::Ask {
            question,
            retrieval,
            json,
            explain,
        } => {
            let retriever = knowledge::open_retriever(
                &cfg,
                retrieval.knowledge.as_deref(),
                &retrieval.overrides(),
            )?;
            ask::run_ask(&retriever, &question, json, explain)?;
        }
        Commands::Chat { retrieval } => {
            let retriever = knowledge::open_retriever(
                &cfg,
                retrieval.knowledge.as_deref(),
                &retrieval.overrides(),
            )?;
            ask::run_chat(&retriever)?;
        }
        Commands::Inspect {
            knowledge: path,
            verbose,
        } => {
            let path = path.unwrap_or_else(|| cfg.knowledge.path.clone());
            let retriever =
                knowledge::open_retriever(&cfg, Some(path.as_path()), &RetrievalOverrides::default())?;
            inspect::run_inspect(&retriever, &path, verbose)?;
        }
    }

    Ok(())
}
