//! README → JSON-LD extraction.
//!
//! Pulls the facts a user is likely to ask about out of a scanned README
//! ([`ReadmeFacts`]), then lays them out as a schema.org
//! `SoftwareApplication` document ([`build_jsonld`]). The document is what
//! `rkg ask` later loads into a knowledge graph.
//!
//! | Fact | Source |
//! |------|--------|
//! | description | first paragraph, else `extract.fallback_description` |
//! | install steps | lines containing `pip install` / `pip3 install` (max 3) |
//! | features | bullets of a "feature" section, else keyword bullets |
//! | examples | fenced code blocks longer than 40 characters |

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use readme_kg_core::models::KnowledgeGraph;

use crate::config::{Config, ExtractConfig};
use crate::readme::{clean_inline, fetch_readme, scan_markdown, ReadmeDoc};

const MAX_INSTALL_STEPS: usize = 3;
const MIN_EXAMPLE_CHARS: usize = 40;
/// Language of the projects this extractor targets.
const LANGUAGE: &str = "Python";

/// Facts pulled from one README.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadmeFacts {
    pub description: String,
    pub installs: Vec<String>,
    pub features: Vec<String>,
    pub examples: Vec<String>,
}

/// Where the README comes from.
#[derive(Debug, Clone)]
pub enum ReadmeSource<'a> {
    Local(&'a Path),
    Remote { repo_url: &'a str, branch: &'a str },
}

/// Pick out description, install steps, features, and examples.
pub fn extract_facts(text: &str, doc: &ReadmeDoc, cfg: &ExtractConfig) -> ReadmeFacts {
    let description = doc
        .first_paragraph()
        .map(str::to_string)
        .unwrap_or_else(|| cfg.fallback_description.clone());

    let mut installs = install_lines(text);
    if installs.is_empty() {
        installs.push(format!("pip install {}", package_name(cfg)));
    }

    let examples = doc
        .code_blocks()
        .filter(|code| code.chars().count() > MIN_EXAMPLE_CHARS)
        .take(cfg.max_examples)
        .map(str::to_string)
        .collect();

    ReadmeFacts {
        description,
        installs,
        features: guess_features(doc, cfg),
        examples,
    }
}

/// Lines mentioning `pip install`, backticks stripped, de-duplicated in order.
fn install_lines(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .filter(|line| line.contains("pip install") || line.contains("pip3 install"))
        .map(|line| line.replace('`', "").trim().to_string())
        .filter(|line| !line.is_empty() && seen.insert(line.clone()))
        .take(MAX_INSTALL_STEPS)
        .collect()
}

fn guess_features(doc: &ReadmeDoc, cfg: &ExtractConfig) -> Vec<String> {
    let from_section: Vec<String> = doc
        .sections
        .iter()
        .filter(|s| {
            s.heading
                .as_deref()
                .is_some_and(|h| h.to_lowercase().contains("feature"))
        })
        .flat_map(|s| s.bullets.iter().cloned())
        .collect();
    if !from_section.is_empty() {
        return dedup(from_section, cfg.max_features);
    }

    let keywords: Vec<String> = cfg
        .feature_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();
    let by_keyword = doc
        .bullets()
        .filter(|b| {
            let lower = b.to_lowercase();
            keywords.iter().any(|k| lower.contains(k.as_str()))
        })
        .map(str::to_string)
        .collect();
    dedup(by_keyword, cfg.max_features)
}

fn dedup(items: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|i| clean_inline(&i))
        .filter(|i| !i.is_empty() && seen.insert(i.clone()))
        .take(limit)
        .collect()
}

/// `extract.package`, or the project name up to " for ", lower-cased and
/// hyphenated ("Frequenz SDK for Python" → "frequenz-sdk").
pub fn package_name(cfg: &ExtractConfig) -> String {
    if let Some(p) = cfg.package.as_deref().filter(|p| !p.trim().is_empty()) {
        return p.trim().to_string();
    }
    cfg.name
        .split_whitespace()
        .take_while(|w| !w.eq_ignore_ascii_case("for"))
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

fn short_name(name: &str) -> &str {
    name.split(" for ").next().unwrap_or(name).trim()
}

/// `https://raw.githubusercontent.com/org/repo[/...]` → `https://github.com/org/repo`.
/// Other URLs are returned trimmed.
pub fn code_repository(repo_url: &str) -> String {
    let trimmed = repo_url.trim_end_matches('/');
    match trimmed.strip_prefix("https://raw.githubusercontent.com/") {
        Some(rest) => {
            let parts: Vec<&str> = rest.split('/').take(2).collect();
            format!("https://github.com/{}", parts.join("/"))
        }
        None => trimmed.to_string(),
    }
}

/// Lay out `facts` as a schema.org `SoftwareApplication`.
///
/// Besides the fields read back by the knowledge graph loader, the document
/// carries a `subjectOf` FAQ: one `Question` with an `acceptedAnswer` per
/// topic that has content, plus repository and language questions that
/// only the FAQ answers.
pub fn build_jsonld(facts: &ReadmeFacts, cfg: &ExtractConfig) -> Value {
    let mut data = Map::new();
    data.insert("@context".into(), json!({ "@vocab": "https://schema.org/" }));
    data.insert("@type".into(), json!("SoftwareApplication"));
    data.insert("name".into(), json!(cfg.name));
    data.insert("description".into(), json!(facts.description));
    data.insert("programmingLanguage".into(), json!(LANGUAGE));
    data.insert(
        "codeRepository".into(),
        json!(code_repository(&cfg.repo_url)),
    );
    data.insert("isAccessibleForFree".into(), json!(true));

    let license = cfg.license_url.as_deref().filter(|l| !l.trim().is_empty());
    if let Some(license) = license {
        data.insert("license".into(), json!(license));
    }

    let requirements: Vec<String> = cfg
        .python_versions
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| format!("Python {}", v))
        .collect();
    if !requirements.is_empty() {
        data.insert("softwareRequirements".into(), json!(requirements));
    }

    if !facts.installs.is_empty() {
        let steps: Vec<Value> = facts
            .installs
            .iter()
            .map(|cmd| json!({ "@type": "HowToStep", "text": cmd }))
            .collect();
        data.insert(
            "installInstructions".into(),
            json!({
                "@type": "HowTo",
                "name": format!("Install the {}", cfg.name),
                "step": steps,
            }),
        );
    }

    if !facts.features.is_empty() {
        data.insert("featureList".into(), json!(facts.features));
    }

    if !facts.examples.is_empty() {
        let examples: Vec<Value> = facts
            .examples
            .iter()
            .map(|code| {
                json!({
                    "@type": "SoftwareSourceCode",
                    "programmingLanguage": LANGUAGE,
                    "codeSampleType": "example",
                    "text": code,
                })
            })
            .collect();
        data.insert("exampleOfWork".into(), json!(examples));
    }

    let faq = faq_entries(facts, license, &requirements, cfg);
    if !faq.is_empty() {
        data.insert("subjectOf".into(), Value::Array(faq));
    }

    Value::Object(data)
}

fn faq_entries(
    facts: &ReadmeFacts,
    license: Option<&str>,
    requirements: &[String],
    cfg: &ExtractConfig,
) -> Vec<Value> {
    let mut qas: Vec<(String, String)> = vec![(
        format!("What is the {} for?", short_name(&cfg.name)),
        facts.description.clone(),
    )];
    if !facts.installs.is_empty() {
        qas.push((
            "How do I install the SDK?".into(),
            format!("Installation:\n- {}", facts.installs.join("\n- ")),
        ));
    }
    if let Some(example) = facts.examples.first() {
        qas.push(("Show me an example of how to use it.".into(), example.clone()));
    }
    if !facts.features.is_empty() {
        qas.push((
            "What features does it have?".into(),
            format!("Key features:\n- {}", facts.features.join("\n- ")),
        ));
    }
    if let Some(license) = license {
        qas.push(("What license is it under?".into(), format!("License: {}", license)));
    }
    if !requirements.is_empty() {
        qas.push((
            "Which Python versions does it require?".into(),
            format!("Requirements:\n- {}", requirements.join("\n- ")),
        ));
    }

    let repository = code_repository(&cfg.repo_url);
    if !repository.is_empty() {
        qas.push(("Where is the source repository?".into(), repository));
    }
    qas.push((
        "What programming language is it written in?".into(),
        LANGUAGE.to_string(),
    ));

    qas.into_iter()
        .filter(|(_, answer)| !answer.trim().is_empty())
        .map(|(question, answer)| {
            json!({
                "@type": "Question",
                "name": question,
                "acceptedAnswer": { "@type": "Answer", "text": answer },
            })
        })
        .collect()
}

/// Run `rkg extract`: read or fetch the README, build the JSON-LD document,
/// check that it loads as a knowledge graph, and write it to `out`.
pub fn run_extract(config: &Config, source: ReadmeSource<'_>, out: &Path) -> Result<()> {
    let cfg = &config.extract;
    let text = match source {
        ReadmeSource::Local(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read README: {}", path.display()))?,
        ReadmeSource::Remote { repo_url, branch } => {
            fetch_readme(repo_url, branch, Duration::from_secs(cfg.timeout_secs))?
        }
    };

    let doc = scan_markdown(&text);
    debug!(sections = doc.sections.len(), "scanned README");

    let facts = extract_facts(&text, &doc, cfg);
    info!(
        installs = facts.installs.len(),
        features = facts.features.len(),
        examples = facts.examples.len(),
        "extracted README facts"
    );

    let jsonld = build_jsonld(&facts, cfg);
    let graph = KnowledgeGraph::from_jsonld(&jsonld)
        .context("Extracted document is not a valid knowledge graph")?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(&jsonld)?;
    std::fs::write(out, body).with_context(|| format!("Failed to write {}", out.display()))?;

    println!(
        "Wrote {} ({} passages, fingerprint {})",
        out.display(),
        graph.passage_count(),
        &graph.fingerprint()[..12]
    );
    Ok(())
}
