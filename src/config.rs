//! TOML configuration.
//!
//! Every section is optional; a missing key falls back to its `default_*`
//! value. See `config/rkg.example.toml` for a full example.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use readme_kg_core::models::{BucketId, DEFAULT_CONFIDENCE_THRESHOLD};
use readme_kg_core::retrieve::RetrievalParams;

/// Used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/rkg.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KnowledgeConfig {
    /// JSON-LD file written by `rkg extract` and read by `ask`/`chat`/`inspect`.
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("project_knowledge.jsonld")
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_tfidf_enabled")]
    pub tfidf_enabled: bool,
    /// Bucket names in classifier priority order.
    #[serde(default = "default_priority")]
    pub priority: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            tfidf_enabled: default_tfidf_enabled(),
            priority: default_priority(),
        }
    }
}

fn default_confidence_threshold() -> f64 {
    DEFAULT_CONFIDENCE_THRESHOLD
}
fn default_tfidf_enabled() -> bool {
    true
}
fn default_priority() -> Vec<String> {
    BucketId::ALL.iter().map(|b| b.as_str().to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractConfig {
    /// Raw-content base URL of the repository, or a direct README URL.
    #[serde(default = "default_repo_url")]
    pub repo_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_name")]
    pub name: String,
    /// Package name for the fallback `pip install` step. Derived from
    /// `name` when unset.
    #[serde(default)]
    pub package: Option<String>,
    /// Used when the README has no leading paragraph.
    #[serde(default = "default_description")]
    pub fallback_description: String,
    #[serde(default = "default_license_url")]
    pub license_url: Option<String>,
    #[serde(default = "default_python_versions")]
    pub python_versions: Vec<String>,
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    /// Bullets mentioning any of these count as features when the README
    /// has no features section.
    #[serde(default = "default_feature_keywords")]
    pub feature_keywords: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            repo_url: default_repo_url(),
            branch: default_branch(),
            name: default_name(),
            package: None,
            fallback_description: default_description(),
            license_url: default_license_url(),
            python_versions: default_python_versions(),
            max_examples: default_max_examples(),
            max_features: default_max_features(),
            feature_keywords: default_feature_keywords(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_repo_url() -> String {
    "https://raw.githubusercontent.com/frequenz-floss/frequenz-sdk-python".to_string()
}
fn default_branch() -> String {
    "main".to_string()
}
fn default_name() -> String {
    "Frequenz SDK for Python".to_string()
}
fn default_description() -> String {
    "A development kit to interact with the Frequenz development platform.".to_string()
}
fn default_license_url() -> Option<String> {
    Some("https://opensource.org/licenses/MIT".to_string())
}
fn default_python_versions() -> Vec<String> {
    vec!["3.11".to_string(), "3.12".to_string()]
}
fn default_max_examples() -> usize {
    2
}
fn default_max_features() -> usize {
    10
}
fn default_feature_keywords() -> Vec<String> {
    [
        "battery",
        "pv",
        "ev",
        "actor",
        "channel",
        "timeseries",
        "microgrid",
        "report",
        "trading",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_timeout_secs() -> u64 {
    20
}

impl RetrievalConfig {
    /// Convert to core retrieval parameters, resolving bucket names.
    pub fn to_params(&self) -> Result<RetrievalParams> {
        let priority = self
            .priority
            .iter()
            .map(|name| name.parse::<BucketId>())
            .collect::<Result<Vec<_>, _>>()
            .context("Invalid retrieval.priority")?;
        Ok(RetrievalParams {
            confidence_threshold: self.confidence_threshold,
            priority,
            tfidf_enabled: self.tfidf_enabled,
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` when given. Without an explicit path the default location is
/// used if it exists, otherwise built-in defaults apply.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate retrieval
    let params = config.retrieval.to_params()?;
    params.validate().context("Invalid retrieval settings")?;

    // Validate extraction
    if config.extract.max_examples == 0 {
        anyhow::bail!("extract.max_examples must be >= 1");
    }
    if config.extract.max_features == 0 {
        anyhow::bail!("extract.max_features must be >= 1");
    }
    if config.extract.repo_url.trim().is_empty() {
        anyhow::bail!("extract.repo_url must not be empty");
    }

    Ok(())
}
