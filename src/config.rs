//! Configuration file parser for `bionews.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning for them since
//! they are usually typos. A few environment variables override the file
//! (see [`Config::apply_env`]).
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// How digest sections are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategorizeMode {
    /// Use the category from the feeds file.
    #[default]
    Feed,
    /// Classify each headline by keywords.
    Keywords,
    /// Ask the LLM; falls back to keywords when unavailable.
    Llm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackerMode {
    #[default]
    Issue,
    Comment,
}

/// What to do when a run finds nothing new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmptyPolicy {
    /// Publish nothing.
    #[default]
    Skip,
    /// Publish a "no fresh headlines" digest.
    Notice,
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON file mapping feed URL to `{category, source}`.
    pub feeds_path: PathBuf,

    /// Where published article ids are kept between runs.
    pub seen_path: PathBuf,

    /// Local copy of the rendered digest.
    pub output_path: PathBuf,

    /// Only entries published within this many hours are collected.
    pub freshness_hours: u64,

    /// Maximum items per source (0 = unlimited).
    pub max_items_per_source: usize,

    pub fetch_timeout_secs: u64,

    pub user_agent: String,

    /// Keyword overlap at which headlines from different sources count as
    /// the same story. 0 disables.
    pub similar_title_threshold: f64,

    pub categorize: CategorizeMode,

    pub tracker: TrackerConfig,

    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds_path: PathBuf::from("feeds.json"),
            seen_path: PathBuf::from("seen.json"),
            output_path: PathBuf::from("news.md"),
            freshness_hours: 24,
            max_items_per_source: 8,
            fetch_timeout_secs: 10,
            user_agent: concat!("bionews/", env!("CARGO_PKG_VERSION")).to_string(),
            similar_title_threshold: 0.6,
            categorize: CategorizeMode::default(),
            tracker: TrackerConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

/// Issue tracker (GitHub) settings.
///
/// Custom Debug impl masks `token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub api_url: String,
    /// `owner/name`.
    pub repo: Option<String>,
    /// API token (alternative to the GITHUB_TOKEN env var, which wins).
    pub token: Option<String>,
    pub mode: TrackerMode,
    /// Issue to comment on when `mode = "comment"`.
    pub issue_number: Option<u64>,
    pub labels: Vec<String>,
    pub title_prefix: String,
    pub empty_policy: EmptyPolicy,
    /// Bound on one publish request, response body included.
    pub timeout_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            repo: None,
            token: None,
            mode: TrackerMode::default(),
            issue_number: None,
            labels: Vec::new(),
            title_prefix: "Daily Biotech / Pharma Digest ".to_string(),
            empty_policy: EmptyPolicy::default(),
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("api_url", &self.api_url)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("mode", &self.mode)
            .field("issue_number", &self.issue_number)
            .field("labels", &self.labels)
            .field("title_prefix", &self.title_prefix)
            .field("empty_policy", &self.empty_policy)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// OpenAI-compatible LLM settings.
///
/// Custom Debug impl masks `api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full `chat/completions` endpoint URL.
    pub api_url: String,
    /// API key (alternative to the OPENAI_API_KEY env var, which wins).
    pub api_key: Option<String>,
    pub model: String,
    /// Rewrite headlines to at most ten words.
    pub shorten_titles: bool,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            shorten_titles: false,
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("shorten_titles", &self.shorten_titles)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

const KNOWN_KEYS: &[&str] = &[
    "feeds_path",
    "seen_path",
    "output_path",
    "freshness_hours",
    "max_items_per_source",
    "fetch_timeout_secs",
    "user_agent",
    "similar_title_threshold",
    "categorize",
    "tracker",
    "llm",
];

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Applies environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Applies environment overrides using `lookup`. Empty values are ignored.
    ///
    /// - `GITHUB_TOKEN` → `tracker.token`
    /// - `GITHUB_REPOSITORY` → `tracker.repo` (only when unset in the file)
    /// - `OPENAI_API_KEY` → `llm.api_key`
    /// - `OPENAI_MODEL` → `llm.model`
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("GITHUB_TOKEN") {
            self.tracker.token = Some(token);
        }
        if self.tracker.repo.is_none() {
            self.tracker.repo = get("GITHUB_REPOSITORY");
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.model = model;
        }
    }

    /// Checks values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similar_title_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similar_title_threshold must be within 0..=1, got {}",
                self.similar_title_threshold
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.tracker.timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "tracker.timeout_secs and llm.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.tracker.mode == TrackerMode::Comment && self.tracker.issue_number.is_none() {
            return Err(ConfigError::Invalid(
                "tracker.issue_number is required when tracker.mode = \"comment\"".to_string(),
            ));
        }
        if let Some(repo) = &self.tracker.repo {
            let valid = repo.split_once('/').is_some_and(|(owner, name)| {
                !owner.is_empty() && !name.is_empty() && !name.contains('/')
            });
            if !valid {
                return Err(ConfigError::Invalid(format!(
                    "tracker.repo must look like \"owner/name\", got \"{repo}\""
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
