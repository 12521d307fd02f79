//! Configuration for Padrão.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::PadraoResult;

/// Main configuration for Padrão.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Matching and recovery settings.
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Adaptation trigger settings.
    #[serde(default)]
    pub adaptation: AdaptationConfig,

    /// Match cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Cross-project learning settings.
    #[serde(default)]
    pub learning: LearningConfig,

    /// Pattern catalog.
    #[serde(default)]
    pub patterns: Vec<PatternSpec>,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

/// Matching and recovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Window size used by chunked recovery (bytes).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive windows (bytes).
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Attempts for chunked recovery; each retry halves the window.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum instances a single rule application may produce.
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_retries: default_max_retries(),
            max_matches: default_max_matches(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_matches() -> usize {
    10_000
}

/// Adaptation trigger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Uses a bucket needs (strictly more than) before it is trusted.
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,

    /// Success rate below which the pattern adapts.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_samples: default_min_samples(),
            success_threshold: default_success_threshold(),
        }
    }
}

fn default_min_samples() -> u64 {
    10
}

fn default_success_threshold() -> f64 {
    0.5
}

/// LRU cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum cache capacity (number of entries).
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry time to live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

/// Where learning state is persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// A single JSON snapshot file.
    #[default]
    Json,
    /// A SQLite database (requires the `sqlite` feature).
    Sqlite,
}

/// Cross-project learning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Store backend.
    #[serde(default)]
    pub store: StoreKind,

    /// Snapshot path (JSON file or SQLite database).
    #[serde(default = "default_insights_path")]
    pub insights_path: PathBuf,

    /// Smallest cluster that yields a variation.
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,

    /// Examples sampled per cluster for generalization.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,

    /// Maximum relative length difference for two similar matches.
    #[serde(default = "default_length_tolerance")]
    pub length_tolerance: f64,

    /// Character-set Jaccard threshold.
    #[serde(default = "default_char_similarity")]
    pub char_similarity: f64,

    /// Word-token Jaccard threshold.
    #[serde(default = "default_word_similarity")]
    pub word_similarity: f64,

    /// Split files into paragraph blocks before matching.
    #[serde(default)]
    pub use_blocks: bool,

    /// Bounded wait for background tasks at shutdown (seconds).
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store: StoreKind::default(),
            insights_path: default_insights_path(),
            min_group_size: default_min_group_size(),
            max_examples: default_max_examples(),
            length_tolerance: default_length_tolerance(),
            char_similarity: default_char_similarity(),
            word_similarity: default_word_similarity(),
            use_blocks: false,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

fn default_insights_path() -> PathBuf {
    PathBuf::from(".padrao/insights.json")
}

fn default_min_group_size() -> usize {
    2
}

fn default_max_examples() -> usize {
    5
}

fn default_length_tolerance() -> f64 {
    0.3
}

fn default_char_similarity() -> f64 {
    0.7
}

fn default_word_similarity() -> f64 {
    0.5
}

fn default_shutdown_timeout() -> u64 {
    5
}

/// Which behaviours a catalog pattern gets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PatternMode {
    /// Matching only.
    Base,
    /// Matching plus context adaptation.
    Adaptive,
    /// Adaptation plus error recovery.
    #[default]
    Resilient,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternSpec {
    /// Unique name within its language.
    pub name: String,

    /// Structural query or regular expression.
    pub rule: String,

    /// Category (syntax, semantics, documentation, ...).
    #[serde(default)]
    pub category: String,

    /// Free-form purpose.
    #[serde(default)]
    pub purpose: String,

    /// Language id, or `*` for any.
    #[serde(default = "default_language")]
    pub language: String,

    /// Informational confidence in [0, 1].
    #[serde(default = "default_confidence")]
    pub confidence: f64,

    /// Behaviours.
    #[serde(default)]
    pub mode: PatternMode,

    /// Free metadata; `chunk_size`, `chunk_overlap` and `max_retries` override `[matching]`.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl PatternSpec {
    /// Creates a catalog entry for any language.
    pub fn new(name: &str, rule: &str) -> Self {
        Self {
            name: name.to_string(),
            rule: rule.to_string(),
            category: String::new(),
            purpose: String::new(),
            language: default_language(),
            confidence: default_confidence(),
            mode: PatternMode::default(),
            metadata: BTreeMap::new(),
        }
    }
}

fn default_language() -> String {
    "*".to_string()
}

fn default_confidence() -> f64 {
    0.8
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> PadraoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PadraoResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Creates default configuration.
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig::default(),
            matching: MatchingConfig::default(),
            adaptation: AdaptationConfig::default(),
            cache: CacheConfig::default(),
            learning: LearningConfig::default(),
            patterns: Vec::new(),
        }
    }

    /// Default configuration plus a small starter catalog.
    pub fn starter() -> Self {
        let mut accessor = PatternSpec::new("accessor", r"\b(?:get|set)_[a-zA-Z]+\b");
        accessor.category = "code_patterns".to_string();
        accessor.purpose = "understanding".to_string();

        let mut todo = PatternSpec::new("todo_comment", r"(?:#|//)\s*TODO[^\n]*");
        todo.category = "documentation".to_string();
        todo.purpose = "maintenance".to_string();

        let mut import = PatternSpec::new("python_import", r"^(?:from\s+[\w.]+\s+)?import\s+[\w., ]+");
        import.category = "dependencies".to_string();
        import.purpose = "understanding".to_string();
        import.language = "python".to_string();

        Self {
            patterns: vec![accessor, todo, import],
            ..Self::default_config()
        }
    }

    /// Tries to load configuration from current directory or uses default.
    pub fn load_or_default() -> Self {
        Self::load("padrao.toml").unwrap_or_else(|_| Self::default_config())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
