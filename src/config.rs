use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectConfig {
    /// Working directory holding settings, input, and output areas.
    pub work_dir: PathBuf,
    /// Optional local settings file copied into the project on first init.
    #[serde(default)]
    pub settings_overrides: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Git URL of the documentation tree.
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.markdown".to_string()]
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BuildConfig {
    /// Rebuild even when a complete artifact set already exists.
    #[serde(default)]
    pub force: bool,
    /// Read input from the project's test_input area and skip corpus sync.
    #[serde(default)]
    pub test_mode: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    /// Community granularity handed to the retrieval engine.
    #[serde(default = "default_community_level")]
    pub community_level: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            community_level: default_community_level(),
        }
    }
}

fn default_community_level() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_engine_provider")]
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_engine_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: default_engine_provider(),
            base_url: None,
            timeout_secs: default_engine_timeout_secs(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

fn default_engine_provider() -> String {
    "disabled".to_string()
}

fn default_engine_timeout_secs() -> u64 {
    600
}

/// Embedding model settings rendered into the project's engine settings
/// file. Embeddings are computed inside the engine, never in-process.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_chat_timeout_secs(),
        }
    }
}

fn default_max_tokens() -> u32 {
    1024
}
fn default_temperature() -> f64 {
    1.0
}
fn default_top_p() -> f64 {
    0.9
}
fn default_chat_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeliveryConfig {
    /// Answers longer than this are condensed via one chat-completion call.
    #[serde(default = "default_summary_budget")]
    pub summary_budget: usize,
    /// Transport message-size ceiling, in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_mask_prefix")]
    pub mask_prefix: usize,
    #[serde(default = "default_mask_suffix")]
    pub mask_suffix: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            summary_budget: default_summary_budget(),
            chunk_size: default_chunk_size(),
            mask_prefix: default_mask_prefix(),
            mask_suffix: default_mask_suffix(),
        }
    }
}

fn default_summary_budget() -> usize {
    3500
}
fn default_chunk_size() -> usize {
    4096
}
fn default_mask_prefix() -> usize {
    4
}
fn default_mask_suffix() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl ChatConfig {
    pub fn is_enabled(&self) -> bool {
        self.model.is_some() && self.base_url.is_some()
    }
}

/// Load the configuration file, fold in environment overrides, and validate.
///
/// This is the only place the process environment is consulted; the
/// resulting [`Config`] is passed by reference to every component.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.apply_overrides(|name| std::env::var(name).ok());
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.corpus.url.trim().is_empty() {
        anyhow::bail!("corpus.url must not be empty");
    }

    if config.delivery.chunk_size == 0 {
        anyhow::bail!("delivery.chunk_size must be > 0");
    }

    if config.delivery.summary_budget == 0 {
        anyhow::bail!("delivery.summary_budget must be > 0");
    }

    if !(0.0..=2.0).contains(&config.chat.temperature) {
        anyhow::bail!("chat.temperature must be in [0.0, 2.0]");
    }

    if !(0.0..=1.0).contains(&config.chat.top_p) {
        anyhow::bail!("chat.top_p must be in [0.0, 1.0]");
    }

    match config.engine.provider.as_str() {
        "disabled" => {}
        "http" => {
            if config.engine.base_url.is_none() {
                anyhow::bail!("engine.base_url must be set when provider is 'http'");
            }
        }
        other => anyhow::bail!(
            "Unknown engine provider: '{}'. Must be disabled or http.",
            other
        ),
    }

    Ok(())
}

impl Config {
    /// Fold recognized environment options into the loaded file.
    ///
    /// Takes the lookup as a closure so tests can drive it without touching
    /// the process environment.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get("GRAPHDEX_CORPUS_URL") {
            self.corpus.url = url;
        }
        if let Some(dir) = get("GRAPHDEX_WORK_DIR") {
            self.project.work_dir = PathBuf::from(dir);
        }
        if let Some(force) = get("GRAPHDEX_FORCE_REBUILD") {
            self.build.force = parse_bool(&force);
        }
        if let Some(test_mode) = get("GRAPHDEX_TEST_MODE") {
            self.build.test_mode = parse_bool(&test_mode);
        }
        if let Some(model) = get("GRAPHDEX_CHAT_MODEL") {
            self.chat.model = Some(model);
        }
        if let Some(base) = get("GRAPHDEX_CHAT_BASE_URL") {
            self.chat.base_url = Some(base);
        }
        if let Some(key) = get("GRAPHDEX_CHAT_API_KEY") {
            self.chat.api_key = Some(key);
        }
        if let Some(model) = get("GRAPHDEX_EMBEDDING_MODEL") {
            self.engine.embedding.model = Some(model);
        }
        if let Some(base) = get("GRAPHDEX_EMBEDDING_BASE_URL") {
            self.engine.embedding.base_url = Some(base);
        }
        if let Some(key) = get("GRAPHDEX_EMBEDDING_API_KEY") {
            self.engine.embedding.api_key = Some(key);
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "t" | "y" | "yes"
    )
}
