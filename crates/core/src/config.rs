//! Configuration management for Docent.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.docent/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with local state stored in `.docent/`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::retry::RetryPolicy;

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".docent";

/// Embedding providers understood by the knowledge crate.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["rest", "ollama", "mock"];

/// Generation providers understood by the LLM crate.
pub const GENERATION_PROVIDERS: [&str; 2] = ["completion", "ollama"];

/// Vector store backends understood by the knowledge crate.
pub const VECTOR_BACKENDS: [&str; 2] = ["sqlite", "opensearch"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docent/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log output format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub embedding: EmbeddingSettings,

    pub generation: GenerationSettings,

    pub vector_store: VectorStoreSettings,

    pub ingest: IngestSettings,

    pub retrieval: RetrievalSettings,

    pub retry: RetryPolicy,

    /// Assistant personas keyed by a short identifier
    pub bots: BTreeMap<String, BotConfig>,

    /// Bot used when none is selected explicitly
    pub default_bot: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Embedding gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "rest", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Service endpoint; provider default when absent
    pub endpoint: Option<String>,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Environment variable holding a bearer token
    pub api_key_env: Option<String>,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Enable the content-addressed embedding cache
    pub cache: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "rest".to_string(),
            model: "amazon.titan-embed-text-v1".to_string(),
            endpoint: None,
            dimensions: 1536,
            api_key_env: None,
            timeout_secs: 30,
            cache: false,
        }
    }
}

/// Generation gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Provider name: "completion", "ollama"
    pub provider: String,

    pub model: String,

    pub endpoint: Option<String>,

    pub api_key_env: Option<String>,

    pub max_tokens: u32,

    pub temperature: f32,

    pub top_p: f32,

    /// Sequences that end the completion (prevent invented dialogue turns)
    pub stop_sequences: Vec<String>,

    pub timeout_secs: u64,

    /// Prompt definition used to build the grounding instruction block
    pub prompt_id: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "completion".to_string(),
            model: "anthropic.claude-v2:1".to_string(),
            endpoint: None,
            api_key_env: None,
            max_tokens: 512,
            temperature: 0.3,
            top_p: 0.9,
            stop_sequences: vec!["\n\nHuman:".to_string()],
            timeout_secs: 60,
            prompt_id: "answer.grounded".to_string(),
        }
    }
}

/// Similarity metric of a vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    L2,
    Cosine,
    InnerProduct,
}

impl DistanceMetric {
    /// OpenSearch `space_type` name for this metric.
    pub fn space_type(&self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::Cosine => "cosinesimil",
            Self::InnerProduct => "innerproduct",
        }
    }

    /// Parse a metric from its config or OpenSearch spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "l2" | "euclidean" => Some(Self::L2),
            "cosine" | "cosinesimil" => Some(Self::Cosine),
            "inner_product" | "innerproduct" | "dot" => Some(Self::InnerProduct),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L2 => "l2",
            Self::Cosine => "cosine",
            Self::InnerProduct => "inner_product",
        }
    }
}

/// Vector store settings, including approximate-nearest-neighbor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VectorStoreSettings {
    /// Backend name: "sqlite", "opensearch"
    pub backend: String,

    /// OpenSearch endpoint (e.g. "https://search.example.com:443")
    pub endpoint: Option<String>,

    /// Environment variable holding the basic-auth username
    pub username_env: Option<String>,

    /// Environment variable holding the basic-auth password
    pub password_env: Option<String>,

    pub metric: DistanceMetric,

    /// ANN engine name (OpenSearch `method.engine`)
    pub engine: String,

    /// HNSW construction-time candidate list size
    pub ef_construction: u32,

    /// HNSW neighbors per node
    pub m: u32,

    /// HNSW search-time candidate list size
    pub ef_search: u32,

    pub timeout_secs: u64,

    /// Make each insert visible to search before returning
    pub refresh: bool,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            endpoint: None,
            username_env: None,
            password_env: None,
            metric: DistanceMetric::L2,
            engine: "nmslib".to_string(),
            ef_construction: 256,
            m: 48,
            ef_search: 100,
            timeout_secs: 60,
            refresh: false,
        }
    }
}

/// Chunking parameters used at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestSettings {
    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
        }
    }
}

/// Query-time retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Number of nearest chunks fed to the generator
    pub top_k: usize,

    /// Separator placed between retrieved chunks in the context
    pub separator: String,

    /// Answer returned verbatim when nothing is retrieved
    pub fallback_message: String,
}

/// Default answer when retrieval finds nothing.
pub const DEFAULT_FALLBACK_MESSAGE: &str = "I couldn't find specific information related to your query in my current knowledge base. Could you please try rephrasing, or ask about a different topic?";

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            separator: "\n\n---\n\n".to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// A configured assistant persona bound to one knowledge base.
///
/// Every field is required in YAML; a missing field fails config loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Vector index holding this bot's knowledge base
    pub index_name: String,

    /// Instruction prefix defining tone, role, and grounding rules
    pub persona_prompt: String,

    /// First assistant message shown when a conversation starts
    pub initial_message: String,

    pub display: DisplayMeta,
}

/// Presentation metadata for a bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMeta {
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_placeholder: Option<String>,
}

/// Key of the bot available without any configuration file.
pub const BUILTIN_BOT: &str = "assistant";

fn builtin_bot() -> BotConfig {
    BotConfig {
        index_name: "knowledge-base".to_string(),
        persona_prompt: "You are a friendly and helpful assistant for the documents in this knowledge base. \
Greet and introduce yourself if the user greets you."
            .to_string(),
        initial_message: "Hi there! Ask me anything about the documents in my knowledge base."
            .to_string(),
        display: DisplayMeta {
            display_name: "Document Assistant".to_string(),
            subtitle: None,
            avatar: None,
            input_placeholder: Some("Ask a question...".to_string()),
        },
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationSettings>,
    vector_store: Option<VectorStoreSettings>,
    ingest: Option<IngestSettings>,
    retrieval: Option<RetrievalSettings>,
    retry: Option<RetryPolicy>,
    bots: Option<BTreeMap<String, BotConfig>>,
    default_bot: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut bots = BTreeMap::new();
        bots.insert(BUILTIN_BOT.to_string(), builtin_bot());

        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            log_format: LogFormat::Text,
            verbose: false,
            no_color: false,
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
            vector_store: VectorStoreSettings::default(),
            ingest: IngestSettings::default(),
            retrieval: RetrievalSettings::default(),
            retry: RetryPolicy::default(),
            bots,
            default_bot: BUILTIN_BOT.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the workspace config file, and the environment.
    ///
    /// Environment variables:
    /// - `DOCENT_WORKSPACE`: Override workspace path
    /// - `DOCENT_CONFIG`: Path to config file
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docent_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let workspace = std::env::var("DOCENT_WORKSPACE").ok().map(PathBuf::from);
        let config_file = std::env::var("DOCENT_CONFIG").ok().map(PathBuf::from);
        Self::load_from(workspace, config_file)
    }

    /// Load configuration for an explicit workspace and config file.
    ///
    /// CLI flags resolve these two before anything else is read, because they
    /// decide which YAML file applies.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        // Load from YAML config file if it exists
        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
        }

        // Check for NO_COLOR environment variable
        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        config.validate()?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;

        let mut result = self.clone();

        // Merge workspace settings
        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        // Merge logging settings
        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }
        if let Some(vector_store) = config_file.vector_store {
            result.vector_store = vector_store;
        }
        if let Some(ingest) = config_file.ingest {
            result.ingest = ingest;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(retry) = config_file.retry {
            result.retry = retry;
        }

        // Configured bots replace the built-in one entirely
        if let Some(bots) = config_file.bots {
            result.bots = bots;
            if !result.bots.contains_key(&result.default_bot) {
                if let Some(first) = result.bots.keys().next() {
                    result.default_bot = first.clone();
                }
            }
        }
        if let Some(default_bot) = config_file.default_bot {
            result.default_bot = default_bot;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the config file and environment.
    pub fn with_overrides(mut self, log_level: Option<String>, verbose: bool, no_color: bool) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docent directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .docent directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Path of the embedded SQLite vector index.
    pub fn sqlite_index_path(&self) -> PathBuf {
        self.state_dir().join("index.sqlite")
    }

    /// Look up a bot by key, falling back to the default bot.
    pub fn bot(&self, key: Option<&str>) -> AppResult<(&str, &BotConfig)> {
        let key = key.unwrap_or(&self.default_bot);
        self.bots
            .get_key_value(key)
            .map(|(k, bot)| (k.as_str(), bot))
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Unknown bot '{}'. Configured bots: {}",
                    key,
                    self.bots.keys().cloned().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    /// Resolve a secret from the environment variable named in the config.
    pub fn resolve_secret(env_name: Option<&str>) -> AppResult<Option<String>> {
        match env_name {
            None => Ok(None),
            Some(name) => std::env::var(name).map(Some).map_err(|_| {
                AppError::Config(format!("Environment variable {} is not set", name))
            }),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        check_known("embedding provider", &self.embedding.provider, &EMBEDDING_PROVIDERS)?;
        check_known("generation provider", &self.generation.provider, &GENERATION_PROVIDERS)?;
        check_known("vector store backend", &self.vector_store.backend, &VECTOR_BACKENDS)?;

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }

        if self.vector_store.backend == "opensearch" && self.vector_store.endpoint.is_none() {
            return Err(AppError::Config(
                "vectorStore.endpoint is required for the opensearch backend".to_string(),
            ));
        }

        if self.ingest.chunk_size == 0 {
            return Err(AppError::Config(
                "ingest.chunkSize must be greater than 0".to_string(),
            ));
        }

        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(AppError::Config(format!(
                "ingest.chunkOverlap ({}) must be smaller than ingest.chunkSize ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.maxAttempts must be at least 1".to_string(),
            ));
        }

        if self.bots.is_empty() {
            return Err(AppError::Config("At least one bot must be configured".to_string()));
        }

        for (key, bot) in &self.bots {
            let required = [
                ("indexName", &bot.index_name),
                ("personaPrompt", &bot.persona_prompt),
                ("initialMessage", &bot.initial_message),
                ("display.displayName", &bot.display.display_name),
            ];
            for (field, value) in required {
                if value.trim().is_empty() {
                    return Err(AppError::Config(format!(
                        "Bot '{}' has an empty {}",
                        key, field
                    )));
                }
            }
        }

        if !self.bots.contains_key(&self.default_bot) {
            return Err(AppError::Config(format!(
                "defaultBot '{}' is not a configured bot",
                self.default_bot
            )));
        }

        Ok(())
    }
}

fn check_known(what: &str, value: &str, known: &[&str]) -> AppResult<()> {
    if known.contains(&value) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Unknown {}: {}. Supported: {}",
            what,
            value,
            known.join(", ")
        )))
    }
}
