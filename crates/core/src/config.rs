//! Configuration management for docchat.
//!
//! Configuration is resolved once at process start and layered as:
//! - Built-in defaults
//! - YAML config file (`--config`, `DOCCHAT_CONFIG`, or `./docchat.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The resolved sections are passed explicitly into the embedding client,
//! passage store and completion client constructors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "docchat.yaml";

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Config file the values were loaded from, if any
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Passage store settings
    pub database: DatabaseConfig,

    /// Embedding service settings
    pub embedding: EmbeddingConfig,

    /// Completion service settings
    pub completion: CompletionConfig,

    /// Similarity search settings
    pub retrieval: RetrievalConfig,

    /// Optional YAML prompt definition overriding the built-in system prompt
    pub prompt_file: Option<PathBuf>,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Headroom on top of the embedding retry budget for searching and
/// starting the completion stream before the response head is due.
pub const RESPONSE_HEAD_MARGIN: Duration = Duration::from_secs(5);

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,

    /// Upper bound for producing a response head (seconds)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Passage store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseConfig {
    /// Postgres connection string
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,

    /// Dimension of the stored passage embeddings
    pub dimensions: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 5,
            dimensions: 768,
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingConfig {
    /// Full URL of the embeddings endpoint
    pub endpoint: String,

    /// Embedding model name
    pub model: String,

    /// Instruction prefix prepended to queries (asymmetric query/document convention)
    pub query_prefix: String,

    /// How long the service keeps the model loaded (-1 = forever)
    pub keep_alive: i64,

    /// Total number of attempts per query
    pub max_attempts: u32,

    /// Per-attempt timeout in milliseconds
    pub attempt_timeout_ms: u64,

    /// Fixed delay between failed attempts in milliseconds
    pub backoff_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/api/embeddings".to_string(),
            model: "nomic-embed-text".to_string(),
            query_prefix: "search_query: ".to_string(),
            keep_alive: -1,
            max_attempts: 3,
            attempt_timeout_ms: 5_000,
            backoff_ms: 1_000,
        }
    }
}

impl EmbeddingConfig {
    /// Worst-case time spent embedding one query: every attempt times out
    /// and is followed by the backoff, except the last.
    pub fn retry_budget(&self) -> Duration {
        let attempts = u64::from(self.max_attempts);
        let waits = attempts.saturating_sub(1);
        Duration::from_millis(
            attempts
                .saturating_mul(self.attempt_timeout_ms)
                .saturating_add(waits.saturating_mul(self.backoff_ms)),
        )
    }
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionConfig {
    /// Full URL of the chat endpoint
    pub endpoint: String,

    /// Chat model name
    pub model: String,

    /// Sampling temperature (0 = deterministic)
    pub temperature: f32,

    /// Context window in tokens
    pub num_ctx: u32,

    /// Maximum generated tokens
    pub num_predict: u32,

    /// Threads used by the model server
    pub num_thread: u32,

    /// How long the service keeps the model loaded (-1 = forever)
    pub keep_alive: i64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434/api/chat".to_string(),
            model: "llama3.2:1b".to_string(),
            temperature: 0.0,
            num_ctx: 1024,
            num_predict: 256,
            num_thread: 4,
            keep_alive: -1,
        }
    }
}

/// Similarity search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    /// Passages must score strictly above this cosine similarity
    pub threshold: f32,

    /// Maximum number of passages handed to the prompt
    pub limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            threshold: 0.50,
            limit: 2,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format: {}. Supported: text, json",
                other
            ))),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Log level or filter directive
    pub level: Option<String>,

    /// Verbose mode (debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Text or JSON lines
    pub format: LogFormat,
}

/// CLI flags that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub verbose: bool,
    pub no_color: bool,
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `DOCCHAT_CONFIG`: Path to config file
    /// - `DOCCHAT_BIND`: Server listen address
    /// - `DATABASE_URL`: Postgres connection string
    /// - `DOCCHAT_EMBEDDING_URL` / `DOCCHAT_EMBEDDING_MODEL`
    /// - `DOCCHAT_COMPLETION_URL` / `DOCCHAT_COMPLETION_MODEL`
    /// - `DOCCHAT_PROMPT_FILE`: Prompt definition override
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docchat_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Listening on {}", config.server.bind);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("DOCCHAT_CONFIG").ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Self::from_yaml_file(&path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_yaml_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Parse a YAML config file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config: AppConfig = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Loaded config file {:?}", path);
        config.config_file = Some(path.to_path_buf());
        Ok(config)
    }

    /// Overlay environment variables, read through `lookup`.
    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("DOCCHAT_BIND") {
            self.server.bind = bind;
        }

        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }

        if let Some(endpoint) = lookup("DOCCHAT_EMBEDDING_URL") {
            self.embedding.endpoint = endpoint;
        }

        if let Some(model) = lookup("DOCCHAT_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Some(endpoint) = lookup("DOCCHAT_COMPLETION_URL") {
            self.completion.endpoint = endpoint;
        }

        if let Some(model) = lookup("DOCCHAT_COMPLETION_MODEL") {
            self.completion.model = model;
        }

        if let Some(prompt_file) = lookup("DOCCHAT_PROMPT_FILE") {
            self.prompt_file = Some(PathBuf::from(prompt_file));
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.logging.level = Some(level);
        }

        if lookup("NO_COLOR").is_some() {
            self.logging.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }

        if let Some(level) = overrides.log_level {
            self.logging.level = Some(level);
        }

        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }

        if overrides.verbose {
            self.logging.verbose = true;
            // Verbose mode implies debug logging
            if self.logging.level.is_none() {
                self.logging.level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.logging.no_color = true;
        }

        self
    }

    /// Validate tunables and endpoints.
    ///
    /// `require_database` is false for commands that never touch the store.
    pub fn validate(&self, require_database: bool) -> AppResult<()> {
        validate_endpoint("embedding.endpoint", &self.embedding.endpoint)?;
        validate_endpoint("completion.endpoint", &self.completion.endpoint)?;

        if self.embedding.max_attempts == 0 {
            return Err(AppError::Config(
                "embedding.maxAttempts must be at least 1".to_string(),
            ));
        }

        if self.embedding.attempt_timeout_ms == 0 {
            return Err(AppError::Config(
                "embedding.attemptTimeoutMs must be positive".to_string(),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "server.requestTimeoutSecs must be positive".to_string(),
            ));
        }

        let floor = self.embedding.retry_budget() + RESPONSE_HEAD_MARGIN;
        if Duration::from_secs(self.server.request_timeout_secs) < floor {
            return Err(AppError::Config(format!(
                "server.requestTimeoutSecs ({}s) must cover the embedding retry budget plus {}s, at least {}s",
                self.server.request_timeout_secs,
                RESPONSE_HEAD_MARGIN.as_secs(),
                floor.as_secs_f64().ceil() as u64
            )));
        }

        if !(-1.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(AppError::Config(format!(
                "retrieval.threshold must be within [-1, 1], got {}",
                self.retrieval.threshold
            )));
        }

        if self.retrieval.limit == 0 {
            return Err(AppError::Config(
                "retrieval.limit must be at least 1".to_string(),
            ));
        }

        if self.database.dimensions == 0 {
            return Err(AppError::Config(
                "database.dimensions must be positive".to_string(),
            ));
        }

        if require_database && self.database.url.trim().is_empty() {
            return Err(AppError::Config(
                "No database url configured. Set DATABASE_URL or database.url".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_endpoint(name: &str, value: &str) -> AppResult<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            name, value
        )))
    }
}
