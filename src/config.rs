//! Configuration module for the assessment search engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ASSESS_` and use double
//! underscores to separate nested levels:
//! - `ASSESS_SEARCH__DEFAULT_RESULTS=20` sets `search.default_results`
//! - `ASSESS_EMBEDDING__MODEL=BGESmallENV15` sets `embedding.model`
//! - `ASSESS_SERVER__BIND=0.0.0.0:8000` sets `server.bind`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vector::Metric;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".assess";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Processed catalog (JSON array of records)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Directory holding `index.bin` and `metadata.json`
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Query-time settings
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Where downloaded model files are cached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Texts per inference batch during the offline build
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Show download progress on first model load
    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Metric written into newly built indexes
    #[serde(default)]
    pub metric: Metric,

    /// Result count when the caller does not give one
    #[serde(default = "default_results")]
    pub default_results: usize,

    /// Bound on one recommend call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/processed_dataset.json")
}
fn default_index_dir() -> PathBuf {
    PathBuf::from(".assess/index")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_results() -> usize {
    10
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_bind_address() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:8501".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            debug: false,
            corpus_path: default_corpus_path(),
            index_dir: default_index_dir(),
            embedding: EmbeddingConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            batch_size: default_batch_size(),
            show_download_progress: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            default_results: default_results(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl EmbeddingConfig {
    /// Resolved model cache directory.
    ///
    /// Falls back to the user cache directory, then to `.assess/models`.
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|dir| dir.join("assessment-search").join("models"))
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting levels; single underscores
            // stay inside field names.
            .merge(Env::prefixed("ASSESS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find the workspace config by looking for `.assess` from cwd upwards
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join("settings.toml"))
    }

    /// Path of the binary index artifact
    pub fn index_file(&self) -> PathBuf {
        self.index_dir.join("index.bin")
    }

    /// Path of the index metadata sidecar
    pub fn metadata_file(&self) -> PathBuf {
        self.index_dir.join(crate::metadata::METADATA_FILE)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r#"# Assessment search configuration

# Version of the configuration schema
version = 1

# Global debug mode (enables debug-level logs)
debug = false

# Processed catalog: a JSON array of records with an `embedding_text` field
corpus_path = "data/processed_dataset.json"

# Directory for index.bin and metadata.json
index_dir = ".assess/index"

[embedding]
# Model used for both the offline build and online queries.
# Changing it requires rebuilding the index.
model = "AllMiniLML6V2"

# Texts per inference batch during `assess-index build`
batch_size = 32

# Show download progress on first model load
show_download_progress = true

# Model cache directory (defaults to the user cache directory)
# cache_dir = "/var/cache/assessment-search/models"

[search]
# Metric for newly built indexes: "inner_product" (cosine) or "l2".
# Queries always use the metric stored in the index.
metric = "inner_product"

# Results returned when the caller does not ask for a number
default_results = 10

# Upper bound on one recommendation, in milliseconds
timeout_ms = 10000

[server]
# HTTP bind address for `assess serve`
bind = "127.0.0.1:8000"

# Browser origins allowed to call the API
cors_origins = ["http://localhost:8501"]
"#;

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
