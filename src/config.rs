use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    pub corpus: CorpusConfig,
    pub library: LibraryConfig,
    pub usage: UsageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Embedding model used for every embedding-family task.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. A hung remote call fails the request instead
    /// of blocking it indefinitely; there are no retries.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-large".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}

/// Locations and shape of the precomputed embedding corpora, loaded once
/// at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub nodes_path: PathBuf,
    pub documents_path: PathBuf,
    /// Identifier column in the nodes CSV.
    #[serde(default = "default_node_id_col")]
    pub node_id_col: String,
    /// Identifier column in the documents CSV.
    #[serde(default = "default_document_id_col")]
    pub document_id_col: String,
    /// Expected embedding vector length.
    #[serde(default = "default_dims")]
    pub dims: usize,
}

fn default_node_id_col() -> String {
    "node".to_string()
}
fn default_document_id_col() -> String {
    "source".to_string()
}
fn default_dims() -> usize {
    1024
}

/// Directory of plain-text documents served to the frontend.
#[derive(Debug, Deserialize, Clone)]
pub struct LibraryConfig {
    pub root: PathBuf,
}

/// Token-usage counters and saved interaction logs.
#[derive(Debug, Deserialize, Clone)]
pub struct UsageConfig {
    pub dir: PathBuf,
    pub study_dir: PathBuf,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.corpus.dims == 0 {
        anyhow::bail!("corpus.dims must be > 0");
    }

    if config.model.request_timeout_secs == 0 {
        anyhow::bail!("model.request_timeout_secs must be > 0");
    }

    Ok(config)
}
