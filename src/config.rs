use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub blobs: BlobsConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlobsConfig {
    #[serde(default = "default_blob_backend")]
    pub backend: String,
    #[serde(default = "default_blob_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub s3: Option<S3BlobConfig>,
}

impl Default for BlobsConfig {
    fn default() -> Self {
        Self {
            backend: default_blob_backend(),
            root: default_blob_root(),
            s3: None,
        }
    }
}

fn default_blob_backend() -> String {
    "filesystem".to_string()
}
fn default_blob_root() -> PathBuf {
    PathBuf::from("./data/blobs")
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3BlobConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: default_summarizer_provider(),
            model: None,
            base_url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_summarizer_provider() -> String {
    "passthrough".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_on_duplicate")]
    pub on_duplicate: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            on_duplicate: default_on_duplicate(),
        }
    }
}

fn default_on_duplicate() -> String {
    "reject".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl IngestConfig {
    pub fn replaces_duplicates(&self) -> bool {
        self.on_duplicate == "replace"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate blobs
    match config.blobs.backend.as_str() {
        "filesystem" => {}
        "s3" => {
            if config.blobs.s3.is_none() {
                anyhow::bail!("[blobs.s3] section required when blobs.backend is 's3'");
            }
        }
        other => anyhow::bail!(
            "Unknown blob backend: '{}'. Must be filesystem or s3.",
            other
        ),
    }

    // Validate summarizer
    match config.summarizer.provider.as_str() {
        "passthrough" => {}
        "openai" => {
            if config.summarizer.model.is_none() {
                anyhow::bail!("summarizer.model must be specified when provider is 'openai'");
            }
        }
        other => anyhow::bail!(
            "Unknown summarizer provider: '{}'. Must be openai or passthrough.",
            other
        ),
    }

    // Validate ingest
    match config.ingest.on_duplicate.as_str() {
        "reject" | "replace" => {}
        other => anyhow::bail!(
            "Unknown ingest.on_duplicate policy: '{}'. Must be reject or replace.",
            other
        ),
    }

    Ok(config)
}
