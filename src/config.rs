use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub templates: TemplatesConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Backend kind: `fs`, `memory`, or `s3`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Root directory for the `fs` backend.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Bucket name for the `s3` backend.
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// Optional key namespace inside the bucket (`s3` backend).
    #[serde(default)]
    pub prefix: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_backend() -> String {
    "fs".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TemplatesConfig {
    /// Directory holding one `*.xml.tmpl` file per extraction strategy.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FeedsConfig {
    /// Feed names served by the podcast extraction strategy. Any feed name
    /// not listed here falls back to the generic strategy.
    #[serde(default)]
    pub podcast: Vec<String>,
}

impl Config {
    /// A memory-backed configuration pointing at the repository templates.
    /// Used by tests and available for ephemeral deployments.
    pub fn minimal() -> Config {
        Config {
            server: ServerConfig {
                bind: "127.0.0.1:8080".to_string(),
            },
            storage: StorageConfig {
                backend: "memory".to_string(),
                root: None,
                bucket: None,
                region: default_region(),
                prefix: String::new(),
                endpoint_url: None,
            },
            templates: TemplatesConfig {
                path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates"),
            },
            feeds: FeedsConfig {
                podcast: vec!["journalclub".to_string()],
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    match config.storage.backend.as_str() {
        "fs" => {
            if config.storage.root.is_none() {
                anyhow::bail!("storage.root is required when storage.backend is 'fs'");
            }
        }
        "s3" => {
            if config.storage.bucket.is_none() {
                anyhow::bail!("storage.bucket is required when storage.backend is 's3'");
            }
        }
        "memory" => {}
        other => anyhow::bail!(
            "storage.backend must be one of fs, memory, s3 (got '{}')",
            other
        ),
    }

    if config.server.bind.is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    Ok(config)
}
