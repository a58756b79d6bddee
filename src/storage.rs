//! Object storage seam.
//!
//! The [`Storage`] trait defines the four operations the pipeline needs from
//! durable blob storage — get, put, exists, and prefix enumeration —
//! enabling pluggable backends (filesystem, in-memory, S3-compatible).
//!
//! Implementations must be `Send + Sync` and must never expose a partially
//! written object to readers: a `put` is either invisible or complete. All
//! shipped backends enumerate keys lexicographically; the pipeline treats
//! that ordering as a backend property, not a contract it relies on.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::storage_fs::FsStorage;
use crate::storage_mem::MemoryStorage;
use crate::storage_s3::S3Storage;

/// Failures from a storage backend. Missing objects are not errors — `get`
/// returns `None` for those.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Backend(String),
}

/// Abstract durable blob storage keyed by `/`-separated string keys.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch an object's bytes, or `None` if no object exists at `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store an object whole. Readers never observe a partial write.
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Enumerate all keys starting with `prefix`, lexicographically ordered.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Build the storage backend selected by the configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn Storage>> {
    match config.storage.backend.as_str() {
        "fs" => {
            let root = config
                .storage
                .root
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("storage.root is required for the fs backend"))?;
            Ok(Arc::new(FsStorage::new(root.clone())))
        }
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        "s3" => Ok(Arc::new(S3Storage::from_config(&config.storage)?)),
        other => anyhow::bail!(
            "Unknown storage backend: '{}'. Available: fs, memory, s3",
            other
        ),
    }
}
