//! Filesystem [`Storage`] backend.
//!
//! Keys map to paths under a configured root directory. Writes land in a
//! temporary file inside the root and are published with an atomic rename,
//! so readers never observe a truncated object — an aborted write leaves
//! the previous object (or nothing) in place. Listing walks the tree and
//! returns sorted keys, matching the lexicographic enumeration of the other
//! backends. Content types are accepted and discarded; the filesystem has
//! nowhere to keep them.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::storage::{Storage, StorageError};

/// Object store over a local directory tree.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a key to a path under the root, refusing anything that could
    /// escape it.
    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::Backend(format!("invalid object key: {key}")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.object_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Stage in the root (same filesystem) and publish with a rename.
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(bytes)?;
        staged.persist(&path).map_err(|e| StorageError::Io(e.error))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.object_path(key)?.is_file())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(|e| StorageError::Backend(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(&self.root) {
                Ok(relative) => relative,
                Err(_) => continue,
            };
            let key = relative
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, "/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        storage
            .put("journalclub/items/2024-10-21T12:45:12Z.json", b"{}", "application/json")
            .await
            .unwrap();

        assert_eq!(
            storage
                .get("journalclub/items/2024-10-21T12:45:12Z.json")
                .await
                .unwrap(),
            Some(b"{}".to_vec())
        );
        assert!(storage
            .exists("journalclub/items/2024-10-21T12:45:12Z.json")
            .await
            .unwrap());
        assert_eq!(storage.get("journalclub/feed.xml").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_replaces_whole_objects() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        storage.put("a/feed.xml", b"first version", "text/xml").await.unwrap();
        storage.put("a/feed.xml", b"second", "text/xml").await.unwrap();

        assert_eq!(
            storage.get("a/feed.xml").await.unwrap(),
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn list_returns_sorted_keys_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        for key in ["a/items/2.json", "a/items/1.json", "a/feed.xml", "b/items/9.json"] {
            storage.put(key, b"x", "application/json").await.unwrap();
        }

        assert_eq!(
            storage.list("a/items/").await.unwrap(),
            vec!["a/items/1.json", "a/items/2.json"]
        );
    }

    #[tokio::test]
    async fn list_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path().join("never-created"));
        assert!(storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new(dir.path());

        assert!(storage.put("../escape", b"x", "text/plain").await.is_err());
        assert!(storage.get("a//b").await.is_err());
        assert!(storage.exists("").await.is_err());
    }
}
