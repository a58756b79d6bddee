//! In-memory [`Storage`] implementation for tests and ephemeral deployments.
//!
//! Objects live in a `BTreeMap` behind `std::sync::RwLock`, so prefix
//! enumeration comes out lexicographically ordered for free. Content types
//! are accepted and discarded — nothing reads them back from this backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::storage::{Storage, StorageError};

/// In-memory object store.
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.read().unwrap().get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects
            .write()
            .unwrap()
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.read().unwrap().contains_key(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.objects.read().unwrap();
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let storage = MemoryStorage::new();
        storage
            .put("a/items/1.json", b"{}", "application/json")
            .await
            .unwrap();

        assert_eq!(
            storage.get("a/items/1.json").await.unwrap(),
            Some(b"{}".to_vec())
        );
        assert!(storage.exists("a/items/1.json").await.unwrap());
        assert_eq!(storage.get("a/items/2.json").await.unwrap(), None);
        assert!(!storage.exists("a/items/2.json").await.unwrap());
    }

    #[tokio::test]
    async fn put_overwrites_in_place() {
        let storage = MemoryStorage::new();
        storage.put("k", b"first", "text/plain").await.unwrap();
        storage.put("k", b"second", "text/plain").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap(), Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn list_is_prefix_scoped_and_ordered() {
        let storage = MemoryStorage::new();
        for key in ["b/items/2", "a/items/3", "a/items/1", "a/feed.xml", "a/items/2"] {
            storage.put(key, b"x", "text/plain").await.unwrap();
        }

        assert_eq!(
            storage.list("a/items/").await.unwrap(),
            vec!["a/items/1", "a/items/2", "a/items/3"]
        );
        assert!(storage.list("c/").await.unwrap().is_empty());
    }
}
