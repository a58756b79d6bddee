//! Item record layer: key layout, writes, and full enumeration.
//!
//! One JSON record per item at `{feed}/items/{key}.json`, written whole and
//! only ever read back whole — records are never mutated in place. Overwrite
//! protection is deliberately absent here; the ingestion orchestration owns
//! the duplicate guard.

use crate::error::Error;
use crate::extractor::Extractor;
use crate::models::Item;
use crate::storage::{Storage, StorageError};

pub const ITEM_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Storage key of one item record.
pub fn item_record_key(feed: &str, key: &str) -> String {
    format!("{feed}/items/{key}.json")
}

/// Storage key prefix covering all of a feed's item records.
pub fn items_prefix(feed: &str) -> String {
    format!("{feed}/items/")
}

/// Storage key of the rendered feed document.
pub fn feed_document_key(feed: &str) -> String {
    format!("{feed}/feed.xml")
}

/// Write one item record.
pub async fn put_item(storage: &dyn Storage, feed: &str, item: &Item) -> Result<(), Error> {
    let key = item_record_key(feed, &item.key());
    let bytes = serde_json::to_vec(item)?;
    storage
        .put(&key, &bytes, ITEM_CONTENT_TYPE)
        .await
        .map_err(Error::StoreWrite)
}

/// Read and decode every item record for `feed`.
///
/// Each decoded item is prepended to the accumulating sequence, so the
/// result is the reverse of the backend's enumeration order — newest first
/// when keys enumerate chronologically. No timestamp comparison happens
/// here; position is the whole ordering mechanism.
pub async fn collect_items(
    storage: &dyn Storage,
    extractor: &dyn Extractor,
    feed: &str,
) -> Result<Vec<Item>, Error> {
    let keys = storage
        .list(&items_prefix(feed))
        .await
        .map_err(Error::StoreRead)?;

    let mut items: Vec<Item> = Vec::with_capacity(keys.len());
    for key in keys {
        let bytes = storage
            .get(&key)
            .await
            .map_err(Error::StoreRead)?
            .ok_or_else(|| {
                Error::StoreRead(StorageError::Backend(format!(
                    "listed object vanished: {key}"
                )))
            })?;
        let item = extractor.decode(&bytes)?;
        items.insert(0, item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::extractor_generic::GenericExtractor;
    use crate::models::GenericItem;
    use crate::storage_mem::MemoryStorage;

    fn item(hour: u32, subject: &str) -> Item {
        Item::Generic(GenericItem {
            uuid: String::new(),
            subject: subject.to_string(),
            date: Utc.with_ymd_and_hms(2024, 10, 21, hour, 0, 0).unwrap(),
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn put_item_writes_under_the_feed_items_prefix() {
        let storage = MemoryStorage::new();
        put_item(&storage, "weekly", &item(9, "a")).await.unwrap();

        assert!(storage
            .exists("weekly/items/2024-10-21T09:00:00Z.json")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn collect_items_reverses_enumeration_order() {
        let storage = MemoryStorage::new();
        let extractor = GenericExtractor::new("weekly".to_string());

        // Enumeration order in this backend is lexicographic: A, B, C.
        for (hour, subject) in [(9, "A"), (10, "B"), (11, "C")] {
            put_item(&storage, "weekly", &item(hour, subject))
                .await
                .unwrap();
        }

        let items = collect_items(&storage, &extractor, "weekly").await.unwrap();
        let subjects: Vec<&str> = items.iter().map(|i| i.subject()).collect();
        assert_eq!(subjects, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn collect_items_is_scoped_to_one_feed() {
        let storage = MemoryStorage::new();
        let extractor = GenericExtractor::new("weekly".to_string());

        put_item(&storage, "weekly", &item(9, "mine")).await.unwrap();
        put_item(&storage, "other", &item(9, "theirs")).await.unwrap();

        let items = collect_items(&storage, &extractor, "weekly").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subject(), "mine");
    }

    #[tokio::test]
    async fn corrupt_records_abort_collection() {
        let storage = MemoryStorage::new();
        let extractor = GenericExtractor::new("weekly".to_string());

        storage
            .put("weekly/items/2024-10-21T09:00:00Z.json", b"not json", ITEM_CONTENT_TYPE)
            .await
            .unwrap();

        assert!(matches!(
            collect_items(&storage, &extractor, "weekly").await,
            Err(Error::ItemRecord(_))
        ));
    }
}
