//! Feed synthesis: full recompute of the rendered document.
//!
//! Regeneration never edits the published document incrementally. It reads
//! the complete item record set, renders it through the strategy's template,
//! and replaces the document in one write. Any read, decode, or render
//! failure aborts before that write, leaving the previously published
//! document untouched; the storage backends guarantee the write itself is
//! all-or-nothing.

use tera::Tera;
use tracing::info;

use crate::error::Error;
use crate::extractor::Extractor;
use crate::storage::Storage;
use crate::{render, store};

pub const FEED_CONTENT_TYPE: &str = "application/xml+rss;charset=UTF-8";

/// Regenerate `feed`'s document from the complete item record set.
pub async fn regenerate(
    storage: &dyn Storage,
    templates: &Tera,
    extractor: &dyn Extractor,
    feed: &str,
) -> Result<(), Error> {
    let items = store::collect_items(storage, extractor, feed).await?;
    let rendered = render::render_feed(templates, extractor.template(), feed, &items)?;

    storage
        .put(
            &store::feed_document_key(feed),
            rendered.as_bytes(),
            FEED_CONTENT_TYPE,
        )
        .await
        .map_err(Error::StoreWrite)?;

    info!(feed, items = items.len(), "regenerated feed document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::extractor_generic::GenericExtractor;
    use crate::models::{GenericItem, Item};
    use crate::storage_mem::MemoryStorage;

    fn templates() -> Tera {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates");
        render::load_templates(&dir).unwrap()
    }

    fn item(hour: u32, subject: &str) -> Item {
        Item::Generic(GenericItem {
            uuid: String::new(),
            subject: subject.to_string(),
            date: Utc.with_ymd_and_hms(2024, 10, 21, hour, 0, 0).unwrap(),
            body: String::new(),
        })
    }

    #[tokio::test]
    async fn regenerate_publishes_a_document_with_every_item() {
        let storage = MemoryStorage::new();
        let extractor = GenericExtractor::new("weekly".to_string());

        store::put_item(&storage, "weekly", &item(9, "alpha")).await.unwrap();
        store::put_item(&storage, "weekly", &item(10, "beta")).await.unwrap();

        regenerate(&storage, &templates(), &extractor, "weekly")
            .await
            .unwrap();

        let document = storage.get("weekly/feed.xml").await.unwrap().unwrap();
        let document = String::from_utf8(document).unwrap();
        assert!(document.contains("alpha"));
        assert!(document.contains("beta"));
        // The later key enumerates last and is prepended last.
        assert!(document.find("beta").unwrap() < document.find("alpha").unwrap());
    }

    #[tokio::test]
    async fn empty_feeds_still_render_a_document() {
        let storage = MemoryStorage::new();
        let extractor = GenericExtractor::new("weekly".to_string());

        regenerate(&storage, &templates(), &extractor, "weekly")
            .await
            .unwrap();

        assert!(storage.exists("weekly/feed.xml").await.unwrap());
    }

    #[tokio::test]
    async fn aborted_regeneration_keeps_the_previous_document() {
        let storage = MemoryStorage::new();
        let extractor = GenericExtractor::new("weekly".to_string());

        store::put_item(&storage, "weekly", &item(9, "alpha")).await.unwrap();
        regenerate(&storage, &templates(), &extractor, "weekly")
            .await
            .unwrap();
        let published = storage.get("weekly/feed.xml").await.unwrap().unwrap();

        // A corrupt record makes the next regeneration abort mid-read.
        storage
            .put(
                "weekly/items/2024-10-21T10:00:00Z.json",
                b"not json",
                store::ITEM_CONTENT_TYPE,
            )
            .await
            .unwrap();

        assert!(regenerate(&storage, &templates(), &extractor, "weekly")
            .await
            .is_err());
        assert_eq!(
            storage.get("weekly/feed.xml").await.unwrap().unwrap(),
            published
        );
    }
}
