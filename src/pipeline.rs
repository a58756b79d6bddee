//! Ingestion orchestration: the surface the HTTP layer and the CLI call
//! into.
//!
//! One [`Pipeline`] owns the storage backend, the template environment, and
//! the extractor registry for the lifetime of the process. Requests are
//! handled independently — there is no coordination between concurrent
//! ingests for the same feed. Item records are keyed by their own
//! Date-derived timestamp so concurrent writes never lose records, but two
//! racing regenerations may each publish from their own snapshot and the
//! last one wins. The published document is always some consistent full
//! listing, never a partial one.

use std::sync::Arc;

use anyhow::Result;
use tera::Tera;
use tracing::info;

use crate::config::Config;
use crate::error::Error;
use crate::extractor::{self, Registry};
use crate::models::{item_key, Item};
use crate::storage::{self, Storage};
use crate::{feed, render, store};

pub struct Pipeline {
    storage: Arc<dyn Storage>,
    templates: Tera,
    registry: Registry,
}

impl Pipeline {
    /// Build the pipeline from configuration: storage backend, template
    /// environment, and the extractor registry.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            storage: storage::from_config(config)?,
            templates: render::load_templates(&config.templates.path)?,
            registry: Registry::from_config(config),
        })
    }

    /// Ingest one raw RFC-5322 message into `feed` and republish the feed
    /// document. Returns the extracted item.
    pub async fn ingest(
        &self,
        feed_name: &str,
        raw: &[u8],
        allow_overwrite: bool,
    ) -> Result<Item, Error> {
        let extractor = self.registry.get(feed_name);

        let mail =
            mailparse::parse_mail(raw).map_err(|e| Error::MalformedHeader(e.to_string()))?;

        // The storage key is needed before extraction runs, so the Date
        // header is parsed twice on purpose (here and in the strategy).
        let key = item_key(extractor::message_date(&mail)?);
        let record_key = store::item_record_key(feed_name, &key);

        if !allow_overwrite
            && self
                .storage
                .exists(&record_key)
                .await
                .map_err(Error::StoreRead)?
        {
            return Err(Error::DuplicateItem {
                feed: feed_name.to_string(),
                key,
            });
        }

        let item = extractor.from_message(&mail).await?;
        store::put_item(self.storage.as_ref(), feed_name, &item).await?;
        feed::regenerate(
            self.storage.as_ref(),
            &self.templates,
            extractor.as_ref(),
            feed_name,
        )
        .await?;

        info!(
            feed = feed_name,
            key = %item.key(),
            subject = %item.subject(),
            "ingested item"
        );
        Ok(item)
    }

    /// Regenerate the feed document without ingesting anything.
    pub async fn regenerate(&self, feed_name: &str) -> Result<(), Error> {
        let extractor = self.registry.get(feed_name);
        feed::regenerate(
            self.storage.as_ref(),
            &self.templates,
            extractor.as_ref(),
            feed_name,
        )
        .await
    }

    /// The published feed document.
    pub async fn feed_bytes(&self, feed_name: &str) -> Result<Vec<u8>, Error> {
        self.storage
            .get(&store::feed_document_key(feed_name))
            .await
            .map_err(Error::StoreRead)?
            .ok_or_else(|| Error::FeedNotFound(feed_name.to_string()))
    }

    /// One item record: the decoded item plus its raw persisted bytes.
    pub async fn item_bytes(&self, feed_name: &str, key: &str) -> Result<(Item, Vec<u8>), Error> {
        let extractor = self.registry.get(feed_name);
        let bytes = self
            .storage
            .get(&store::item_record_key(feed_name, key))
            .await
            .map_err(Error::StoreRead)?
            .ok_or_else(|| Error::ItemNotFound {
                feed: feed_name.to_string(),
                key: key.to_string(),
            })?;
        let item = extractor.decode(&bytes)?;
        Ok((item, bytes))
    }
}
