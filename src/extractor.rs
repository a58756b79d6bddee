//! Extraction strategy seam and the per-feed registry.
//!
//! Each feed is served by one [`Extractor`]: it turns an inbound message
//! into a typed [`Item`], decodes persisted records back, and names the
//! template its feed renders through. The [`Registry`] binds feed names to
//! strategies at startup from the `[feeds]` configuration table; any feed
//! name it does not know falls back to the generic strategy parameterized
//! by that name, so unknown feeds work out of the box.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};

use crate::config::Config;
use crate::error::Error;
use crate::extractor_generic::GenericExtractor;
use crate::extractor_podcast::PodcastExtractor;
use crate::models::Item;
use crate::{mime, rfc2047};

/// Header stamped by the mail forwarder on every message it relays; copied
/// through to items verbatim for traceability, never generated here.
pub const IDENTITY_HEADER: &str = "X-Apple-UUID";

/// One extraction strategy: parses inbound messages into typed items and
/// decodes the persisted form back.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// The feed name this instance serves.
    fn name(&self) -> &str;

    /// Template file the feed document is rendered through.
    fn template(&self) -> &str;

    /// Parse an inbound message into an item. May perform network I/O
    /// (enrichment lookups).
    async fn from_message(&self, mail: &ParsedMail<'_>) -> Result<Item, Error>;

    /// Decode an item from its persisted record bytes.
    fn decode(&self, bytes: &[u8]) -> Result<Item, Error>;
}

/// The fields every strategy extracts before doing anything of its own.
pub(crate) struct MessageFields {
    pub uuid: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub body: String,
}

/// Shared extraction steps: Date, decoded Subject, the HTML part, and the
/// forwarder identity header.
pub(crate) fn common_fields(mail: &ParsedMail<'_>) -> Result<MessageFields, Error> {
    let date = message_date(mail)?;

    let subject = match mail.headers.get_first_header("Subject") {
        Some(header) => rfc2047::decode_header(&rfc2047::unfold(header.get_value_raw()))?,
        None => String::new(),
    };

    let html = mime::locate(mail, "text/html")?;
    let body = String::from_utf8_lossy(&html).into_owned();

    let uuid = mail
        .headers
        .get_first_value(IDENTITY_HEADER)
        .unwrap_or_default();

    Ok(MessageFields {
        uuid,
        subject,
        date,
        body,
    })
}

/// Parse the required `Date` header, normalized to UTC.
pub fn message_date(mail: &ParsedMail<'_>) -> Result<DateTime<Utc>, Error> {
    let raw = mail
        .headers
        .get_first_value("Date")
        .ok_or(Error::MissingDate)?;
    let epoch = mailparse::dateparse(&raw).map_err(|_| Error::MissingDate)?;
    DateTime::from_timestamp(epoch, 0).ok_or(Error::MissingDate)
}

/// Maps feed names to extraction strategies.
pub struct Registry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl Registry {
    /// Build the registry from the `[feeds]` configuration table.
    pub fn from_config(config: &Config) -> Self {
        let mut extractors: HashMap<String, Arc<dyn Extractor>> = HashMap::new();
        for name in &config.feeds.podcast {
            extractors.insert(name.clone(), Arc::new(PodcastExtractor::new(name.clone())));
        }
        Self { extractors }
    }

    /// Resolve the strategy for a feed; unregistered names get a generic
    /// extractor named after the feed.
    pub fn get(&self, feed: &str) -> Arc<dyn Extractor> {
        match self.extractors.get(feed) {
            Some(extractor) => Arc::clone(extractor),
            None => Arc::new(GenericExtractor::new(feed.to_string())),
        }
    }
}
