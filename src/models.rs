//! Core item data model.
//!
//! Items are the persisted unit of feed content: one immutable JSON record
//! per ingested message, written once and only ever read back whole during
//! feed regeneration. The record's storage key is the RFC 3339 rendering of
//! the message's Date header, so two messages carrying the same Date collide
//! on the same slot — a deliberately low-cardinality key, guarded at
//! ingestion time rather than here.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An item extracted by the generic strategy: subject, date, and the raw
/// HTML body of the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericItem {
    /// Opaque identifier stamped by the mail forwarder; passed through
    /// verbatim, empty if the header was absent.
    pub uuid: String,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub body: String,
}

/// An item extracted by the podcast strategy: episode metadata scraped from
/// the newsletter HTML plus the fetched audio size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastItem {
    pub uuid: String,
    pub subject: String,
    /// First sentence of the newsletter, first letter capitalized. Empty
    /// when the greeting pattern found nothing.
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "imageURL")]
    pub image_url: String,
    #[serde(rename = "audioURL")]
    pub audio_url: String,
    /// Byte size of the audio enclosure, fetched from the audio host —
    /// never present in the message itself. Zero when there is no audio.
    #[serde(rename = "audioSize")]
    pub audio_size: u64,
    #[serde(rename = "paperURL")]
    pub paper_url: String,
}

/// A persisted feed item, tagged by the strategy that produced it.
///
/// Serialization is untagged: the persisted JSON is exactly the variant's
/// record, matching what the per-strategy decoders expect back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Podcast(PodcastItem),
    Generic(GenericItem),
}

impl Item {
    /// The storage key suffix and feed ordering key.
    pub fn key(&self) -> String {
        item_key(self.date())
    }

    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Item::Podcast(item) => item.date,
            Item::Generic(item) => item.date,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Item::Podcast(item) => &item.subject,
            Item::Generic(item) => &item.subject,
        }
    }

    pub fn uuid(&self) -> &str {
        match self {
            Item::Podcast(item) => &item.uuid,
            Item::Generic(item) => &item.uuid,
        }
    }
}

/// RFC 3339 rendering used for item keys: whole seconds, UTC, `Z` suffix.
///
/// Derived solely from the message's Date header, so equal instants always
/// land on the same storage slot regardless of the sender's timezone.
pub fn item_key(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 21, 12, 45, 12).unwrap()
    }

    #[test]
    fn item_key_is_rfc3339_utc() {
        assert_eq!(item_key(sample_date()), "2024-10-21T12:45:12Z");
    }

    #[test]
    fn generic_record_shape_is_stable() {
        let item = Item::Generic(GenericItem {
            uuid: "abc".into(),
            subject: "Hello".into(),
            date: sample_date(),
            body: "<p>hi</p>".into(),
        });

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "uuid": "abc",
                "subject": "Hello",
                "date": "2024-10-21T12:45:12Z",
                "body": "<p>hi</p>",
            })
        );
    }

    #[test]
    fn podcast_record_uses_camel_case_url_fields() {
        let item = Item::Podcast(PodcastItem {
            uuid: "abc".into(),
            subject: "Episode".into(),
            description: "A paper".into(),
            date: sample_date(),
            image_url: "https://cdn.example.org/cover.png".into(),
            audio_url: "https://cdn.example.org/ep.mp3".into(),
            audio_size: 18218972,
            paper_url: "https://doi.org/10.1109/X".into(),
        });

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["imageURL"], "https://cdn.example.org/cover.png");
        assert_eq!(json["audioURL"], "https://cdn.example.org/ep.mp3");
        assert_eq!(json["audioSize"], 18218972u64);
        assert_eq!(json["paperURL"], "https://doi.org/10.1109/X");

        let decoded: PodcastItem = serde_json::from_value(json).unwrap();
        assert_eq!(Item::Podcast(decoded), item);
    }
}
