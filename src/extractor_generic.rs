//! Generic extraction strategy: subject, date, and the raw HTML body.
//!
//! This is the fallback for any feed without a registered strategy. The
//! message's HTML part is stored as-is; the feed template embeds it as the
//! item description.

use async_trait::async_trait;
use mailparse::ParsedMail;

use crate::error::Error;
use crate::extractor::{common_fields, Extractor};
use crate::models::{GenericItem, Item};

pub struct GenericExtractor {
    name: String,
}

impl GenericExtractor {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

#[async_trait]
impl Extractor for GenericExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn template(&self) -> &str {
        "generic.xml.tmpl"
    }

    async fn from_message(&self, mail: &ParsedMail<'_>) -> Result<Item, Error> {
        let fields = common_fields(mail)?;
        Ok(Item::Generic(GenericItem {
            uuid: fields.uuid,
            subject: fields.subject,
            date: fields.date,
            body: fields.body,
        }))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Item, Error> {
        Ok(Item::Generic(serde_json::from_slice(bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> GenericExtractor {
        GenericExtractor::new("weekly-links".to_string())
    }

    #[tokio::test]
    async fn extracts_shared_fields_from_a_multipart_message() {
        let raw = "Date: Mon, 21 Oct 2024 12:45:12 +0000\r\n\
             Subject: =?utf-8?q?Weekly_links_=2343?=\r\n\
             X-Apple-UUID: 4489904c-91ae-4fbf-b4e7-915007267da1\r\n\
             Content-Type: multipart/alternative; boundary=\"b\"\r\n\
             \r\n\
             --b\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             plain\r\n\
             --b\r\n\
             Content-Type: text/html\r\n\
             \r\n\
             <p>some links</p>\r\n\
             --b--\r\n";
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        let item = extractor().from_message(&mail).await.unwrap();
        let Item::Generic(item) = item else {
            panic!("generic strategy must produce generic items");
        };
        assert_eq!(item.uuid, "4489904c-91ae-4fbf-b4e7-915007267da1");
        assert_eq!(item.subject, "Weekly links #43");
        assert_eq!(item.body, "<p>some links</p>");
        assert_eq!(
            crate::models::item_key(item.date),
            "2024-10-21T12:45:12Z"
        );
    }

    #[tokio::test]
    async fn missing_identity_header_is_not_an_error() {
        let raw = "Date: Mon, 21 Oct 2024 12:45:12 +0000\r\n\
             Subject: plain\r\n\
             Content-Type: multipart/mixed; boundary=\"b\"\r\n\
             \r\n\
             --b\r\n\
             Content-Type: text/html\r\n\
             \r\n\
             <p>x</p>\r\n\
             --b--\r\n";
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        let item = extractor().from_message(&mail).await.unwrap();
        assert_eq!(item.uuid(), "");
    }

    #[tokio::test]
    async fn non_multipart_message_is_rejected() {
        let raw = "Date: Mon, 21 Oct 2024 12:45:12 +0000\r\n\
             Content-Type: text/html\r\n\
             \r\n\
             <p>x</p>\r\n";
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        assert!(matches!(
            extractor().from_message(&mail).await,
            Err(Error::NotMultipart(_))
        ));
    }

    #[test]
    fn decode_round_trips_the_persisted_record() {
        let record = br#"{"uuid":"u","subject":"s","date":"2024-10-21T12:45:12Z","body":"<p>b</p>"}"#;
        let item = extractor().decode(record).unwrap();
        assert_eq!(item.subject(), "s");
        assert_eq!(item.key(), "2024-10-21T12:45:12Z");
    }
}
