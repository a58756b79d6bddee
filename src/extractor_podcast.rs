//! Podcast extraction strategy for the journal-club newsletter.
//!
//! On top of the shared fields, this strategy scrapes episode metadata out
//! of the newsletter HTML with fixed pattern rules — the audio enclosure,
//! the cover image, the opening sentence, and the paper link — and then
//! fetches the audio's byte size with a HEAD request, since RSS enclosures
//! require a length the newsletter never states.
//!
//! Every pattern is optional: a message without a match simply stores an
//! empty field. The size lookup is not: once an episode link exists, a feed
//! entry without a playable enclosure would be broken, so an unreachable or
//! size-less audio host fails the whole ingestion.

use async_trait::async_trait;
use lazy_static::lazy_static;
use mailparse::ParsedMail;
use regex::Regex;

use crate::error::Error;
use crate::extractor::{common_fields, Extractor};
use crate::models::{Item, PodcastItem};

lazy_static! {
    static ref AUDIO: Regex = Regex::new(r#""(https?://[^ ]+\.mp3)""#).unwrap();
    static ref IMAGE: Regex = Regex::new(r#"<img src="(https?://[^ ]*)""#).unwrap();
    static ref DESCRIPTION: Regex = Regex::new(r"Hi +Connor, (.*)</p>").unwrap();
    static ref PAPER: Regex =
        Regex::new(r#"<a [^>]*href="(https?://(\w+\.)?doi\.org[^"]*)"[^>]*>"#).unwrap();
}

/// Fields scraped from the newsletter HTML; all optional.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Scraped {
    pub audio_url: String,
    pub image_url: String,
    pub description: String,
    pub paper_url: String,
}

/// Run the four pattern rules over the HTML body. Absent matches leave
/// fields empty; nothing here fails.
pub(crate) fn scrape(body: &str) -> Scraped {
    let capture = |pattern: &Regex| {
        pattern
            .captures(body)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    };

    let description = capture(&DESCRIPTION);
    Scraped {
        audio_url: capture(&AUDIO),
        image_url: capture(&IMAGE),
        description: capitalize(description.trim()),
        paper_url: capture(&PAPER),
    }
}

/// Upper-case the first character only; the rest of the sentence is kept
/// exactly as written.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub struct PodcastExtractor {
    name: String,
    client: reqwest::Client,
}

impl PodcastExtractor {
    pub fn new(name: String) -> Self {
        Self {
            name,
            client: reqwest::Client::new(),
        }
    }

    /// HEAD the audio URL and parse the declared content length.
    async fn audio_size(&self, url: &str) -> Result<u64, Error> {
        let unavailable = |reason: String| Error::AudioSizeUnavailable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .ok_or_else(|| unavailable("no Content-Length header".to_string()))?;

        length
            .to_str()
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| unavailable("non-numeric Content-Length".to_string()))
    }
}

#[async_trait]
impl Extractor for PodcastExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn template(&self) -> &str {
        "podcast.xml.tmpl"
    }

    async fn from_message(&self, mail: &ParsedMail<'_>) -> Result<Item, Error> {
        let fields = common_fields(mail)?;
        let scraped = scrape(&fields.body);

        let audio_size = if scraped.audio_url.is_empty() {
            0
        } else {
            self.audio_size(&scraped.audio_url).await?
        };

        Ok(Item::Podcast(PodcastItem {
            uuid: fields.uuid,
            subject: fields.subject,
            description: scraped.description,
            date: fields.date,
            image_url: scraped.image_url,
            audio_url: scraped.audio_url,
            audio_size,
            paper_url: scraped.paper_url,
        }))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Item, Error> {
        Ok(Item::Podcast(serde_json::from_slice(bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::mime;

    const NEWSLETTER_EML: &str = include_str!("../testdata/journalclub.eml");

    /// A newsletter message whose audio link points at `audio_url`.
    fn newsletter_with_audio(audio_url: &str) -> String {
        format!(
            "Date: Mon, 21 Oct 2024 12:45:12 +0000\r\n\
             Subject: =?utf-8?q?A_Scalable_Real-Time_Framework?=\r\n\
             X-Apple-UUID: 4489904c-91ae-4fbf-b4e7-915007267da1\r\n\
             Content-Type: multipart/alternative; boundary=\"b\"\r\n\
             \r\n\
             --b\r\n\
             Content-Type: text/html\r\n\
             \r\n\
             <html><body>\r\n\
             <p>Hi Connor, today's paper argues for timeliness guarantees.</p>\r\n\
             <img src=\"https://embed.example-cdn.com/e/cover\" alt=\"episode cover\">\r\n\
             <a href=\"{audio_url}\">Listen to the episode</a>\r\n\
             <a target=\"_blank\" href=\"https://doi.org/10.1109/OJIES.2024.3373232\">Read the paper</a>\r\n\
             </body></html>\r\n\
             --b--\r\n"
        )
    }

    #[test]
    fn scrape_finds_all_four_fields() {
        let mail = mailparse::parse_mail(NEWSLETTER_EML.as_bytes()).unwrap();
        let body = String::from_utf8(mime::locate(&mail, "text/html").unwrap()).unwrap();

        let scraped = scrape(&body);
        assert_eq!(
            scraped.audio_url,
            "https://s3.amazonaws.com/journalclub.io/mqtt-full.mp3"
        );
        assert_eq!(
            scraped.image_url,
            "https://embed.filekitcdn.com/e/3Uk7tL4uX5yjQZM3sj7FA5/gyTk6Miin8sMsEFuV8waDs"
        );
        assert_eq!(
            scraped.paper_url,
            "https://doi.org/10.1109/OJIES.2024.3373232"
        );
        assert!(scraped.description.starts_with("Today's article comes from"));
    }

    #[test]
    fn scrape_on_unrelated_html_finds_nothing() {
        assert_eq!(scrape("<p>just some page</p>"), Scraped::default());
    }

    #[test]
    fn description_capitalizes_only_the_first_character() {
        let scraped = scrape("<p>Hi Connor, hello world</p>");
        assert_eq!(scraped.description, "Hello world");

        let scraped = scrape("<p>Hi   Connor,  spaced  out </p>");
        assert_eq!(scraped.description, "Spaced  out");
    }

    #[tokio::test]
    async fn extraction_is_idempotent_under_a_fixed_head_response() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/episode.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let raw = newsletter_with_audio(&format!("{}/episode.mp3", server.uri()));
        let extractor = PodcastExtractor::new("journalclub".to_string());

        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();
        let first = extractor.from_message(&mail).await.unwrap();
        let second = extractor.from_message(&mail).await.unwrap();
        assert_eq!(first, second);

        let Item::Podcast(item) = first else {
            panic!("podcast strategy must produce podcast items");
        };
        assert_eq!(item.audio_size, 64);
        assert_eq!(item.uuid, "4489904c-91ae-4fbf-b4e7-915007267da1");
        assert_eq!(item.subject, "A Scalable Real-Time Framework");
        assert_eq!(
            item.description,
            "Today's paper argues for timeliness guarantees."
        );
        assert_eq!(item.paper_url, "https://doi.org/10.1109/OJIES.2024.3373232");
        assert_eq!(item.image_url, "https://embed.example-cdn.com/e/cover");
    }

    #[tokio::test]
    async fn missing_audio_link_skips_enrichment() {
        let raw = "Date: Mon, 21 Oct 2024 12:45:12 +0000\r\n\
             Subject: No episode this week\r\n\
             Content-Type: multipart/mixed; boundary=\"b\"\r\n\
             \r\n\
             --b\r\n\
             Content-Type: text/html\r\n\
             \r\n\
             <p>Hi Connor, no episode this week</p>\r\n\
             --b--\r\n";
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        let extractor = PodcastExtractor::new("journalclub".to_string());
        let Item::Podcast(item) = extractor.from_message(&mail).await.unwrap() else {
            panic!("podcast strategy must produce podcast items");
        };
        assert_eq!(item.audio_url, "");
        assert_eq!(item.audio_size, 0);
        assert_eq!(item.description, "No episode this week");
    }

    #[tokio::test]
    async fn unreachable_audio_host_fails_ingestion() {
        // Nothing listens on port 9; the HEAD request itself must error.
        let raw = newsletter_with_audio("http://127.0.0.1:9/episode.mp3");
        let mail = mailparse::parse_mail(raw.as_bytes()).unwrap();

        let extractor = PodcastExtractor::new("journalclub".to_string());
        assert!(matches!(
            extractor.from_message(&mail).await,
            Err(Error::AudioSizeUnavailable { .. })
        ));
    }

    #[test]
    fn decode_round_trips_the_persisted_record() {
        let record = br#"{"uuid":"u","subject":"s","description":"d","date":"2024-10-21T12:45:12Z","imageURL":"","audioURL":"https://h/e.mp3","audioSize":7,"paperURL":""}"#;
        let extractor = PodcastExtractor::new("journalclub".to_string());
        let item = extractor.decode(record).unwrap();
        assert_eq!(item.key(), "2024-10-21T12:45:12Z");
    }
}
