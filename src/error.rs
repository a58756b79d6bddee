//! Pipeline error taxonomy.
//!
//! Every failure mode of the ingestion and synthesis pipeline is a variant
//! here. The HTTP layer maps variants to status codes through
//! [`Error::class`]; nothing in the pipeline retries — failures surface
//! synchronously to the caller of the orchestration entry points, with
//! enough context to tell input-caused from dependency-caused failures.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors produced by the ingestion and feed synthesis pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The message (or one of its part headers) could not be parsed.
    #[error("parse message: {0}")]
    MalformedHeader(String),

    /// The top-level media type is not a `multipart/*` kind.
    #[error("expected multipart message but found {0}")]
    NotMultipart(String),

    /// No part of the wanted media type exists in the message.
    #[error("no {0} part in message")]
    PartNotFound(String),

    /// The `Date` header is absent or unparsable.
    #[error("message has no parsable Date header")]
    MissingDate,

    /// The `Subject` header carries an encoded word that cannot be decoded.
    #[error("decode subject: {0}")]
    MalformedSubject(String),

    /// The located body part could not be decoded.
    #[error("read message body: {0}")]
    BodyRead(String),

    /// The audio size lookup failed or returned no usable length.
    #[error("fetch size of audio at {url}: {reason}")]
    AudioSizeUnavailable { url: String, reason: String },

    /// An item already exists for this feed and timestamp. Callers can
    /// retry with the overwrite option to replace it.
    #[error("an item already exists for feed {feed} at {key}")]
    DuplicateItem { feed: String, key: String },

    /// The feed document has not been generated yet.
    #[error("no feed document for {0}")]
    FeedNotFound(String),

    /// No item record exists at the requested key.
    #[error("no item {key} in feed {feed}")]
    ItemNotFound { feed: String, key: String },

    /// Reading from the storage backend failed.
    #[error("storage read: {0}")]
    StoreRead(#[source] StorageError),

    /// Writing to the storage backend failed.
    #[error("storage write: {0}")]
    StoreWrite(#[source] StorageError),

    /// An item record could not be encoded or decoded.
    #[error("item record: {0}")]
    ItemRecord(#[from] serde_json::Error),

    /// Feed template rendering failed.
    #[error("render feed template: {0}")]
    Render(#[from] tera::Error),
}

/// Coarse classification used by the HTTP layer for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    /// The inbound message is malformed (HTTP 400).
    Input,
    /// A write conflicted with an existing record (HTTP 409).
    Conflict,
    /// An external resource the pipeline depends on failed (HTTP 502).
    Dependency,
    /// The requested artifact does not exist (HTTP 404).
    NotFound,
    /// Storage or rendering failed on our side (HTTP 500).
    Server,
}

impl Error {
    /// Classify this error for status mapping and logging.
    pub fn class(&self) -> Class {
        match self {
            Error::MalformedHeader(_)
            | Error::NotMultipart(_)
            | Error::PartNotFound(_)
            | Error::MissingDate
            | Error::MalformedSubject(_)
            | Error::BodyRead(_) => Class::Input,
            Error::DuplicateItem { .. } => Class::Conflict,
            Error::AudioSizeUnavailable { .. } => Class::Dependency,
            Error::FeedNotFound(_) | Error::ItemNotFound { .. } => Class::NotFound,
            Error::StoreRead(_)
            | Error::StoreWrite(_)
            | Error::ItemRecord(_)
            | Error::Render(_) => Class::Server,
        }
    }

    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::MalformedHeader(_) => "malformed_header",
            Error::NotMultipart(_) => "not_multipart",
            Error::PartNotFound(_) => "part_not_found",
            Error::MissingDate => "missing_date",
            Error::MalformedSubject(_) => "malformed_subject",
            Error::BodyRead(_) => "body_read",
            Error::AudioSizeUnavailable { .. } => "audio_size_unavailable",
            Error::DuplicateItem { .. } => "duplicate_item",
            Error::FeedNotFound(_) | Error::ItemNotFound { .. } => "not_found",
            Error::StoreRead(_) => "store_read",
            Error::StoreWrite(_) => "store_write",
            Error::ItemRecord(_) => "item_record",
            Error::Render(_) => "render",
        }
    }
}
