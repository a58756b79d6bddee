//! # Mailfeed
//!
//! An email-to-RSS ingestion and feed synthesis service.
//!
//! A mail forwarder POSTs raw RFC-5322 messages; mailfeed locates the HTML
//! part, runs the feed's extraction strategy over it, persists the result
//! as an immutable JSON record in object storage, and republishes the
//! feed's RSS document from the full record set. Feed readers GET the
//! document back out.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────────┐
//! │ Forwarder │──▶│   Pipeline    │──▶│ Object store  │
//! │ (raw mail)│   │ locate/extract│   │ items + feed  │
//! └───────────┘   │ store/render  │   └──────┬────────┘
//!                 └──────────────┘          │
//!                     ▲                     ▼
//!                ┌──────────┐         ┌──────────┐
//!                │   CLI    │         │   HTTP   │
//!                │(mailfeedd)│        │ (feeds)  │
//!                └──────────┘         └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Item data model and key derivation |
//! | [`mime`] | MIME part location and transfer decoding |
//! | [`rfc2047`] | Encoded-word decoding for headers |
//! | [`extractor`] | Strategy seam and per-feed registry |
//! | [`extractor_generic`] | Subject/date/HTML-body strategy |
//! | [`extractor_podcast`] | Newsletter scraping + audio-size enrichment |
//! | [`store`] | Item record layout and enumeration |
//! | [`feed`] | Feed document synthesis |
//! | [`render`] | Template environment |
//! | [`pipeline`] | Ingestion orchestration |
//! | [`storage`] | Object storage seam |
//! | [`storage_fs`] | Filesystem backend (atomic publish) |
//! | [`storage_mem`] | In-memory backend |
//! | [`storage_s3`] | S3-compatible backend (SigV4) |
//! | [`server`] | HTTP surface |

pub mod config;
pub mod error;
pub mod extractor;
pub mod extractor_generic;
pub mod extractor_podcast;
pub mod feed;
pub mod mime;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod rfc2047;
pub mod server;
pub mod storage;
pub mod storage_fs;
pub mod storage_mem;
pub mod storage_s3;
pub mod store;
