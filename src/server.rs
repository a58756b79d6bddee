//! HTTP surface.
//!
//! The mail forwarder POSTs raw messages; feed readers GET the rendered
//! document. Routing stays thin — every handler delegates to the
//! [`Pipeline`] and maps its typed errors onto status codes.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/feeds/{feed}/email` | Ingest a raw RFC-5322 message (`?overwrite=true` replaces a colliding item) |
//! | `POST` | `/feeds/{feed}/refresh` | Regenerate the feed document |
//! | `GET`  | `/feeds/{feed}` | The rendered feed document |
//! | `GET`  | `/feeds/{feed}/items/{key}` | One item record |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one JSON schema:
//!
//! ```json
//! { "error": { "code": "duplicate_item", "message": "an item already exists ..." } }
//! ```
//!
//! Input errors map to 400, duplicate items to 409, enrichment dependency
//! failures to 502, unknown artifacts to 404, and storage/render failures
//! to 500.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{Class, Error};
use crate::feed::FEED_CONTENT_TYPE;
use crate::models::Item;
use crate::pipeline::Pipeline;
use crate::store::ITEM_CONTENT_TYPE;

/// Run the HTTP server until the process is terminated.
pub async fn run_server(bind: &str, pipeline: Arc<Pipeline>) -> anyhow::Result<()> {
    let app = router(pipeline);
    tracing::info!(bind, "mailfeed listening");

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the application router (separated from [`run_server`] so tests can
/// drive it without binding a socket).
pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/feeds/{feed}", get(handle_get_feed))
        .route("/feeds/{feed}/items/{key}", get(handle_get_item))
        .route("/feeds/{feed}/email", post(handle_add_email))
        .route("/feeds/{feed}/refresh", post(handle_refresh))
        .route("/health", get(handle_health))
        .with_state(pipeline)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g. `"duplicate_item"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Pipeline error wrapper that converts into an HTTP response.
struct AppError(Error);

impl From<Error> for AppError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.class() {
            Class::Input => StatusCode::BAD_REQUEST,
            Class::Conflict => StatusCode::CONFLICT,
            Class::Dependency => StatusCode::BAD_GATEWAY,
            Class::NotFound => StatusCode::NOT_FOUND,
            Class::Server => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.0.code().to_string(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// ============ POST /feeds/{feed}/email ============

#[derive(Deserialize)]
struct IngestQuery {
    /// Skip the duplicate-timestamp guard and replace the existing record.
    #[serde(default)]
    overwrite: bool,
}

/// Ingest one raw RFC-5322 message and return the extracted item.
async fn handle_add_email(
    State(pipeline): State<Arc<Pipeline>>,
    Path(feed): Path<String>,
    Query(query): Query<IngestQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let item = pipeline.ingest(&feed, &body, query.overwrite).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

// ============ POST /feeds/{feed}/refresh ============

async fn handle_refresh(
    State(pipeline): State<Arc<Pipeline>>,
    Path(feed): Path<String>,
) -> Result<StatusCode, AppError> {
    pipeline.regenerate(&feed).await?;
    Ok(StatusCode::OK)
}

// ============ GET /feeds/{feed} ============

async fn handle_get_feed(
    State(pipeline): State<Arc<Pipeline>>,
    Path(feed): Path<String>,
) -> Result<Response, AppError> {
    let bytes = pipeline.feed_bytes(&feed).await?;
    Ok((
        [
            (header::CONTENT_TYPE, FEED_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, "inline"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        bytes,
    )
        .into_response())
}

// ============ GET /feeds/{feed}/items/{key} ============

/// Serve one item record. Generic items carry the original message HTML and
/// are served as a page; structured items are served as their JSON record.
async fn handle_get_item(
    State(pipeline): State<Arc<Pipeline>>,
    Path((feed, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (item, bytes) = pipeline.item_bytes(&feed, &key).await?;

    let response = match item {
        Item::Generic(item) => (
            [
                (header::CONTENT_TYPE, "text/html;charset=UTF-8"),
                (header::CONTENT_DISPOSITION, "inline"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            item.body,
        )
            .into_response(),
        Item::Podcast(_) => (
            [
                (header::CONTENT_TYPE, ITEM_CONTENT_TYPE),
                (header::CONTENT_DISPOSITION, "inline"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            bytes,
        )
            .into_response(),
    };
    Ok(response)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
