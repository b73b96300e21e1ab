//! HTTP server for the document library.
//!
//! Exposes the write/list/read entry points consumed by the browsing UI,
//! plus the blob fetch route that serves stored PDFs and a chat endpoint
//! backed by the configured model provider.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Embedded browsing UI |
//! | `POST` | `/api/write` | Ingest a PDF (`folder`/`filename` headers, raw bytes body) |
//! | `GET`  | `/api/list` | Folder tree as JSON |
//! | `POST` | `/api/read` | One variant's text (form-encoded `folder`, `filename`, `length`) |
//! | `POST` | `/api/chat` | Plain-text chat completion |
//! | `GET`  | `/upload/{filename}` | Stored PDF bytes |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! API error responses carry a JSON body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "missing required field(s): folder" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `summarization_failed` (500), `storage_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based clients.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::blob::{blob_key, create_blob_store, BlobStore};
use crate::config::Config;
use crate::db;
use crate::error::LibraryError;
use crate::get::get_variant;
use crate::ingest::ingest_document;
use crate::list::list_folders;
use crate::models::{FolderListing, Variant};
use crate::summarize::{create_summarizer, Summarizer};

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor. All handles are injected here once at startup.
#[derive(Clone)]
struct AppState {
    pool: SqlitePool,
    blobs: Arc<dyn BlobStore>,
    summarizer: Arc<dyn Summarizer>,
    replace_duplicates: bool,
}

/// Starts the library HTTP server.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated. The database must have been initialized with
/// `shelf init` first.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(&config.db.path).await?;
    let blobs: Arc<dyn BlobStore> = Arc::from(create_blob_store(&config.blobs)?);
    let summarizer: Arc<dyn Summarizer> = Arc::from(create_summarizer(&config.summarizer)?);

    info!(
        provider = summarizer.model_name(),
        blobs = %config.blobs.backend,
        "starting library server"
    );

    let state = AppState {
        pool,
        blobs,
        summarizer,
        replace_duplicates: config.ingest.replaces_duplicates(),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_index))
        .route("/api/write", post(handle_write))
        .route("/api/list", get(handle_list))
        .route("/api/read", post(handle_read))
        .route("/api/chat", post(handle_chat))
        .route("/upload/{filename}", get(handle_blob_fetch))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("Library server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable
/// message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(code = %self.code, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::Validation(_) => bad_request(err.to_string()),
            LibraryError::NotFound(_) => not_found(err.to_string()),
            LibraryError::Summarization(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "summarization_failed".to_string(),
                message: err.to_string(),
            },
            LibraryError::Storage(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "storage_error".to_string(),
                message: err.to_string(),
            },
        }
    }
}

// ============ GET / ============

/// Handler for `GET /` — the embedded browsing UI.
async fn handle_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/write ============

/// Handler for `POST /api/write`.
///
/// `folder` and `filename` arrive as headers, the PDF bytes as the raw
/// request body. Missing values are reported by the pipeline's
/// validation step, which names every absent field.
async fn handle_write(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, AppError> {
    let folder = header_value(&headers, "folder");
    let filename = header_value(&headers, "filename");

    let confirmation = ingest_document(
        &state.pool,
        state.blobs.as_ref(),
        state.summarizer.as_ref(),
        state.replace_duplicates,
        &folder,
        &filename,
        &body,
    )
    .await?;

    Ok(format!(
        "Successfully stored {} in folder {}",
        confirmation.filename, confirmation.folder
    ))
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

// ============ GET /api/list ============

/// Handler for `GET /api/list`.
async fn handle_list(State(state): State<AppState>) -> Result<Json<Vec<FolderListing>>, AppError> {
    let listings = list_folders(&state.pool).await?;
    Ok(Json(listings))
}

// ============ POST /api/read ============

/// Form body for `POST /api/read`. `length` is one of the four
/// human-readable labels (`"Full Text"`, `"Half Text"`, `"Small Text"`,
/// `"Bullets"`).
#[derive(Deserialize)]
struct ReadRequest {
    folder: String,
    filename: String,
    length: String,
}

/// JSON response body for `POST /api/read`.
#[derive(Serialize)]
struct ReadResponse {
    text: String,
}

/// Handler for `POST /api/read`.
async fn handle_read(
    State(state): State<AppState>,
    Form(request): Form<ReadRequest>,
) -> Result<Json<ReadResponse>, AppError> {
    let variant = Variant::from_label(&request.length)
        .ok_or_else(|| bad_request(format!("unknown length label: '{}'", request.length)))?;

    let text = get_variant(&state.pool, &request.folder, &request.filename, variant).await?;
    Ok(Json(ReadResponse { text }))
}

// ============ POST /api/chat ============

/// Handler for `POST /api/chat`.
///
/// Plain-text prompt in, plain-text completion out. Fails with 500 when
/// the passthrough provider is configured.
async fn handle_chat(State(state): State<AppState>, body: String) -> Result<String, AppError> {
    if body.trim().is_empty() {
        return Err(bad_request("chat prompt must not be empty"));
    }
    Ok(state.summarizer.complete(&body).await?)
}

// ============ GET /upload/{filename} ============

/// Handler for `GET /upload/{filename}`.
///
/// Serves the stored PDF bytes for a document. The path mirrors the blob
/// key, so the `fullText` reference stored in summarization mode can be
/// used directly as a link.
async fn handle_blob_fetch(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let key = blob_key(&filename);
    match state.blobs.get(&key).await? {
        Some(bytes) => {
            Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes).into_response())
        }
        None => Err(not_found(format!("no stored document for key '{}'", key))),
    }
}
