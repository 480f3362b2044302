//! HTTP API.
//!
//! Exposes concept search, note synthesis, and PDF export as a JSON API for a
//! browser front end or scripts.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/search` | Chapters mentioning a concept |
//! | `POST` | `/notes` | Synthesized note for a concept |
//! | `POST` | `/render` | Note text → PDF download |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `notes_disabled` (503),
//! `collaborator_error` (502), `render_error` (500), `internal` (500).
//!
//! The corpus is read again on every request and no state survives between
//! requests. `/search` and `/notes` take an optional `corpus` field with
//! uploaded text, which replaces the bundled corpus for that request. The API
//! key for `/notes` travels with the request too.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::corpus::CorpusSource;
use crate::error::{NotesError, SearchError};
use crate::models::SearchResult;
use crate::notes;
use crate::render;
use crate::search::{self, SearchOptions};

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Build the router. Split from [`run_server`] so tests can drive it
/// without binding a socket.
pub fn router(config: Arc<Config>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/search", post(handle_search))
        .route("/notes", post(handle_notes))
        .route("/render", post(handle_render))
        .layer(cors)
        .with_state(AppState { config })
}

/// Starts the HTTP server on `[server].bind`. Runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(Arc::new(config.clone()));

    println!("polity server listening on http://{}", bind_addr);
    tracing::info!(bind = %bind_addr, corpus = %config.corpus.path.display(), "server started");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        bad_request(err.to_string())
    }
}

impl From<NotesError> for AppError {
    fn from(err: NotesError) -> Self {
        match err {
            NotesError::MissingApiKey(_) => bad_request(err.to_string()),
            NotesError::Disabled => AppError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "notes_disabled",
                message: err.to_string(),
            },
            NotesError::NoContext => not_found(err.to_string()),
            _ => AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "collaborator_error",
                message: err.to_string(),
            },
        }
    }
}

/// Search the uploaded corpus, or the bundled one when nothing was uploaded.
/// A blank query is a 400.
async fn search_corpus(
    config: &Config,
    query: &str,
    upload: Option<String>,
    max_results: Option<usize>,
) -> Result<Vec<SearchResult>, AppError> {
    // Validate before touching the corpus so a blank query never costs a read.
    if query.trim().is_empty() {
        return Err(SearchError::EmptyQuery.into());
    }
    let document = CorpusSource::select_inline(upload, config.corpus.path.clone())
        .load_async()
        .await
        .map_err(|e| internal(format!("{:#}", e)))?;
    let options = SearchOptions {
        max_results: max_results.or(config.search.max_results),
    };
    Ok(search::search_concepts(&document, query, &options)?)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
    /// Uploaded corpus text.
    #[serde(default)]
    corpus: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    query: String,
    results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let results =
        search_corpus(&state.config, &req.query, req.corpus, req.max_results).await?;
    let message = results.is_empty().then(|| {
        format!(
            "No mentions found for '{}' in the current material.",
            req.query
        )
    });
    Ok(Json(SearchResponse {
        query: req.query,
        results,
        message,
    }))
}

// ============ POST /notes ============

#[derive(Deserialize)]
struct NotesRequest {
    query: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    corpus: Option<String>,
}

#[derive(Serialize)]
struct NotesResponse {
    query: String,
    notes: String,
    /// Titles of the chapters sent as context.
    chapters: Vec<String>,
}

async fn handle_notes(
    State(state): State<AppState>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<NotesResponse>, AppError> {
    let config = &state.config;
    let results = search_corpus(config, &req.query, req.corpus, None).await?;
    if results.is_empty() {
        return Err(not_found(format!(
            "No mentions found for '{}' in the current material.",
            req.query
        )));
    }

    let generator = notes::create_generator(&config.notes, req.api_key)?;
    let notes =
        notes::generate_notes(generator.as_ref(), &req.query, &results, &config.notes).await?;

    let chapters = results
        .into_iter()
        .take(config.notes.max_chapters)
        .map(|r| r.title)
        .collect();

    Ok(Json(NotesResponse {
        query: req.query,
        notes,
        chapters,
    }))
}

// ============ POST /render ============

#[derive(Deserialize)]
struct RenderRequest {
    text: String,
    #[serde(default)]
    title: String,
    /// Used for the download file name; falls back to the title.
    #[serde(default)]
    query: Option<String>,
}

async fn handle_render(
    State(state): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> Result<Response, AppError> {
    let bytes =
        render::render_document(&req.text, &req.title, &state.config.render).map_err(|e| {
            AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "render_error",
                message: e.to_string(),
            }
        })?;

    let name = render::artifact_name(req.query.as_deref().unwrap_or(&req.title));
    let disposition = format!("attachment; filename=\"{}\"", name);

    Ok((
        [
            (header::CONTENT_TYPE, render::PDF_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
