//! HTTP server.
//!
//! Exposes search over the cached snapshot plus the administrative sync
//! trigger as a small JSON API, for chat bots and other front ends.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Status, version, page count, last sync time |
//! | `POST` | `/tools/search` | Ranked search: `{ "query": "...", "limit": 5 }` |
//! | `GET`  | `/pages` | List cached pages (no content) |
//! | `GET`  | `/pages/{id}` | One cached page with content |
//! | `POST` | `/sync` | Run a sync now and return the page count |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `remote_error` (502),
//! `internal` (500).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::SyncError;
use crate::models::Document;
use crate::scheduler::spawn_periodic_sync;
use crate::search::search;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    cache: SharedCache,
    max_results: usize,
}

/// Build the router. Separate from [`run_server`] so tests can serve it on
/// an ephemeral port.
pub fn router(cache: SharedCache, max_results: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools/search", post(handle_search))
        .route("/pages", get(handle_list_pages))
        .route("/pages/{id}", get(handle_get_page))
        .route("/sync", post(handle_sync))
        .layer(cors)
        .with_state(AppState { cache, max_results })
}

/// Serve until Ctrl-C. Starts the periodic sync when `[sync].interval_secs > 0`.
pub async fn run_server(config: &Config, cache: SharedCache) -> anyhow::Result<()> {
    let scheduler = config
        .sync
        .interval()
        .map(|every| spawn_periodic_sync(cache.clone(), every));

    let app = router(cache, config.search.max_results);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
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

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        if err.is_remote() {
            AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "remote_error",
                message: err.to_string(),
            }
        } else {
            AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message: err.to_string(),
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    pages: usize,
    last_synced_at: Option<DateTime<Utc>>,
    syncing: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.cache.get();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pages: snapshot.len(),
        last_synced_at: snapshot.last_synced_at,
        syncing: state.cache.is_syncing(),
    })
}

// ============ POST /tools/search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct SearchHit {
    id: String,
    title: String,
    url: String,
    score: u32,
    snippet: String,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let limit = req.limit.unwrap_or(state.max_results);
    if limit == 0 {
        return Err(bad_request("limit must be >= 1"));
    }

    let snapshot = state.cache.get();
    let results = search(&req.query, &snapshot.pages, limit)
        .into_iter()
        .map(|r| SearchHit {
            id: r.document.id.clone(),
            title: r.document.title.clone(),
            url: r.document.url.clone(),
            score: r.score,
            snippet: r.snippet,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}

// ============ GET /pages ============

#[derive(Serialize)]
struct PageSummary {
    id: String,
    title: String,
    url: String,
    last_edited_at: String,
}

#[derive(Serialize)]
struct PageListResponse {
    pages: Vec<PageSummary>,
    last_synced_at: Option<DateTime<Utc>>,
}

async fn handle_list_pages(State(state): State<AppState>) -> Json<PageListResponse> {
    let snapshot = state.cache.get();
    Json(PageListResponse {
        pages: snapshot
            .pages
            .iter()
            .map(|d| PageSummary {
                id: d.id.clone(),
                title: d.title.clone(),
                url: d.url.clone(),
                last_edited_at: d.last_edited_at.clone(),
            })
            .collect(),
        last_synced_at: snapshot.last_synced_at,
    })
}

// ============ GET /pages/{id} ============

async fn handle_get_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    let snapshot = state.cache.get();
    match snapshot.find(&id) {
        Some(doc) => Ok(Json(doc.clone())),
        None => Err(not_found(format!("page not found: {}", id))),
    }
}

// ============ POST /sync ============

#[derive(Serialize)]
struct SyncResponse {
    pages: usize,
}

async fn handle_sync(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    let pages = state.cache.synchronize().await?;
    Ok(Json(SyncResponse { pages }))
}
