//! HTTP routes and handlers
//!
//! Catalog routes sit behind [`require_loaded`], which consults the status
//! register on every request: while a run is in flight the caller is sent to
//! `/loading`, after a failed run the route answers 503.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::HeaderName, HeaderValue, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogCounts;
use crate::ingest::Status;
use crate::models::{Artist, ArtistDetails};
use crate::utils::error::CatalogError;

use super::AppState;

/// Body served for every catalog route while the last run has failed
pub const UNAVAILABLE_MESSAGE: &str = "service temporarily unavailable, retrying";

const REFRESH: HeaderName = HeaderName::from_static("refresh");

// ============================================================================
// API Response Types
// ============================================================================

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<String>,
}

/// Readiness and record counts
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: Status,
    #[serde(flatten)]
    pub counts: CatalogCounts,
    pub last_refresh: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct LoadingQuery {
    pub requested: Option<String>,
}

/// Handler failures mapped onto status codes
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Unavailable,
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self::NotFound(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message))).into_response()
            }
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(UNAVAILABLE_MESSAGE)),
            )
                .into_response(),
        }
    }
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let catalog = Router::new()
        .route("/", get(list_artists))
        .route("/artist/{id}", get(artist_details))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_loaded));

    Router::new()
        .merge(catalog)
        .route("/loading", get(loading))
        .route("/status", get(status))
        .route("/refresh", post(refresh))
        .fallback(not_found)
        .with_state(state)
}

/// Let a request through only while the catalog is Loaded
pub async fn require_loaded(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.status.status() {
        Status::Loaded => next.run(request).await,
        Status::Loading => {
            let requested = request
                .uri()
                .path_and_query()
                .map_or("/", |pq| pq.as_str());
            Redirect::to(&loading_location(requested)).into_response()
        }
        Status::Failed => ApiError::Unavailable.into_response(),
    }
}

/// `/loading` URL that sends the caller back to `requested` once ready
pub fn loading_location(requested: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(requested.as_bytes()).collect();
    format!("/loading?requested={encoded}")
}

/// Local path to return to; anything that could leave the site becomes "/"
pub fn redirect_target(requested: Option<&str>) -> &str {
    match requested {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && path.chars().all(|c| c.is_ascii_graphic()) =>
        {
            path
        }
        _ => "/",
    }
}

// ============================================================================
// Catalog Handlers
// ============================================================================

async fn list_artists(State(state): State<AppState>) -> Json<Vec<Artist>> {
    Json(state.store.artists().to_vec())
}

async fn artist_details(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ArtistDetails>, ApiError> {
    let id: i64 = raw_id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Invalid artist ID: {raw_id}")))?;

    Ok(Json(state.store.artist_details(id)?))
}

// ============================================================================
// Status Handlers
// ============================================================================

async fn loading(State(state): State<AppState>, Query(query): Query<LoadingQuery>) -> Response {
    let target = redirect_target(query.requested.as_deref());

    match state.status.status() {
        Status::Loaded => Redirect::to(target).into_response(),
        Status::Failed => ApiError::Unavailable.into_response(),
        Status::Loading => {
            let body = Json(MessageResponse {
                message: "Loading data...".to_string(),
                requested: Some(target.to_string()),
            });
            let refresh = format!("{}; url={target}", state.loading_refresh_secs);

            match HeaderValue::from_str(&refresh) {
                Ok(value) => ([(REFRESH, value)], body).into_response(),
                Err(_) => body.into_response(),
            }
        }
    }
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.status.status(),
        counts: state.store.counts(),
        last_refresh: state.scheduler.last_completed(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Start a refresh cycle in the background
async fn refresh(State(state): State<AppState>) -> (StatusCode, Json<MessageResponse>) {
    let scheduler = state.scheduler.clone();
    tokio::spawn(async move {
        scheduler.refresh_now().await;
    });

    tracing::info!("Manual refresh requested");
    (
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Refresh started".to_string(),
            requested: None,
        }),
    )
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
