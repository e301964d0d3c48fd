//! Router and request handlers.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::caption::SharedCaptioner;
use crate::classify::{DetectionResult, KeywordSet};
use crate::config::ConfigError;
use crate::frames::{Frame, MAX_IMAGE_BYTES};

use super::error::{ApiError, UploadError};
use super::puns::pick_pun;

/// Multipart framing allowance on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Name of the form field carrying the image.
pub const FILE_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// State / response types
// ---------------------------------------------------------------------------

/// Shared, read-only handler state.  Requests never share anything mutable.
#[derive(Clone)]
pub struct AppState {
    pub captioner: SharedCaptioner,
    pub keywords: Arc<KeywordSet>,
}

/// Successful `POST /detect` body.
#[derive(Debug, Clone, Serialize)]
pub struct DetectResponse {
    pub caption: String,
    pub is_shop: bool,
    pub score: u8,
    pub pun: Option<&'static str>,
}

impl DetectResponse {
    pub fn new(result: DetectionResult, pun: Option<&'static str>) -> Self {
        Self {
            caption: result.caption,
            is_shop: result.is_shop,
            score: result.score,
            pun,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// CORS policy admitting exactly one browser origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ConfigError> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true))
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/detect", post(detect))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Caption one uploaded image and classify it.  No cooldown, no speech:
/// every request stands alone.
async fn detect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let data = read_file_field(multipart.map_err(UploadError::from)?).await?;

    let frame = tokio::task::spawn_blocking(move || Frame::decode(data))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(UploadError::from)?;

    let caption = state.captioner.caption(&frame).await?;
    let result = DetectionResult::from_caption(caption, &state.keywords, Utc::now());
    let pun = result.is_shop.then(|| pick_pun(&mut rand::thread_rng()));

    log::info!(
        "server: {:?} shop={} score={} matched={:?}",
        result.caption,
        result.is_shop,
        result.score,
        result.matched_keywords
    );

    Ok(Json(DetectResponse::new(result, pun)))
}

/// Bytes of the first `file` field; other fields are skipped.
async fn read_file_field(mut multipart: Multipart) -> Result<Bytes, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(UploadError::MissingFile)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
