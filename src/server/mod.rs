//! HTTP facade: `POST /detect` and `GET /health`.
//!
//! Stateless per request.  The only thing requests share is the
//! single-flight [`SharedCaptioner`] and the read-only keyword set.
//!
//! ```text
//! multipart `file` ──▶ Frame::decode ──▶ SharedCaptioner ──▶ classify ──▶ JSON
//!                          │ 400               │ 502
//! ```

pub mod error;
pub mod puns;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::caption::SharedCaptioner;
use crate::config::ServeConfig;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use error::{ApiError, ErrorBody, UploadError};
pub use puns::{pick_pun, PUNS};
pub use routes::{cors_layer, router, AppState, DetectResponse, FILE_FIELD};

/// Bind and serve until `shutdown` is cancelled.
pub async fn serve(
    config: ServeConfig,
    captioner: SharedCaptioner,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let state = AppState {
        captioner,
        keywords: Arc::new(config.keywords),
    };
    let app = router(state, cors_layer(&config.allowed_origin)?);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    log::info!(
        "server: listening on http://{} (allowed origin {})",
        listener.local_addr()?,
        config.allowed_origin
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    log::info!("server: shut down");
    Ok(())
}
