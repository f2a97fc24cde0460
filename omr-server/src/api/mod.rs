//! HTTP API surface.
//!
//! - `POST /ingest` — provider webhook ingestion (signed payloads).
//! - `GET /matches/{match_id}/live` — websocket upgrade for live
//!   delivery.
//! - `/admin/*` — rarely used administrative paths (soft-delete, replay
//!   reads), authenticated by the admin secret header.

pub mod admin;
pub mod extractors;
pub mod ingest;
pub mod live;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ingest", post(ingest::ingest))
        .route("/matches/{match_id}/live", get(live::live_stream))
        .nest("/admin", admin::router())
}
