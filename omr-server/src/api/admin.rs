//! Admin API handlers.
//!
//! Rarely used administrative paths, deliberately outside the hot
//! ingestion flow:
//!
//! - `POST /admin/events/{event_id}/deactivate` — soft-delete a record
//!   (marks it inactive; content is never rewritten).
//! - `GET  /admin/matches/{match_id}/events` — read the ordered log for
//!   reconciliation/replay.
//!
//! Authenticated by the `Omr-Admin-Authorization` header, compared
//! constant-time against the configured admin secret.

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use uuid::Uuid;

use omr_sdk::objects::MatchEventData;
use omr_sdk::signature::ADMIN_AUTH_HEADER;

use crate::state::AppState;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/{event_id}/deactivate", post(deactivate_event))
        .route("/matches/{match_id}/events", get(replay_events))
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// Extractor that checks the admin secret header.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(AdminApiError::Unauthorized)?;

        let admin = state.config.admin.read().await;
        ring::constant_time::verify_slices_are_equal(
            supplied.as_bytes(),
            admin.secret.as_bytes(),
        )
        .map_err(|_| AdminApiError::Unauthorized)?;
        drop(admin);

        Ok(AdminAuth)
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /admin/events/{event_id}/deactivate` — soft-delete one record.
async fn deactivate_event(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, AdminApiError> {
    let changed = state
        .store
        .deactivate(event_id)
        .await
        .map_err(|e| AdminApiError::Database(e.to_string()))?;
    if !changed {
        return Err(AdminApiError::EventNotFound);
    }
    Ok(Json(json!({
        "status": "deactivated",
        "event_id": event_id,
    })))
}

/// `GET /admin/matches/{match_id}/events` — active events in log order.
async fn replay_events(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(match_id): Path<i64>,
) -> Result<impl IntoResponse, AdminApiError> {
    if !state
        .store
        .match_exists(match_id)
        .await
        .map_err(|e| AdminApiError::Database(e.to_string()))?
    {
        return Err(AdminApiError::MatchNotFound);
    }
    let records = state
        .store
        .replay(match_id)
        .await
        .map_err(|e| AdminApiError::Database(e.to_string()))?;
    let events: Vec<MatchEventData> = records.iter().map(|record| record.to_wire()).collect();
    Ok(Json(events))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub enum AdminApiError {
    Unauthorized,
    EventNotFound,
    MatchNotFound,
    Database(String),
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "invalid admin credentials").into_response()
            }
            AdminApiError::EventNotFound => {
                (StatusCode::NOT_FOUND, "event not found").into_response()
            }
            AdminApiError::MatchNotFound => {
                (StatusCode::NOT_FOUND, "match not found").into_response()
            }
            AdminApiError::Database(e) => {
                tracing::error!(error = %e, "Admin API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
