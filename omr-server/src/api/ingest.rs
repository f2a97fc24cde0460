//! Ingestion handler: `POST /ingest`.
//!
//! Flow per request: signature-verified raw payload (see
//! [`crate::api::extractors::ProviderPayload`]) → adapter extraction →
//! match reference pre-check → per-event append → acknowledgment.
//!
//! The producer is acknowledged once every event is durably recorded;
//! the hand-off to the publisher is `try_send` and never delays or fails
//! the response. A full publish queue costs a live-delivery attempt,
//! not the record.

use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use itertools::Itertools;
use tracing::{error, warn};

use omr_core::entities::MatchEventRecord;
use omr_core::ingest::AdapterError;
use omr_core::store::StoreError;
use omr_sdk::objects::IngestAccepted;

use super::extractors::ProviderPayload;
use crate::state::AppState;

/// Errors surfaced by the ingestion handler.
///
/// Client errors (unparsable payload, invalid event, unknown match) are
/// rejected before anything is persisted; only a storage fault produces a
/// 500, and in that case no acknowledgment is sent so the producer
/// retries.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Extract(#[from] AdapterError),
    #[error("match {0} not found")]
    MatchNotFound(i64),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MatchNotFound(match_id) => IngestError::MatchNotFound(match_id),
            StoreError::Database(e) => IngestError::Database(e),
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> axum::response::Response {
        match self {
            IngestError::Extract(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            IngestError::MatchNotFound(match_id) => (
                StatusCode::NOT_FOUND,
                format!("match {match_id} not found"),
            )
                .into_response(),
            IngestError::Database(e) => {
                error!(error = %e, "ingestion database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

/// `POST /ingest?provider={name}` — accept one event or a batch.
pub(super) async fn ingest(
    State(state): State<AppState>,
    payload: ProviderPayload,
) -> Result<impl IntoResponse, IngestError> {
    let events = payload.adapter.extract_batch(&payload.body)?;

    // Reference-data check for the whole batch before any write, so an
    // unknown match rejects the request without partial persistence.
    let match_ids: Vec<i64> = events.iter().map(|event| event.match_id).unique().collect();
    for match_id in match_ids {
        if !state.store.match_exists(match_id).await.map_err(IngestError::from)? {
            return Err(IngestError::MatchNotFound(match_id));
        }
    }

    let mut records = Vec::with_capacity(events.len());
    for event in events {
        let record = state.store.append(event).await?;
        records.push(record);
    }

    // Detached publish: the response does not wait for live delivery.
    for record in &records {
        if let Err(e) = state.publish_tx.try_send(record.clone()) {
            warn!(
                event_id = %record.event_id,
                match_id = record.match_id,
                error = %e,
                "publish queue full or closed; live delivery skipped"
            );
        }
    }

    Ok(Json(build_ack(&payload.provider, &records)))
}

/// Shape the acknowledgment: singleton requests carry the match and type
/// inline, batches carry a per-type count map.
fn build_ack(provider: &str, records: &[MatchEventRecord]) -> IngestAccepted {
    let event_ids = records.iter().map(|record| record.event_id).collect();
    let mut ack = IngestAccepted {
        status: "accepted".to_string(),
        events_count: records.len(),
        provider: provider.to_string(),
        event_ids,
        match_id: None,
        event_type: None,
        events_by_type: None,
    };
    match records {
        [only] => {
            ack.match_id = Some(only.match_id);
            ack.event_type = Some(only.event_type.to_string());
        }
        _ => {
            let counts: BTreeMap<String, usize> = records
                .iter()
                .counts_by(|record| record.event_type.to_string())
                .into_iter()
                .collect();
            ack.events_by_type = Some(counts);
        }
    }
    ack
}
