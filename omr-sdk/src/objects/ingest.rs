//! Request acknowledgment types for the ingestion endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Successful ingestion acknowledgment.
///
/// Returned once every event in the request has been durably recorded.
/// Live delivery happens after this response is sent; a `200` therefore
/// guarantees durability, not delivery.
///
/// A singleton request carries `match_id` and `event_type`; a batch
/// request carries `events_by_type` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestAccepted {
    pub status: String,
    pub events_count: usize,
    pub provider: String,
    /// Identities assigned by the store, in input order.
    pub event_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_by_type: Option<BTreeMap<String, usize>>,
}
