//! The append-only `match_events` table.

use kanau::processor::Processor;
use uuid::Uuid;

use crate::framework::DatabaseProcessor;
use crate::ingest::NormalizedEvent;
use crate::taxonomy::{EventType, Period};
use omr_sdk::objects::MatchEventData;

/// One durably recorded match event.
///
/// Immutable once written: a logical correction is a new event, and
/// soft-deletion only clears `active`. Identity is a v7 UUID assigned at
/// insert so record order roughly follows wall-clock even across
/// concurrently ingesting requests.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct MatchEventRecord {
    pub event_id: Uuid,
    pub match_id: i64,
    pub event_type: EventType,
    pub minute: i16,
    pub second: Option<i16>,
    pub extra_minute: Option<i16>,
    pub period: Period,
    pub team_id: Option<i64>,
    pub player_id: Option<i64>,
    pub related_player_id: Option<i64>,
    pub position_x: Option<f32>,
    pub position_y: Option<f32>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub active: bool,
    pub created_at: time::PrimitiveDateTime,
}

impl MatchEventRecord {
    /// Convert to the wire representation used in broadcast envelopes and
    /// replay responses.
    pub fn to_wire(&self) -> MatchEventData {
        MatchEventData {
            event_id: self.event_id,
            match_id: self.match_id,
            event_type: self.event_type.as_str().to_string(),
            category: self.event_type.category().to_string(),
            minute: self.minute.clamp(0, 255) as u8,
            second: self.second.map(|s| s.clamp(0, 255) as u8),
            extra_minute: self.extra_minute.map(|e| e.clamp(0, 255) as u8),
            period: self.period.to_string(),
            team_id: self.team_id,
            player_id: self.player_id,
            related_player_id: self.related_player_id,
            position_x: self.position_x,
            position_y: self.position_y,
            description: self.description.clone(),
            metadata: self.metadata.clone(),
            recorded_at: self.created_at.assume_utc().unix_timestamp(),
        }
    }
}

const RETURNING_COLUMNS: &str = "event_id, match_id, event_type, minute, second, extra_minute, \
     period, team_id, player_id, related_player_id, position_x, position_y, description, \
     metadata, active, created_at";

#[derive(Debug, Clone)]
/// Append one normalized event as an immutable record.
///
/// A single INSERT, so concurrent ingestion requests never observe a
/// partially written event.
pub struct InsertMatchEvent {
    pub event: NormalizedEvent,
}

impl Processor<InsertMatchEvent> for DatabaseProcessor {
    type Output = MatchEventRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertMatchEvent")]
    async fn process(&self, insert: InsertMatchEvent) -> Result<MatchEventRecord, sqlx::Error> {
        let event = insert.event;
        let sql = format!(
            "INSERT INTO match_events \
             (event_id, match_id, event_type, minute, second, extra_minute, period, team_id, \
              player_id, related_player_id, position_x, position_y, description, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {RETURNING_COLUMNS}"
        );
        sqlx::query_as::<_, MatchEventRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(event.match_id)
            .bind(&event.event_type)
            .bind(event.minute as i16)
            .bind(event.second.map(|s| s as i16))
            .bind(event.extra_minute.map(|e| e as i16))
            .bind(event.period)
            .bind(event.team_id)
            .bind(event.player_id)
            .bind(event.related_player_id)
            .bind(event.position_x)
            .bind(event.position_y)
            .bind(&event.description)
            .bind(serde_json::Value::Object(event.metadata.clone()))
            .fetch_one(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Soft-delete: mark a record inactive without rewriting its content.
///
/// Administrative path only; returns `false` when the record does not
/// exist or is already inactive.
pub struct DeactivateMatchEvent {
    pub event_id: Uuid,
}

impl Processor<DeactivateMatchEvent> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeactivateMatchEvent")]
    async fn process(&self, cmd: DeactivateMatchEvent) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE match_events SET active = FALSE WHERE event_id = $1 AND active",
        )
        .bind(cmd.event_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
