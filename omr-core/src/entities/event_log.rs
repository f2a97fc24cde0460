//! The ordered append log (`match_event_log`).
//!
//! A durable, replayable per-match sequence, written by the publisher
//! after the event itself has committed. The `seq` column is the
//! authoritative replay order; live broadcast order is best-effort
//! arrival order and may differ under concurrent ingestion.

use kanau::processor::Processor;
use uuid::Uuid;

use super::match_event::MatchEventRecord;
use crate::framework::DatabaseProcessor;

#[derive(Debug, Clone, Copy)]
/// Append one persisted event to the ordered log of its match.
pub struct AppendEventLog {
    pub match_id: i64,
    pub event_id: Uuid,
}

impl Processor<AppendEventLog> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AppendEventLog")]
    async fn process(&self, cmd: AppendEventLog) -> Result<i64, sqlx::Error> {
        let seq: i64 = sqlx::query_scalar(
            "INSERT INTO match_event_log (match_id, event_id) VALUES ($1, $2) RETURNING seq",
        )
        .bind(cmd.match_id)
        .bind(cmd.event_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(seq)
    }
}

#[derive(Debug, Clone, Copy)]
/// Read the active events of a match in log order.
///
/// The reconciliation path for consumers that suspect a delivery gap.
pub struct ReplayMatchEvents {
    pub match_id: i64,
}

impl Processor<ReplayMatchEvents> for DatabaseProcessor {
    type Output = Vec<MatchEventRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ReplayMatchEvents")]
    async fn process(&self, query: ReplayMatchEvents) -> Result<Vec<MatchEventRecord>, sqlx::Error> {
        sqlx::query_as::<_, MatchEventRecord>(
            "SELECT e.event_id, e.match_id, e.event_type, e.minute, e.second, e.extra_minute, \
                    e.period, e.team_id, e.player_id, e.related_player_id, e.position_x, \
                    e.position_y, e.description, e.metadata, e.active, e.created_at \
             FROM match_event_log l \
             JOIN match_events e ON e.event_id = l.event_id \
             WHERE l.match_id = $1 AND e.active \
             ORDER BY l.seq ASC",
        )
        .bind(query.match_id)
        .fetch_all(&self.pool)
        .await
    }
}
