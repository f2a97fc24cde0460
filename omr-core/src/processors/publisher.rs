//! EventPublisher processor.
//!
//! Runs detached from the ingestion request path: by the time a record
//! reaches this task the producer has already been acknowledged, so
//! nothing here may fail the request or roll the record back. The
//! publisher:
//!
//! - appends each event to its match's ordered log,
//! - emits broadcast envelopes onto the topic bus (an `event` envelope
//!   always; `score_update` / `status_update` envelopes when the event
//!   warrants them),
//! - logs delivery faults and moves on — recovery is replay from the
//!   ordered log, not inline retry.

use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use kanau::processor::Processor;

use crate::entities::{AppendEventLog, MatchEventRecord};
use crate::events::{PublishReceiver, TopicBus};
use crate::framework::DatabaseProcessor;
use crate::taxonomy::Category;
use omr_sdk::objects::{BroadcastEnvelope, EnvelopeKind, ScoreUpdateData, StatusUpdateData};

pub struct EventPublisher {
    processor: DatabaseProcessor,
    bus: TopicBus,
    publish_rx: PublishReceiver,
    shutdown_rx: watch::Receiver<bool>,
}

impl EventPublisher {
    pub fn new(
        pool: PgPool,
        bus: TopicBus,
        publish_rx: PublishReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
            bus,
            publish_rx,
            shutdown_rx,
        }
    }

    /// Run until shutdown is signalled or the ingestion side closes the
    /// queue.
    pub async fn run(mut self) {
        info!("EventPublisher started");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("EventPublisher received shutdown signal");
                        break;
                    }
                }

                maybe = self.publish_rx.recv() => {
                    match maybe {
                        Some(record) => self.publish_event(record).await,
                        None => {
                            info!("publish queue closed");
                            break;
                        }
                    }
                }
            }
        }

        info!("EventPublisher shutdown complete");
    }

    /// Log append and envelope fan-out for one record. The two stages are
    /// independent: a log fault never suppresses the live broadcast and
    /// vice versa.
    async fn publish_event(&self, record: MatchEventRecord) {
        match self
            .processor
            .process(AppendEventLog {
                match_id: record.match_id,
                event_id: record.event_id,
            })
            .await
        {
            Ok(seq) => debug!(event_id = %record.event_id, seq, "appended to ordered log"),
            Err(e) => error!(
                event_id = %record.event_id,
                match_id = record.match_id,
                error = %e,
                "failed to append to ordered log"
            ),
        }

        for envelope in envelopes_for(&record) {
            let kind = envelope.kind;
            let delivered = self.bus.publish(record.match_id, envelope).await;
            debug!(
                event_id = %record.event_id,
                match_id = record.match_id,
                %kind,
                delivered,
                "published broadcast envelope"
            );
        }
    }
}

/// Derive the broadcast envelopes for one persisted event.
///
/// Every event produces an [`EnvelopeKind::Event`]. A goal-category event
/// whose provider supplied running-score metadata additionally produces a
/// [`EnvelopeKind::ScoreUpdate`]; a match-state event produces a
/// [`EnvelopeKind::StatusUpdate`].
pub fn envelopes_for(record: &MatchEventRecord) -> Vec<BroadcastEnvelope> {
    let mut envelopes = Vec::with_capacity(2);
    let category = record.event_type.category();

    push_envelope(
        &mut envelopes,
        BroadcastEnvelope::new(EnvelopeKind::Event, record.match_id, &record.to_wire()),
    );

    if category == Category::Goal
        && let (Some(home_score), Some(away_score)) = (
            record.metadata.get("home_score").and_then(|v| v.as_i64()),
            record.metadata.get("away_score").and_then(|v| v.as_i64()),
        )
    {
        let data = ScoreUpdateData {
            event_id: record.event_id,
            team_id: record.team_id,
            player_id: record.player_id,
            minute: record.minute.clamp(0, 255) as u8,
            home_score,
            away_score,
        };
        push_envelope(
            &mut envelopes,
            BroadcastEnvelope::new(EnvelopeKind::ScoreUpdate, record.match_id, &data),
        );
    }

    if category == Category::MatchState {
        let data = StatusUpdateData {
            event_id: record.event_id,
            status: record.event_type.as_str().to_string(),
            minute: record.minute.clamp(0, 255) as u8,
            period: record.period.to_string(),
        };
        push_envelope(
            &mut envelopes,
            BroadcastEnvelope::new(EnvelopeKind::StatusUpdate, record.match_id, &data),
        );
    }

    envelopes
}

fn push_envelope(
    envelopes: &mut Vec<BroadcastEnvelope>,
    result: Result<BroadcastEnvelope, serde_json::Error>,
) {
    match result {
        Ok(envelope) => envelopes.push(envelope),
        Err(e) => warn!(error = %e, "failed to serialize broadcast envelope"),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::taxonomy::{EventType, Period};
    use serde_json::json;
    use uuid::Uuid;

    fn record(event_type: &str, metadata: serde_json::Value) -> MatchEventRecord {
        let date = time::Date::from_calendar_date(2026, time::Month::August, 8).unwrap();
        let at = time::PrimitiveDateTime::new(date, time::Time::MIDNIGHT);
        MatchEventRecord {
            event_id: Uuid::now_v7(),
            match_id: 42,
            event_type: EventType::normalize(event_type),
            minute: 67,
            second: None,
            extra_minute: None,
            period: Period::SecondHalf,
            team_id: Some(5),
            player_id: Some(909),
            related_player_id: None,
            position_x: None,
            position_y: None,
            description: None,
            metadata,
            active: true,
            created_at: at,
        }
    }

    #[test]
    fn every_event_gets_an_event_envelope() {
        let envelopes = envelopes_for(&record("pass", json!({})));
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].kind, EnvelopeKind::Event);
        assert_eq!(envelopes[0].match_id, 42);
        assert_eq!(envelopes[0].data["event_type"], "pass");
        assert_eq!(envelopes[0].data["category"], "pass");
    }

    #[test]
    fn goal_with_score_metadata_adds_a_score_update() {
        let envelopes = envelopes_for(&record(
            "goal",
            json!({"home_score": 2, "away_score": 1}),
        ));
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[1].kind, EnvelopeKind::ScoreUpdate);
        assert_eq!(envelopes[1].data["home_score"], 2);
        assert_eq!(envelopes[1].data["away_score"], 1);
    }

    #[test]
    fn goal_without_score_metadata_stays_single() {
        let envelopes = envelopes_for(&record("goal", json!({})));
        assert_eq!(envelopes.len(), 1);
    }

    #[test]
    fn match_state_events_add_a_status_update() {
        let envelopes = envelopes_for(&record("half_time", json!({})));
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[1].kind, EnvelopeKind::StatusUpdate);
        assert_eq!(envelopes[1].data["status"], "half_time");
        assert_eq!(envelopes[1].data["period"], "second_half");
    }
}
