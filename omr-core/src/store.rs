//! The event store: the single write path for match events.

use kanau::processor::Processor;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    AppendEventLog, DeactivateMatchEvent, InsertMatchEvent, MatchEventRecord, MatchExists,
    ReplayMatchEvents,
};
use crate::framework::DatabaseProcessor;
use crate::ingest::NormalizedEvent;

/// Failures of the store.
///
/// `MatchNotFound` is a client-visible condition (the producer referenced
/// reference data that does not exist); `Database` is a persistence fault
/// the producer should retry, since nothing was recorded.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("match {0} not found")]
    MatchNotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only facade over the `match_events` tables.
///
/// Cheap to clone (the pool is reference-counted); safe under concurrent
/// use from many ingestion requests — each append is a single INSERT and
/// there is no cross-request state.
#[derive(Clone)]
pub struct EventStore {
    pool: PgPool,
}

impl EventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn processor(&self) -> DatabaseProcessor {
        DatabaseProcessor {
            pool: self.pool.clone(),
        }
    }

    /// Whether the referenced match exists in the reference data.
    pub async fn match_exists(&self, match_id: i64) -> Result<bool, StoreError> {
        Ok(self.processor().process(MatchExists { match_id }).await?)
    }

    /// Durably record one normalized event, assigning its identity.
    ///
    /// Rejects events for unknown matches before writing anything. No
    /// update path exists; corrections are new events.
    #[tracing::instrument(skip_all, fields(match_id = event.match_id))]
    pub async fn append(&self, event: NormalizedEvent) -> Result<MatchEventRecord, StoreError> {
        let processor = self.processor();
        if !processor
            .process(MatchExists {
                match_id: event.match_id,
            })
            .await?
        {
            return Err(StoreError::MatchNotFound(event.match_id));
        }
        Ok(processor.process(InsertMatchEvent { event }).await?)
    }

    /// Append a persisted event to its match's ordered log.
    pub async fn append_log(&self, match_id: i64, event_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .processor()
            .process(AppendEventLog { match_id, event_id })
            .await?)
    }

    /// Soft-delete (administrative). Returns `false` if nothing changed.
    pub async fn deactivate(&self, event_id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .processor()
            .process(DeactivateMatchEvent { event_id })
            .await?)
    }

    /// Active events of a match in ordered-log order.
    pub async fn replay(&self, match_id: i64) -> Result<Vec<MatchEventRecord>, StoreError> {
        Ok(self
            .processor()
            .process(ReplayMatchEvents { match_id })
            .await?)
    }
}
