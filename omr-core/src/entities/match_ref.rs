//! Read-only probes against the reference-data `matches` table.

use kanau::processor::Processor;

use crate::framework::DatabaseProcessor;

#[derive(Debug, Clone, Copy)]
/// Does this match exist in the reference data?
///
/// The ingestion path rejects events for unknown matches before anything
/// is persisted, and the live endpoint refuses subscriptions to them.
pub struct MatchExists {
    pub match_id: i64,
}

impl Processor<MatchExists> for DatabaseProcessor {
    type Output = bool;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MatchExists")]
    async fn process(&self, query: MatchExists) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM matches WHERE match_id = $1)")
                .bind(query.match_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
