use sqlx::PgPool;

/// Executor adapter for [`kanau::processor::Processor`] implementations
/// that run against the shared connection pool.
///
/// Every database command/query in [`crate::entities`] is a message type
/// processed by this struct, so request handlers and background tasks
/// share one uniform database seam. Construct it ad hoc from a cloned
/// pool; it carries no other state.
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
