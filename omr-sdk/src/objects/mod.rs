//! Wire objects shared between the relay server and its clients.
//!
//! These are the API/DTO types. Database entities live in `omr-core` and
//! are converted at the boundary, never exposed directly.

pub mod envelope;
pub mod ingest;

pub use envelope::{
    BroadcastEnvelope, EnvelopeKind, MatchEventData, ScoreUpdateData, StatusUpdateData,
    WsCloseCode,
};
pub use ingest::IngestAccepted;
