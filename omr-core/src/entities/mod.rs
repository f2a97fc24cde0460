//! Database entities and their command/query message types.
//!
//! Each operation is a message struct processed by
//! [`crate::framework::DatabaseProcessor`], following the
//! [`kanau::processor::Processor`] pattern. The `matches` table is owned
//! by the surrounding reference-data subsystem; this crate only probes it.

pub mod event_log;
pub mod match_event;
pub mod match_ref;

pub use event_log::{AppendEventLog, ReplayMatchEvents};
pub use match_event::{DeactivateMatchEvent, InsertMatchEvent, MatchEventRecord};
pub use match_ref::MatchExists;
