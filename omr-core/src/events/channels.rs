//! Channel factory for the persistence → publisher hand-off.

use tokio::sync::mpsc;

use crate::entities::MatchEventRecord;

/// Default buffer size for the publish queue.
///
/// Enough to absorb an ingestion burst while keeping memory bounded; a
/// full queue drops the live-delivery attempt, never the durable record.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for persisted events awaiting publication.
pub type PublishSender = mpsc::Sender<MatchEventRecord>;
/// Receiver handle owned by the publisher task.
pub type PublishReceiver = mpsc::Receiver<MatchEventRecord>;

/// Create the publish channel with the given buffer capacity.
pub fn publish_channel(buffer: usize) -> (PublishSender, PublishReceiver) {
    mpsc::channel(buffer.max(1))
}
