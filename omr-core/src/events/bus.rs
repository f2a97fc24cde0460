//! Per-match topic bus.
//!
//! The in-process publish/subscribe transport between the publisher and
//! the connection hub: one `tokio::sync::broadcast` channel per match,
//! created lazily on first subscriber interest and removed once the last
//! receiver is gone. Publishing to a match nobody watches is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use omr_sdk::objects::BroadcastEnvelope;

/// Shared handle to the topic map. Cheap to clone.
#[derive(Clone)]
pub struct TopicBus {
    topics: Arc<RwLock<HashMap<i64, broadcast::Sender<BroadcastEnvelope>>>>,
    capacity: usize,
}

impl TopicBus {
    /// `capacity` is the per-topic broadcast buffer; a subscriber that
    /// falls more than `capacity` messages behind observes a lag error
    /// and skips, it never blocks the sender.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to a match topic, creating it on first interest.
    pub async fn subscribe(&self, match_id: i64) -> broadcast::Receiver<BroadcastEnvelope> {
        let mut topics = self.topics.write().await;
        topics
            .entry(match_id)
            .or_insert_with(|| {
                debug!(match_id, "creating bus topic");
                broadcast::channel(self.capacity).0
            })
            .subscribe()
    }

    /// Publish an envelope to a match topic.
    ///
    /// Returns the number of subscribers the message was queued for; zero
    /// when the topic does not exist or has no live receivers.
    pub async fn publish(&self, match_id: i64, envelope: BroadcastEnvelope) -> usize {
        let topics = self.topics.read().await;
        match topics.get(&match_id) {
            Some(sender) => sender.send(envelope).unwrap_or(0),
            None => 0,
        }
    }

    /// Drop the topic if it no longer has receivers. Called by the hub
    /// after the last connection of a match unsubscribes; harmless when
    /// new receivers appeared in the meantime.
    pub async fn release(&self, match_id: i64) {
        let mut topics = self.topics.write().await;
        if let Some(sender) = topics.get(&match_id)
            && sender.receiver_count() == 0
        {
            debug!(match_id, "releasing bus topic");
            topics.remove(&match_id);
        }
    }

    /// Number of live topics (diagnostics).
    pub async fn topic_count(&self) -> usize {
        self.topics.read().await.len()
    }
}
