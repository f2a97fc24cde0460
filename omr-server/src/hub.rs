//! Connection hub: match-topic membership and broadcast fan-out.
//!
//! The hub sits between the topic bus and the websocket handlers. Per
//! match topic it keeps a membership set of bounded per-connection
//! outboxes and exactly **one** relay task subscribed to the bus — not
//! one subscription per connection — so bus-side resource usage is
//! bounded by the number of live matches, not the number of viewers.
//!
//! Fan-out never blocks on an individual connection: messages are pushed
//! with `try_send`, and a connection whose outbox is full has that
//! message skipped (and counted) while the rest of the topic proceeds.
//! Clients that suspect a gap reconcile through the replay endpoint.
//!
//! Topic lifecycle: the relay is spawned lazily on the first subscribe
//! for a match and aborted when the last member leaves, after which the
//! bus topic itself is released.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use omr_core::events::TopicBus;
use omr_sdk::objects::BroadcastEnvelope;

type TopicMap = Arc<RwLock<HashMap<i64, TopicState>>>;

struct TopicState {
    members: HashMap<u64, mpsc::Sender<BroadcastEnvelope>>,
    relay: JoinHandle<()>,
}

/// One registered live connection.
///
/// Receiving half of the connection's outbox; dropping it without calling
/// [`ConnectionHub::unsubscribe`] leaves a closed sender behind that the
/// relay skips harmlessly, but prompt unsubscription is what frees the
/// topic.
pub struct LiveConnection {
    pub conn_id: u64,
    pub match_id: i64,
    pub outbox: mpsc::Receiver<BroadcastEnvelope>,
}

/// Shared handle to the hub. Cheap to clone.
#[derive(Clone)]
pub struct ConnectionHub {
    bus: TopicBus,
    topics: TopicMap,
    outbox_capacity: usize,
    next_conn_id: Arc<AtomicU64>,
}

impl ConnectionHub {
    pub fn new(bus: TopicBus, outbox_capacity: usize) -> Self {
        Self {
            bus,
            topics: Arc::new(RwLock::new(HashMap::new())),
            outbox_capacity: outbox_capacity.max(1),
            next_conn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a connection on a match topic, creating the topic's relay
    /// on first interest.
    pub async fn subscribe(&self, match_id: i64) -> LiveConnection {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.outbox_capacity);

        let mut topics = self.topics.write().await;
        match topics.get_mut(&match_id) {
            Some(topic) => {
                topic.members.insert(conn_id, tx);
            }
            None => {
                let bus_rx = self.bus.subscribe(match_id).await;
                let relay = tokio::spawn(relay_loop(match_id, bus_rx, self.topics.clone()));
                let mut members = HashMap::new();
                members.insert(conn_id, tx);
                topics.insert(match_id, TopicState { members, relay });
                debug!(match_id, "topic relay started");
            }
        }
        drop(topics);

        debug!(conn_id, match_id, "connection subscribed");
        LiveConnection {
            conn_id,
            match_id,
            outbox: rx,
        }
    }

    /// Remove a connection from its topic. The last member takes the
    /// relay and the bus topic down with it.
    ///
    /// Removal is immediate: a broadcast running concurrently sees either
    /// the member (delivered) or a closed outbox (skipped); it never
    /// observes a half-removed entry.
    pub async fn unsubscribe(&self, match_id: i64, conn_id: u64) {
        let mut topics = self.topics.write().await;
        let emptied = match topics.get_mut(&match_id) {
            Some(topic) => {
                topic.members.remove(&conn_id);
                topic.members.is_empty()
            }
            None => false,
        };
        if emptied
            && let Some(topic) = topics.remove(&match_id)
        {
            topic.relay.abort();
            debug!(match_id, "topic relay stopped");
        }
        drop(topics);

        if emptied {
            self.bus.release(match_id).await;
        }
        debug!(conn_id, match_id, "connection unsubscribed");
    }

    /// Publish an envelope to a match topic through the bus.
    pub async fn broadcast(&self, match_id: i64, envelope: BroadcastEnvelope) -> usize {
        self.bus.publish(match_id, envelope).await
    }

    /// Number of connections currently registered for a match.
    pub async fn member_count(&self, match_id: i64) -> usize {
        self.topics
            .read()
            .await
            .get(&match_id)
            .map(|topic| topic.members.len())
            .unwrap_or(0)
    }
}

/// Per-topic relay: bus → member outboxes.
async fn relay_loop(
    match_id: i64,
    mut bus_rx: broadcast::Receiver<BroadcastEnvelope>,
    topics: TopicMap,
) {
    loop {
        match bus_rx.recv().await {
            Ok(envelope) => {
                // Snapshot the membership, then send outside the lock so a
                // stalled outbox cannot hold up subscribes/unsubscribes.
                let members: Vec<(u64, mpsc::Sender<BroadcastEnvelope>)> = {
                    let topics = topics.read().await;
                    match topics.get(&match_id) {
                        Some(topic) => topic
                            .members
                            .iter()
                            .map(|(id, tx)| (*id, tx.clone()))
                            .collect(),
                        None => break,
                    }
                };
                for (conn_id, tx) in members {
                    match tx.try_send(envelope.clone()) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            warn!(
                                conn_id,
                                match_id, "outbox full, skipping envelope for this connection"
                            );
                        }
                        // Connection is mid-unsubscribe; nothing to do.
                        Err(TrySendError::Closed(_)) => {}
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(match_id, skipped, "topic relay lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omr_sdk::objects::EnvelopeKind;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn envelope(match_id: i64, tag: i64) -> BroadcastEnvelope {
        BroadcastEnvelope {
            kind: EnvelopeKind::Event,
            match_id,
            timestamp: tag,
            data: json!({ "tag": tag }),
        }
    }

    async fn recv(conn: &mut LiveConnection) -> BroadcastEnvelope {
        timeout(Duration::from_secs(1), conn.outbox.recv())
            .await
            .expect("timed out waiting for envelope")
            .expect("outbox closed")
    }

    fn hub() -> ConnectionHub {
        ConnectionHub::new(TopicBus::new(64), 8)
    }

    #[tokio::test]
    async fn broadcast_reaches_only_the_subscribed_topic() {
        let hub = hub();
        let mut on_123 = hub.subscribe(123).await;
        let mut on_456 = hub.subscribe(456).await;

        hub.broadcast(123, envelope(123, 1)).await;

        let received = recv(&mut on_123).await;
        assert_eq!(received.match_id, 123);

        // Give the relay a moment; nothing must arrive on the other topic.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(on_456.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn all_members_of_a_topic_receive() {
        let hub = hub();
        let mut a = hub.subscribe(7).await;
        let mut b = hub.subscribe(7).await;
        assert_eq!(hub.member_count(7).await, 2);

        hub.broadcast(7, envelope(7, 1)).await;
        assert_eq!(recv(&mut a).await.timestamp, 1);
        assert_eq!(recv(&mut b).await.timestamp, 1);
    }

    #[tokio::test]
    async fn unsubscribed_connection_is_skipped_without_disturbing_others() {
        let hub = hub();
        let mut stays = hub.subscribe(9).await;
        let leaves = hub.subscribe(9).await;

        hub.unsubscribe(9, leaves.conn_id).await;
        let mut gone = leaves;

        hub.broadcast(9, envelope(9, 1)).await;
        assert_eq!(recv(&mut stays).await.timestamp, 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gone.outbox.try_recv().is_err());
        assert_eq!(hub.member_count(9).await, 1);
    }

    #[tokio::test]
    async fn last_unsubscribe_tears_the_topic_down() {
        let hub = hub();
        let conn = hub.subscribe(11).await;
        assert_eq!(hub.member_count(11).await, 1);

        hub.unsubscribe(11, conn.conn_id).await;
        assert_eq!(hub.member_count(11).await, 0);

        // The topic is recreated on demand afterwards.
        let mut again = hub.subscribe(11).await;
        hub.broadcast(11, envelope(11, 2)).await;
        assert_eq!(recv(&mut again).await.timestamp, 2);
    }

    #[tokio::test]
    async fn slow_consumer_does_not_block_the_topic() {
        let hub = ConnectionHub::new(TopicBus::new(64), 1);
        let slow = hub.subscribe(13).await;
        let mut fast = hub.subscribe(13).await;

        for tag in 0..5 {
            hub.broadcast(13, envelope(13, tag)).await;
            // Drain the fast consumer each round; the slow one never reads.
            assert_eq!(recv(&mut fast).await.timestamp, tag);
        }

        // The slow connection holds at most its outbox capacity (1); the
        // overflow was skipped for it, not queued and not blocking.
        let mut slow = slow;
        assert_eq!(recv(&mut slow).await.timestamp, 0);
        assert!(slow.outbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropped_outbox_mid_broadcast_does_not_crash_the_relay() {
        let hub = hub();
        let dropped = hub.subscribe(17).await;
        let mut alive = hub.subscribe(17).await;

        // Simulate a connection dying without unsubscribing first.
        drop(dropped.outbox);

        hub.broadcast(17, envelope(17, 1)).await;
        assert_eq!(recv(&mut alive).await.timestamp, 1);

        hub.broadcast(17, envelope(17, 2)).await;
        assert_eq!(recv(&mut alive).await.timestamp, 2);
    }
}
