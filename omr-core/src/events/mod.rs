//! Event distribution infrastructure.
//!
//! The asynchronous boundary of the pipeline lives here:
//!
//! 1. An ingestion request persists its events, acknowledges the
//!    producer, and hands the persisted records to the publisher over a
//!    bounded [`channels`] queue.
//! 2. The publisher appends to the ordered log and publishes broadcast
//!    envelopes onto the per-match [`bus`].
//! 3. The connection hub subscribes to the bus — never to the publisher
//!    or the ingestion path directly — so a connection surge cannot slow
//!    ingestion and an event burst cannot starve handshakes.

pub mod bus;
pub mod channels;

pub use bus::TopicBus;
pub use channels::{PublishReceiver, PublishSender, publish_channel, DEFAULT_CHANNEL_BUFFER};
