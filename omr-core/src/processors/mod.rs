//! Background tasks of the pipeline.
//!
//! - `EventPublisher`: consumes persisted events after the producer has
//!   already been acknowledged, appends them to the ordered log and emits
//!   broadcast envelopes onto the topic bus.

pub mod publisher;

pub use publisher::EventPublisher;
