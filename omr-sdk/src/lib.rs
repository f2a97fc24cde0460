//! Shared wire types and cryptography for Open Match Relay.
//!
//! This crate is the contract between the relay server and everything that
//! talks to it: data providers posting webhook payloads, and live viewers
//! consuming the websocket envelope stream.
//!
//! - [`signature`] — the HMAC-SHA256 signing scheme used on the ingestion
//!   endpoint.
//! - [`objects`] — request/response bodies and the broadcast envelope.
//! - `client` (behind the `client` cargo feature) — HTTP/WS clients for
//!   producers and live viewers.

pub mod objects;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;
