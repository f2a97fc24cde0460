//! Application state shared across all request handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::runtime::{DeliveryConfig, SharedConfig};
use crate::hub::ConnectionHub;
use omr_core::events::PublishSender;
use omr_core::ingest::ProviderRegistry;
use omr_core::store::EventStore;

/// Application state that is shared across all request handlers.
///
/// Cloneable and cheap to pass around (everything is behind Arc or is a
/// handle). The provider registry is read-only after startup; the
/// reloadable config sections sit behind their own locks in
/// [`SharedConfig`].
#[derive(Clone)]
pub struct AppState {
    /// Append-only event store.
    pub store: EventStore,
    /// Provider name → adapter resolution.
    pub registry: Arc<ProviderRegistry>,
    /// Hand-off queue to the detached publisher.
    pub publish_tx: PublishSender,
    /// Live connection hub.
    pub hub: ConnectionHub,
    /// Reloadable configuration (admin secret, ingest secrets).
    pub config: SharedConfig,
    /// Delivery tuning fixed at startup.
    pub delivery: DeliveryConfig,
}

impl AppState {
    pub fn new(
        db: PgPool,
        registry: Arc<ProviderRegistry>,
        publish_tx: PublishSender,
        hub: ConnectionHub,
        config: SharedConfig,
        delivery: DeliveryConfig,
    ) -> Self {
        Self {
            store: EventStore::new(db),
            registry,
            publish_tx,
            hub,
            config,
            delivery,
        }
    }
}
