//! Runtime configuration: the reload-safe view handed to request
//! handlers.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub use super::file::{AdminConfig, DeliveryConfig, ServerConfig};

/// The secret resolution for one provider name.
#[derive(Debug, Clone)]
pub struct ResolvedSecret {
    /// Shared secret bytes; empty means unsecured.
    pub secret: String,
    /// Whether verification is enabled at all for this provider.
    pub verify: bool,
}

/// Ingestion configuration after provider overrides have been folded in.
#[derive(Debug, Clone)]
pub struct IngestRuntimeConfig {
    pub default_secret: String,
    pub max_body_bytes: usize,
    /// Lowercased provider name → override.
    overrides: HashMap<String, ResolvedSecret>,
}

impl IngestRuntimeConfig {
    pub fn new(
        default_secret: String,
        max_body_bytes: usize,
        overrides: HashMap<String, ResolvedSecret>,
    ) -> Self {
        Self {
            default_secret,
            max_body_bytes,
            overrides,
        }
    }

    /// Resolve the effective secret for a provider name
    /// (case-insensitive). Providers without an override use the default
    /// secret with verification enabled.
    pub fn resolve(&self, provider: &str) -> ResolvedSecret {
        self.overrides
            .get(&provider.to_lowercase())
            .cloned()
            .unwrap_or_else(|| ResolvedSecret {
                secret: self.default_secret.clone(),
                verify: true,
            })
    }
}

/// Configuration sections shared across handlers, each behind its own
/// lock so a SIGHUP reload swaps them independently.
#[derive(Clone)]
pub struct SharedConfig {
    pub admin: Arc<RwLock<AdminConfig>>,
    pub ingest: Arc<RwLock<IngestRuntimeConfig>>,
}
