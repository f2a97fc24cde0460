//! Provider registry: case-insensitive adapter lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::adapters::{ProviderAdapter, standard_adapters};

/// Lookup failure carrying the full set of registered names so producers
/// can diagnose a misconfigured identifier from the error alone. Surfaced
/// as a client error, never as a fault.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown provider {requested:?}, known providers: {}", known.join(", "))]
pub struct UnknownProvider {
    pub requested: String,
    pub known: Vec<String>,
}

/// The set of adapters this process accepts payloads from.
///
/// Populated once at startup and read-only afterwards; handlers receive it
/// behind an `Arc` rather than through a process-global, so tests can run
/// isolated instances.
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with the built-in adapter set.
    pub fn with_standard_adapters() -> Self {
        let mut registry = Self::new();
        for adapter in standard_adapters() {
            registry.register(adapter.name(), adapter);
        }
        registry
    }

    /// Register an adapter under `name`. Names are folded to lowercase, so
    /// re-registering a different casing of the same name replaces the
    /// entry rather than adding a second one.
    pub fn register(&mut self, name: &str, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(name.to_lowercase(), adapter);
    }

    /// Resolve an adapter by case-insensitive name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ProviderAdapter>, UnknownProvider> {
        self.adapters
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| UnknownProvider {
                requested: name.to_string(),
                known: self.names(),
            })
    }

    /// Registered names, sorted for stable error messages.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
