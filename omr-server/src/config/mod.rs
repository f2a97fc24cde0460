//! Configuration module for omr-server.
//!
//! Handles loading configuration from the TOML file, CLI arguments and
//! environment variables, and producing the shared runtime view.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    AdminConfig, DeliveryConfig, IngestRuntimeConfig, ResolvedSecret, ServerConfig, SharedConfig,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub ingest: IngestRuntimeConfig,
    pub delivery: DeliveryConfig,
}

impl LoadedConfig {
    /// Convert the reloadable sections into a SharedConfig.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            admin: Arc::new(RwLock::new(self.admin)),
            ingest: Arc::new(RwLock::new(self.ingest)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Fold provider overrides into the runtime view
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        Ok(build_loaded_config(file_config))
    }

    /// Reload the configuration (used during SIGHUP).
    ///
    /// Returns a LoadedConfig whose reloadable sections can be swapped
    /// into an existing SharedConfig. Listen address and delivery tuning
    /// require a restart.
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.admin.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "admin.secret must not be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for provider in &config.providers {
            if provider.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "provider name must not be empty".to_string(),
                ));
            }
            if !seen.insert(provider.name.to_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "provider {} configured twice",
                    provider.name
                )));
            }
            if provider.verify
                && provider.secret.as_deref().unwrap_or_default().is_empty()
                && config.ingest.default_secret.is_empty()
            {
                tracing::warn!(
                    provider = %provider.name,
                    "no secret configured; signature verification is disabled"
                );
            }
        }

        if config.ingest.max_body_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_body_bytes must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    let mut overrides = HashMap::new();
    for provider in &file_config.providers {
        let secret = provider
            .secret
            .clone()
            .unwrap_or_else(|| file_config.ingest.default_secret.clone());
        overrides.insert(
            provider.name.to_lowercase(),
            ResolvedSecret {
                secret,
                verify: provider.verify,
            },
        );
    }

    LoadedConfig {
        server: file_config.server,
        admin: file_config.admin,
        ingest: IngestRuntimeConfig::new(
            file_config.ingest.default_secret,
            file_config.ingest.max_body_bytes,
            overrides,
        ),
        delivery: file_config.delivery,
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::file::{IngestConfig, ProviderConfig};

    fn file_config() -> FileConfig {
        FileConfig {
            server: ServerConfig {
                listen: "127.0.0.1:9000".parse().unwrap(),
            },
            admin: AdminConfig {
                secret: "admin".to_string(),
            },
            ingest: IngestConfig {
                default_secret: "shared".to_string(),
                max_body_bytes: 1024,
            },
            providers: vec![
                ProviderConfig {
                    name: "Opta".to_string(),
                    secret: Some("opta-secret".to_string()),
                    verify: true,
                },
                ProviderConfig {
                    name: "wyscout".to_string(),
                    secret: None,
                    verify: false,
                },
            ],
            delivery: DeliveryConfig::default(),
        }
    }

    #[test]
    fn overrides_are_folded_case_insensitively() {
        let loaded = build_loaded_config(file_config());
        let resolved = loaded.ingest.resolve("opta");
        assert_eq!(resolved.secret, "opta-secret");

        let resolved = loaded.ingest.resolve("WYSCOUT");
        assert_eq!(resolved.secret, "shared");
        assert!(!resolved.verify);

        let resolved = loaded.ingest.resolve("generic");
        assert_eq!(resolved.secret, "shared");
        assert!(resolved.verify);
    }
}
