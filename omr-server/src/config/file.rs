//! TOML file configuration structures.
//!
//! These structs directly map to the `omr-config.toml` file format.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub ingest: IngestConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("valid default address")
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Secret expected in the `Omr-Admin-Authorization` header.
    pub secret: String,
}

/// Ingestion defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Shared secret used for providers without an explicit override.
    /// An empty string disables verification (dev mode only).
    pub default_secret: String,
    /// Maximum accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Per-provider secret override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name as registered (case-insensitive).
    pub name: String,
    /// Override secret; falls back to `ingest.default_secret` when absent.
    pub secret: Option<String>,
    /// Set to `false` to skip signature verification for this provider.
    #[serde(default = "default_true")]
    pub verify: bool,
}

fn default_true() -> bool {
    true
}

/// Live delivery tuning. Applied at startup only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Buffer of the persistence → publisher queue.
    #[serde(default = "default_publish_buffer")]
    pub publish_buffer: usize,
    /// Per-topic broadcast buffer on the bus.
    #[serde(default = "default_topic_capacity")]
    pub topic_capacity: usize,
    /// Per-connection outbox; a full outbox skips messages for that
    /// connection only.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
    /// Seconds between server pings on a live connection.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    /// Seconds of silence after which a connection is considered dead.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            publish_buffer: default_publish_buffer(),
            topic_capacity: default_topic_capacity(),
            outbox_capacity: default_outbox_capacity(),
            heartbeat_secs: default_heartbeat_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_publish_buffer() -> usize {
    256
}

fn default_topic_capacity() -> usize {
    256
}

fn default_outbox_capacity() -> usize {
    64
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    75
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:3000"

[admin]
secret = "admin-secret"

[ingest]
default_secret = "shared-secret"

[[providers]]
name = "opta"
secret = "opta-secret"

[[providers]]
name = "wyscout"
verify = false

[delivery]
outbox_capacity = 16
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 3000);
        assert_eq!(config.ingest.default_secret, "shared-secret");
        assert_eq!(config.ingest.max_body_bytes, 1024 * 1024);
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].secret.as_deref(), Some("opta-secret"));
        assert!(config.providers[0].verify);
        assert!(!config.providers[1].verify);
        assert_eq!(config.delivery.outbox_capacity, 16);
        assert_eq!(config.delivery.heartbeat_secs, 30);
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let toml_str = r#"
[server]

[admin]
secret = "admin-secret"

[ingest]
default_secret = ""
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen.port(), 8080);
        assert!(config.providers.is_empty());
        assert_eq!(config.delivery.publish_buffer, 256);
    }
}
