//! Open Match Relay Server
//!
//! Real-time distribution pipeline for match events: accepts signed
//! provider webhooks, normalizes and durably records the events, and
//! fans them out to live websocket viewers grouped by match.

mod api;
mod config;
mod hub;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use hub::ConnectionHub;
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use omr_core::events::{TopicBus, publish_channel};
use omr_core::ingest::ProviderRegistry;
use omr_core::processors::EventPublisher;

/// Open Match Relay - real-time match event distribution
#[derive(Parser, Debug)]
#[command(name = "omr-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./omr-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting omr-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    let delivery = loaded_config.delivery.clone();
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Convert reloadable sections into the shared view
    let shared_config = loaded_config.into_shared();

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // The provider registry is read-only from here on.
    let registry = Arc::new(ProviderRegistry::with_standard_adapters());
    tracing::info!(providers = ?registry.names(), "Provider registry initialized");

    // Distribution plumbing: publish queue, topic bus, connection hub.
    let bus = TopicBus::new(delivery.topic_capacity);
    let hub = ConnectionHub::new(bus.clone(), delivery.outbox_capacity);
    let (publish_tx, publish_rx) = publish_channel(delivery.publish_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let publisher = EventPublisher::new(db_pool.clone(), bus, publish_rx, shutdown_rx);
    let publisher_handle = tokio::spawn(publisher.run());

    // Create application state
    let state = AppState::new(
        db_pool.clone(),
        registry,
        publish_tx,
        hub,
        shared_config,
        delivery,
    );

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the background tasks to stop
    shutdown_notify.notify_one();
    let _ = shutdown_tx.send(true);
    let _ = publisher_handle.await;

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
