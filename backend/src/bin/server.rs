//! Session analytics HTTP server binary.
//!
//! Loads the configuration, sets up the in-memory dataset store and the HTTP
//! router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin session-analytics-server
//!
//! # With a configuration file
//! SESSION_ANALYTICS_CONFIG=session-analytics.toml cargo run --bin session-analytics-server
//! ```
//!
//! # Environment Variables
//!
//! - `SESSION_ANALYTICS_CONFIG`: path to the TOML configuration file
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)

use anyhow::Context;
use std::env;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use session_analytics::config::AppConfig;
use session_analytics::db::{DatasetRepository, LocalRepository};
use session_analytics::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting session analytics server");

    let config = AppConfig::load().context("Failed to load configuration")?;
    let schema = config
        .schema_descriptor()
        .context("Invalid schema configuration")?;
    info!(
        "Schema: duration='{}', weight='{}', reporting dimension '{}'",
        schema.duration.column, schema.weight.column, schema.reporting
    );

    let repository = Arc::new(LocalRepository::new()) as Arc<dyn DatasetRepository>;
    let addr = config.server.addr();

    let app = create_router(AppState::new(repository, config));

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
