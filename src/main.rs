//! # Direct Chat Server
//!
//! Application entry point. Initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database pool and migrations
//! - HTTP/WebSocket server

use anyhow::Result;
use tracing::info;

use direct_chat::config::Settings;
use direct_chat::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    direct_chat::telemetry::init_tracing();

    info!("Starting Direct Chat Server...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
