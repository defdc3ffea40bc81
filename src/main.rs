//! Shelfdrop server binary

use shelfdrop::{api, core, db};

use anyhow::Result;
use shelfdrop::core::ErrorContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting Shelfdrop v{}", shelfdrop::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        index = %config.index.base_url,
        download_client = %config.download_client.url,
        save_path = %config.download_client.save_path,
        webhook = config.notifications.webhook().is_some(),
        "Upstream configuration"
    );
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    info!(path = ?config.database.path, "Initializing database...");
    let db = Arc::new(
        db::DatabaseManager::new(
            &config.database.path,
            config.database.connection_pool_size,
            Duration::from_millis(config.database.busy_timeout),
        )
        .context("Failed to open database")?,
    );
    info!(pool_size = db.pool_size(), "Database initialized successfully");

    let server = api::ApiServer::new(config, db)?;
    server.serve().await?;

    info!("Shelfdrop shut down");
    Ok(())
}
