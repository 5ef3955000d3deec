//! Croco Words server.

use anyhow::{Context, Result};
use clap::Parser;
use croco_server::{router, AppState, ServerConfig};
use croco_speller::YandexSpeller;
use croco_store::Store;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();

    // Initialize logging
    if config.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let store = Store::open(&config.db_path)
        .with_context(|| format!("Failed to open database: {}", config.db_path.display()))?;
    let (admin_user, admin_password) = config.admin_credentials();
    store
        .ensure_admin(&admin_user, &admin_password)
        .context("Failed to set up the admin account")?;
    store.purge_expired_sessions()?;

    let speller = YandexSpeller::new(config.speller_config()).context("Failed to build speller client")?;
    let state = AppState::new(store, Arc::new(speller)).with_max_upload_bytes(config.max_upload_bytes());
    let app = router(Arc::new(state));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
