//! quarry server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol
//! on stdout.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod pipeline;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = Arc::new(quarry_core::AppConfig::load().context("loading configuration")?);

    tracing::info!("opening store at {}", config.db_path.display());
    let store = quarry_client::StoreDb::open(&config.db_path)
        .await
        .context("opening store")?;

    let pipeline = Arc::new(pipeline::Pipeline::new(Arc::clone(&config), store));

    // Periodic expired-entry sweep, owned by the process lifecycle rather
    // than any individual request.
    let sweep_cache = Arc::clone(&pipeline.cache);
    let sweep_interval = Duration::from_secs(config.cache_sweep_secs);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(sweep_interval);
        tick.tick().await;
        loop {
            tick.tick().await;
            let removed = sweep_cache.cleanup().await;
            if removed > 0 {
                tracing::debug!("cache sweep removed {} expired entries", removed);
            }
        }
    });

    tracing::info!("Starting quarry server on stdio transport");

    let handler = handler::QuarryServer::new(pipeline);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
