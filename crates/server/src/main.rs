//! spritz server entry point.
//!
//! Boots the offline caching worker and serves it as an MCP server on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use spritz_client::{FetchConfig, Fetcher, HttpFetcher};
use spritz_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod context;
mod handler;
mod tools;
mod update;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.version_tag, db = %config.db_path.display(), "starting spritz on stdio transport");

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let ctx = Arc::new(context::ServerContext::open(config, fetcher.clone()).await?);
    ctx.register_worker(fetcher).await;
    let updates = ctx.spawn_updates();

    let handler = handler::SpritzServer::new(ctx);
    let server = serve_server(handler, stdio()).await?;
    server.waiting().await?;

    updates.abort();
    Ok(())
}
