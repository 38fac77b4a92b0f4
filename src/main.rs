mod api;
mod config;
mod core;
mod db;
mod logger;
mod models;
mod repositories;
mod services;
mod utils;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cfg = config::Config::init_global()
        .map_err(anyhow::Error::msg)
        .context("Failed to load config")?;

    logger::init_logger(cfg)
        .map_err(anyhow::Error::msg)
        .context("Failed to init logger")?;

    db::init_global()
        .await
        .map_err(anyhow::Error::msg)
        .context("Failed to init database")?;

    cfg.print();
    if cfg.openrouter_api_key.is_empty() {
        warn!("OPENROUTER_API_KEY is not set; relay endpoints will answer 500");
    }

    let app = api::router();

    let host = cfg
        .host
        .parse::<IpAddr>()
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let addr = SocketAddr::new(host, cfg.port);
    info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
