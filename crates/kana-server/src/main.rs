//! Memory Kana server: time authority, session channel and scoreboard.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod authority;
mod config;
mod http;
mod protocol;
mod server;
mod session;
mod store;

use config::ServerConfig;
use server::ServerState;
use store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    info!("Starting Memory Kana server...");

    let state = Arc::new(ServerState::new(config.clone(), Arc::new(MemoryStore::new())));

    tokio::try_join!(
        http::run_http(config.http_addr, Arc::clone(&state)),
        server::run_server(config.ws_addr, state),
    )?;
    Ok(())
}
