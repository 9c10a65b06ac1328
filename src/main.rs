// src/main.rs
mod auth;
mod billing;
mod config;
mod database;
mod dtos;
mod error;
mod handlers;
mod middleware;
mod models;
mod notify;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::notify::LogNotifier;

// How many ports after PORT to try when it is taken.
const PORT_ATTEMPTS: u16 = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("milk_billing=debug,tower_http=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    let db_pool = database::create_pool(&config)
        .await
        .context("Failed to create database pool")?;
    database::run_migrations(&db_pool)
        .await
        .context("Failed to run migrations")?;

    let (host, base_port) = (config.host, config.port);
    let app_state = state::AppState::new(db_pool, config, Arc::new(LogNotifier));
    let app = routes::app(app_state);

    let listener = {
        let mut bound = None;
        for offset in 0..=PORT_ATTEMPTS {
            let port = base_port.saturating_add(offset);
            let addr = SocketAddr::from((host, port));
            match TcpListener::bind(addr).await {
                Ok(l) => {
                    bound = Some((l, addr));
                    break;
                }
                Err(e) => {
                    if offset == 0 {
                        tracing::warn!(%addr, error = %e, "Port in use, trying next");
                    }
                }
            }
        }
        let (listener, addr) = bound.with_context(|| {
            format!("Failed to bind to any port starting at {base_port} on {host}")
        })?;
        tracing::info!("Server running on {}{}", addr, routes::BASE_PATH);
        listener
    };

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
