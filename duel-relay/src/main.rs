use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use duel_relay::{config::Config, create_routes, hub::RoomHub, websocket::ConnectionManager};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting word duel relay...");

    let config = Arc::new(Config::from_env()?);
    let connection_manager = Arc::new(ConnectionManager::new());
    let hub = Arc::new(RoomHub::new(connection_manager.clone(), config.room_capacity));

    let routes = create_routes(connection_manager.clone(), hub.clone(), config.clone());

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_hub = hub.clone();
    let connection_timeout = config.connection_timeout();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let removed = cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            for connection_id in removed {
                cleanup_hub.leave(connection_id).await;
            }
        }
    });

    let ip: std::net::IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.host))?;

    let (addr, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown((ip, config.port), shutdown_signal())?;

    info!("Relay listening on {}. Press Ctrl+C to stop.", addr);
    server.await;
    info!("Relay shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let (mut sigint, mut sigterm) = match (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            _ => {
                tracing::error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }
}
