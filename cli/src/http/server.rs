//! HTTP server lifecycle

use crate::http::{
    middleware::{create_middleware_stack, request_logger},
    routes::create_router,
    AppState,
};
use anyhow::Context;
use axum::middleware;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub command_timeout: Duration,
    /// Where the discovery file is written; `None` uses `~/.operator/servers`.
    pub state_dir: Option<PathBuf>,
}

pub async fn start_server_with_config(
    session_id: String,
    config: ServerConfig,
    state: AppState,
) -> anyhow::Result<()> {
    let state_dir = match &config.state_dir {
        Some(dir) => dir.clone(),
        None => get_servers_dir()?,
    };
    let state_file_path = create_state_file(&state_dir, &session_id, &config.host, config.port)
        .context("failed to write server state file")?;
    info!(path = %state_file_path.display(), "state file created");

    let app = create_router(state.clone())
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack(config.command_timeout));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, session_id = %session_id, "HTTP server listening");

    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => info!("Received Ctrl+C signal"),
                _ = shutdown_rx.recv() => info!("Received shutdown signal from API"),
                _ = wait_for_sigterm() => info!("Received SIGTERM signal"),
            }
            info!("Starting graceful shutdown...");
        })
        .await;

    if let Err(e) = fs::remove_file(&state_file_path) {
        warn!(error = %e, "failed to remove state file");
    } else {
        info!(path = %state_file_path.display(), "state file removed");
    }

    served.context("HTTP server error")?;
    info!("Server shutdown complete");
    Ok(())
}

fn create_state_file(
    dir: &Path,
    session_id: &str,
    host: &str,
    port: u16,
) -> Result<PathBuf, std::io::Error> {
    fs::create_dir_all(dir)?;
    let state_file = dir.join(format!("http-{port}.pid"));

    let mut file = fs::File::create(&state_file)?;
    writeln!(file, "session_id={session_id}")?;
    writeln!(file, "url=http://{host}:{port}")?;
    writeln!(file, "port={port}")?;
    writeln!(file, "pid={}", std::process::id())?;
    writeln!(file, "start_time={}", chrono::Local::now().to_rfc3339())?;

    Ok(state_file)
}

fn get_servers_dir() -> Result<PathBuf, std::io::Error> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "Home directory not found")
    })?;
    Ok(home_dir.join(".operator").join("servers"))
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
