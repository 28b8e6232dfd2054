//! # homefin-server
//!
//! HTTP invoice service: token-authenticated JSON API over the SQLite store,
//! weekly billing and PDF generation, a monthly invoice email, and the
//! static web UI.

pub mod auth;
pub mod email;
pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use homefin_common::config::Config;
use homefin_db::Store;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Assembles the full application: the `/api` routes plus the static web UI
/// served from `webgui_dir` for every other path.
pub fn app(state: Arc<AppState>, webgui_dir: &Path) -> Router {
    if !webgui_dir.is_dir() {
        tracing::warn!(
            dir = %webgui_dir.display(),
            "web UI directory missing; only the API will answer"
        );
    }
    routes::api_router()
        .with_state(state)
        .fallback_service(ServeDir::new(webgui_dir).append_index_html_on_directories(true))
}

/// Loads the config, opens the store, and serves until SIGINT or SIGTERM.
///
/// `host` and `port` override the config file when given.
///
/// # Errors
///
/// Returns an error when startup fails; failures after the listener is up
/// only end individual requests.
pub async fn run(config_path: &Path, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    tracing::info!(config = %config_path.display(), "loading configuration");
    let config = Config::load(config_path)?;

    let store = Store::open(&config.database.path).await?;
    let users = auth::sync_users(&store, &config.allowed_users).await?;
    let purged = store.cleanup_expired_sessions().await?;
    if purged > 0 {
        tracing::info!(purged, "expired sessions removed");
    }

    let state = Arc::new(AppState::new(store, users));
    let application = app(state, &config.server.webgui_dir);

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(
        listener,
        application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    tracing::info!("server shut down");
    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                let _ = signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
