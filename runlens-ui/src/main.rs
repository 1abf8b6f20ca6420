//! runlens UI: dashboard host.
//!
//! Loads the viewer configuration, opens the configured experiments and
//! sweeps against the log server, and serves the REST API together with the
//! static frontend at `http://<host>:<port>/`.

use anyhow::Context;
use runlens_core::backend::{Backend, HttpBackend};
use runlens_core::config::load_config;
use runlens_ui::{Dashboard, resolve_frontend_dir, router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Human-readable layer for stderr (RUST_LOG overrides the default)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    // JSON file layer for structured logging
    let log_dir = directories::ProjectDirs::from("dev", "runlens", "runlens")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "runlens.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;
    config.validate()?;

    let backend: Arc<dyn Backend> =
        Arc::new(HttpBackend::new(&config.backend).context("Failed to create backend client")?);
    tracing::info!(backend = %config.backend.base_url, "Using log server");

    let mut dashboard = Dashboard::new(backend, &config);
    dashboard
        .open_experiments(config.dashboard.experiment_ids.clone())
        .await;
    dashboard.open_sweeps(config.dashboard.sweep_ids.clone()).await;
    let shared = dashboard.shared();

    let frontend_dir = resolve_frontend_dir(config.dashboard.frontend_dir.as_ref());
    tracing::info!("Serving frontend from: {}", frontend_dir.display());

    // API routes take priority, static files are the fallback
    let index_file = frontend_dir.join("index.html");
    let static_service =
        ServeDir::new(&frontend_dir).not_found_service(ServeFile::new(&index_file));
    let app = router(shared)
        .fallback_service(static_service)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.dashboard.host, config.dashboard.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!("Starting dashboard on http://{}", addr);

    axum::serve(listener, app).await.context("Dashboard server error")?;
    Ok(())
}
