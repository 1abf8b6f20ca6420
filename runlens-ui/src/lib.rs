//! runlens UI: dashboard state and REST routes.
//!
//! The dashboard owns one experiments view and one sweeps view, both drawing
//! onto in-memory chart surfaces. The browser posts control events and
//! receives the resulting page snapshot as JSON.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use runlens_core::backend::Backend;
use runlens_core::chart::RecordingSurface;
use runlens_core::config::ViewerConfig;
use runlens_core::pagination::PageDelta;
use runlens_core::view::{ExperimentsSnapshot, ExperimentsView, SweepsSnapshot, SweepsView};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Both views of one dashboard session.
pub struct Dashboard {
    backend: Arc<dyn Backend>,
    experiments: ExperimentsView<RecordingSurface>,
    sweeps: SweepsView<RecordingSurface>,
    started: Instant,
}

/// Dashboard behind the lock that serializes every event.
pub type SharedDashboard = Arc<Mutex<Dashboard>>;

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>, config: &ViewerConfig) -> Self {
        Self {
            backend,
            experiments: ExperimentsView::from_config(RecordingSurface::new(), config),
            sweeps: SweepsView::from_config(RecordingSurface::new(), config),
            started: Instant::now(),
        }
    }

    pub fn shared(self) -> SharedDashboard {
        Arc::new(Mutex::new(self))
    }

    pub async fn open_experiments(&mut self, ids: Vec<String>) -> ExperimentsSnapshot {
        let backend = Arc::clone(&self.backend);
        self.experiments.open(backend.as_ref(), ids).await;
        self.experiments.snapshot()
    }

    pub async fn choose_experiment(&mut self, id: &str) -> ExperimentsSnapshot {
        let backend = Arc::clone(&self.backend);
        self.experiments.choose(backend.as_ref(), id).await;
        self.experiments.snapshot()
    }

    pub async fn toggle_experiment(&mut self, id: &str, checked: bool) -> ExperimentsSnapshot {
        let backend = Arc::clone(&self.backend);
        self.experiments.toggle(backend.as_ref(), id, checked).await;
        self.experiments.snapshot()
    }

    pub async fn open_sweeps(&mut self, ids: Vec<String>) -> SweepsSnapshot {
        let backend = Arc::clone(&self.backend);
        self.sweeps.open(backend.as_ref(), ids).await;
        self.sweeps.snapshot()
    }

    pub async fn select_sweep(&mut self, id: &str) -> SweepsSnapshot {
        let backend = Arc::clone(&self.backend);
        self.sweeps.select(backend.as_ref(), id).await;
        self.sweeps.snapshot()
    }

    pub fn experiments(&self) -> &ExperimentsView<RecordingSurface> {
        &self.experiments
    }

    pub fn sweeps(&self) -> &SweepsView<RecordingSurface> {
        &self.sweeps
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Body of the `open` endpoints.
#[derive(Debug, Deserialize, Serialize)]
pub struct OpenRequest {
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Body of `choose` and `select`.
#[derive(Debug, Deserialize, Serialize)]
pub struct IdRequest {
    pub id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ToggleRequest {
    pub id: String,
    pub checked: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PageRequest {
    pub delta: PageDelta,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MetricRequest {
    pub metric: String,
}

/// REST routes. Static files are added by the binary as a fallback.
pub fn router(shared: SharedDashboard) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/experiments", get(experiments_handler))
        .route("/api/experiments/open", post(open_experiments_handler))
        .route("/api/experiments/choose", post(choose_experiment_handler))
        .route("/api/experiments/toggle", post(toggle_experiment_handler))
        .route("/api/sweeps", get(sweeps_handler))
        .route("/api/sweeps/open", post(open_sweeps_handler))
        .route("/api/sweeps/select", post(select_sweep_handler))
        .route("/api/sweeps/page", post(page_handler))
        .route("/api/sweeps/metric", post(metric_handler))
        .with_state(shared)
}

/// Health check endpoint.
async fn health_handler(State(dashboard): State<SharedDashboard>) -> impl IntoResponse {
    let dashboard = dashboard.lock().await;
    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": dashboard.uptime_secs(),
        "experiment_charts": dashboard.experiments().board().len(),
        "sweep_charts": dashboard.sweeps().board().len(),
    });
    Json(body)
}

async fn experiments_handler(State(dashboard): State<SharedDashboard>) -> Json<ExperimentsSnapshot> {
    Json(dashboard.lock().await.experiments().snapshot())
}

async fn open_experiments_handler(
    State(dashboard): State<SharedDashboard>,
    Json(req): Json<OpenRequest>,
) -> Json<ExperimentsSnapshot> {
    Json(dashboard.lock().await.open_experiments(req.ids).await)
}

async fn choose_experiment_handler(
    State(dashboard): State<SharedDashboard>,
    Json(req): Json<IdRequest>,
) -> Json<ExperimentsSnapshot> {
    Json(dashboard.lock().await.choose_experiment(&req.id).await)
}

async fn toggle_experiment_handler(
    State(dashboard): State<SharedDashboard>,
    Json(req): Json<ToggleRequest>,
) -> Json<ExperimentsSnapshot> {
    Json(
        dashboard
            .lock()
            .await
            .toggle_experiment(&req.id, req.checked)
            .await,
    )
}

async fn sweeps_handler(State(dashboard): State<SharedDashboard>) -> Json<SweepsSnapshot> {
    Json(dashboard.lock().await.sweeps().snapshot())
}

async fn open_sweeps_handler(
    State(dashboard): State<SharedDashboard>,
    Json(req): Json<OpenRequest>,
) -> Json<SweepsSnapshot> {
    Json(dashboard.lock().await.open_sweeps(req.ids).await)
}

async fn select_sweep_handler(
    State(dashboard): State<SharedDashboard>,
    Json(req): Json<IdRequest>,
) -> Json<SweepsSnapshot> {
    Json(dashboard.lock().await.select_sweep(&req.id).await)
}

async fn page_handler(
    State(dashboard): State<SharedDashboard>,
    Json(req): Json<PageRequest>,
) -> Json<SweepsSnapshot> {
    let mut dashboard = dashboard.lock().await;
    dashboard.sweeps.goto(req.delta);
    Json(dashboard.sweeps.snapshot())
}

async fn metric_handler(
    State(dashboard): State<SharedDashboard>,
    Json(req): Json<MetricRequest>,
) -> impl IntoResponse {
    let mut dashboard = dashboard.lock().await;
    if !dashboard.sweeps.choose_metric(&req.metric) {
        let body = serde_json::json!({
            "error": format!("Metric '{}' is not logged by the selected sweep", req.metric),
        });
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }
    Json(dashboard.sweeps.snapshot()).into_response()
}

/// Resolve the path to the `frontend/` directory containing static assets.
///
/// Checks the configured directory first, then `./frontend` next to the
/// executable, then the workspace development layout.
pub fn resolve_frontend_dir(configured: Option<&PathBuf>) -> PathBuf {
    if let Some(dir) = configured {
        if dir.join("index.html").exists() {
            return dir.clone();
        }
        tracing::warn!(dir = %dir.display(), "Configured frontend dir has no index.html");
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(exe_dir) = exe.parent()
    {
        let p = exe_dir.join("frontend");
        if p.join("index.html").exists() {
            return p;
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        for candidate in ["runlens-ui/frontend", "frontend"] {
            let p = cwd.join(candidate);
            if p.join("index.html").exists() {
                return p;
            }
        }
    }

    // Let ServeDir answer 404 if nothing was found.
    PathBuf::from("runlens-ui/frontend")
}
