//! Experiments and sweeps views.
//!
//! Each view owns its selection state and its chart board, and applies one
//! user event at a time: every handler takes `&mut self` and awaits its
//! backend fetch before re-rendering. Snapshots expose what the page shows.

use crate::backend::Backend;
use crate::best_value::{self, BestValue};
use crate::chart::{ChartBoard, ChartSeries, ChartStyle, ChartSurface, build_chart};
use crate::config::ViewerConfig;
use crate::pagination::{PageDelta, PageState};
use crate::render;
use crate::selection::{
    self, ControlState, SelectionEffect, SelectionMode, SelectionState, Transition,
};
use crate::series::MetricStore;
use crate::sweep::{SweepData, SweepSummary};
use crate::table::{self, TableSpec};
use serde::Serialize;
use std::ops::Range;
use tracing::{debug, info, warn};

/// Shown instead of charts when there are no experiments.
pub const NO_EXPERIMENTS: &str = "No experiment logs available.";
/// Shown instead of the sweep panels when there are no sweeps.
pub const NO_SWEEPS: &str = "No sweeps logs available.";
/// Panel of the single sweep chart.
pub const SWEEP_PANEL: &str = "sweep-metric";

/// One rendered chart panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelSnapshot {
    pub panel: String,
    /// Chart.js config.
    pub config: serde_json::Value,
}

fn panels<S: ChartSurface>(board: &ChartBoard<S>) -> Vec<PanelSnapshot> {
    board
        .panels()
        .zip(board.specs())
        .map(|(panel, spec)| PanelSnapshot {
            panel: panel.to_string(),
            config: render::chart_config(spec),
        })
        .collect()
}

/// Everything the experiments page displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentsSnapshot {
    pub placeholder: Option<String>,
    pub mode: SelectionMode,
    pub selected_ids: Vec<String>,
    pub controls: Vec<ControlState>,
    pub metrics: Vec<String>,
    pub charts: Vec<PanelSnapshot>,
    pub last_error: Option<String>,
}

/// Per-experiment metric charts with single and compare selection.
pub struct ExperimentsView<S: ChartSurface> {
    ids: Vec<String>,
    store: MetricStore,
    selection: SelectionState,
    board: ChartBoard<S>,
    style: ChartStyle,
    placeholder: Option<&'static str>,
    last_error: Option<String>,
}

impl<S: ChartSurface> ExperimentsView<S> {
    pub fn new(surface: S, style: ChartStyle) -> Self {
        Self {
            ids: Vec::new(),
            store: MetricStore::new(),
            selection: SelectionState::new(),
            board: ChartBoard::new(surface),
            style,
            placeholder: None,
            last_error: None,
        }
    }

    pub fn from_config(surface: S, config: &ViewerConfig) -> Self {
        Self::new(surface, ChartStyle::experiments(&config.charts))
    }

    /// Load the experiment list and show the first one.
    pub async fn open(&mut self, backend: &dyn Backend, ids: Vec<String>) {
        self.board.clear();
        self.selection = SelectionState::new();
        self.last_error = None;
        self.ids = ids;
        info!(count = self.ids.len(), "Experiments view opened");

        let Some(first) = self.ids.first().cloned() else {
            self.placeholder = Some(NO_EXPERIMENTS);
            return;
        };
        self.placeholder = None;
        self.choose(backend, &first).await;
    }

    /// Radio control: show only `id`.
    pub async fn choose(&mut self, backend: &dyn Backend, id: &str) {
        if !self.is_listed(id) {
            return;
        }
        let transition = selection::choose(std::mem::take(&mut self.selection), id);
        self.apply(backend, transition).await;
    }

    /// Checkbox control: add `id` to the comparison or remove it.
    pub async fn toggle(&mut self, backend: &dyn Backend, id: &str, checked: bool) {
        if !self.is_listed(id) {
            return;
        }
        let transition = selection::toggle(std::mem::take(&mut self.selection), id, checked);
        self.apply(backend, transition).await;
    }

    fn is_listed(&self, id: &str) -> bool {
        let listed = self.ids.iter().any(|i| i == id);
        if !listed {
            warn!(experiment_id = id, "Ignoring event for unknown experiment");
        }
        listed
    }

    async fn apply(&mut self, backend: &dyn Backend, transition: Transition) {
        self.selection = transition.state;
        let mut render = false;
        for effect in transition.effects {
            match effect {
                SelectionEffect::Fetch(id) => self.fetch(backend, &id).await,
                SelectionEffect::Evict(id) => debug!(experiment_id = %id, "Evicted experiment"),
                SelectionEffect::Render => render = true,
                SelectionEffect::ClearCharts => self.board.clear(),
            }
        }
        if self.selection.selected_ids().is_empty() {
            self.board.clear();
        } else if render {
            self.render();
        }
    }

    async fn fetch(&mut self, backend: &dyn Backend, id: &str) {
        debug!(experiment_id = id, "Fetching experiment");
        match backend.experiment_data(id).await {
            Ok(payload) => {
                let record = self.store.ingest(id, payload);
                self.selection.store_record(record);
                self.last_error = None;
            }
            Err(e) => {
                warn!(experiment_id = id, error = %e, "Experiment fetch failed; deselecting");
                self.last_error = Some(e.to_string());
                let failed = selection::toggle(std::mem::take(&mut self.selection), id, false);
                self.selection = failed.state;
            }
        }
    }

    fn render(&mut self) {
        let records = self.selection.records();
        for metric in self.store.known_metrics().iter() {
            let inputs: Vec<ChartSeries> = records
                .iter()
                .map(|r| ChartSeries::new(&r.id, r.metric(metric)))
                .collect();
            let spec = build_chart(&inputs, metric, &self.style);
            self.board.redraw(metric, spec);
        }
        debug!(
            selected = records.len(),
            panels = self.board.len(),
            "Experiments rendered"
        );
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn board(&self) -> &ChartBoard<S> {
        &self.board
    }

    pub fn snapshot(&self) -> ExperimentsSnapshot {
        ExperimentsSnapshot {
            placeholder: self.placeholder.map(str::to_string),
            mode: self.selection.mode(),
            selected_ids: self.selection.selected_ids().to_vec(),
            controls: self.selection.controls(&self.ids),
            metrics: self.store.known_metrics().iter().map(str::to_string).collect(),
            charts: panels(&self.board),
            last_error: self.last_error.clone(),
        }
    }
}

/// Pager button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PagerSnapshot {
    pub current_page: usize,
    pub max_page: usize,
    pub prev_disabled: bool,
    pub next_disabled: bool,
}

impl From<&PageState> for PagerSnapshot {
    fn from(page: &PageState) -> Self {
        Self {
            current_page: page.current_page(),
            max_page: page.max_page(),
            prev_disabled: page.prev_disabled(),
            next_disabled: page.next_disabled(),
        }
    }
}

/// Everything the sweeps page displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepsSnapshot {
    pub placeholder: Option<String>,
    pub sweep_ids: Vec<String>,
    pub selected: Option<String>,
    pub summary: Option<SweepSummary>,
    pub metrics: Vec<String>,
    pub current_metric: Option<String>,
    pub early_stopping: bool,
    pub table: Option<TableSpec>,
    pub table_html: Option<String>,
    pub pager: Option<PagerSnapshot>,
    pub chart: Option<PanelSnapshot>,
    pub last_error: Option<String>,
}

struct LoadedSweep {
    id: String,
    data: SweepData,
    summary: SweepSummary,
    store: MetricStore,
    early_stopping: bool,
    best_values: Vec<BestValue>,
    page: PageState,
    metric: Option<String>,
    table: TableSpec,
}

/// One sweep at a time: description, paged run table, and a metric chart of
/// the runs on the current page.
pub struct SweepsView<S: ChartSurface> {
    ids: Vec<String>,
    board: ChartBoard<S>,
    style: ChartStyle,
    page_size: usize,
    loaded: Option<LoadedSweep>,
    placeholder: Option<&'static str>,
    last_error: Option<String>,
}

impl<S: ChartSurface> SweepsView<S> {
    pub fn new(surface: S, style: ChartStyle, page_size: usize) -> Self {
        Self {
            ids: Vec::new(),
            board: ChartBoard::new(surface),
            style,
            page_size,
            loaded: None,
            placeholder: None,
            last_error: None,
        }
    }

    pub fn from_config(surface: S, config: &ViewerConfig) -> Self {
        Self::new(
            surface,
            ChartStyle::sweeps(&config.charts),
            config.runs.page_size,
        )
    }

    /// Load the sweep list and select the first sweep.
    pub async fn open(&mut self, backend: &dyn Backend, ids: Vec<String>) {
        self.board.clear();
        self.loaded = None;
        self.last_error = None;
        self.ids = ids;
        info!(count = self.ids.len(), "Sweeps view opened");

        let Some(first) = self.ids.first().cloned() else {
            self.placeholder = Some(NO_SWEEPS);
            return;
        };
        self.placeholder = None;
        self.select(backend, &first).await;
    }

    /// Fetch and show sweep `id`, starting on page 1.
    pub async fn select(&mut self, backend: &dyn Backend, id: &str) {
        if !self.ids.iter().any(|i| i == id) {
            warn!(sweep_id = id, "Ignoring selection of unknown sweep");
            return;
        }
        debug!(sweep_id = id, "Fetching sweep");
        let data = match backend.sweep_data(id).await {
            Ok(data) => data,
            Err(e) => {
                warn!(sweep_id = id, error = %e, "Sweep fetch failed");
                self.last_error = Some(e.to_string());
                self.loaded = None;
                self.board.clear();
                return;
            }
        };
        self.last_error = None;
        self.loaded = Some(self.load(id, data));
        self.refresh();
    }

    fn load(&self, id: &str, mut data: SweepData) -> LoadedSweep {
        let config = &data.sweep_config;
        let optimization_metric = config.optimization_metric.as_deref();
        let goal = config.optimization_goal;

        let mut store = MetricStore::new();
        for run in &data.experiment_data {
            store.register_names(run.metric_names());
        }

        let early_stopping =
            best_value::early_stopping_active(&data.experiment_data, optimization_metric);
        let best_values = data
            .experiment_data
            .iter()
            .map(|run| match optimization_metric {
                Some(metric) => best_value::resolve(run, metric, goal),
                None => BestValue::Unavailable,
            })
            .collect();

        let known = store.known_metrics();
        let metric = optimization_metric
            .filter(|m| known.contains(m))
            .or_else(|| known.first())
            .map(str::to_string);
        if let Some(metric) = &metric {
            backfill(&mut data, metric);
        }

        let summary = SweepSummary::from_config(&data.sweep_config);
        let page = PageState::new(data.experiment_data.len(), self.page_size);
        info!(
            sweep_id = id,
            runs = data.experiment_data.len(),
            early_stopping,
            "Sweep loaded"
        );
        LoadedSweep {
            id: id.to_string(),
            data,
            summary,
            store,
            early_stopping,
            best_values,
            page,
            metric,
            table: TableSpec::default(),
        }
    }

    /// Move one page of runs.
    pub fn goto(&mut self, delta: PageDelta) {
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        loaded.page = loaded.page.goto(delta);
        debug!(page = loaded.page.current_page(), "Sweep page changed");
        self.refresh();
    }

    /// Switch the charted metric. Returns `false` if the sweep never logged it.
    pub fn choose_metric(&mut self, metric: &str) -> bool {
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };
        if !loaded.store.known_metrics().contains(metric) {
            warn!(sweep_id = %loaded.id, metric, "Ignoring unknown sweep metric");
            return false;
        }
        backfill(&mut loaded.data, metric);
        loaded.metric = Some(metric.to_string());
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let Some(loaded) = self.loaded.as_mut() else {
            self.board.clear();
            return;
        };
        let range = loaded.page.range();
        let config = &loaded.data.sweep_config;
        let sampled = page_slice(&config.sampled_hyperparameters, &range);
        let best = page_slice(&loaded.best_values, &range);
        loaded.table = table::build_run_table(
            &config.hyperparameters,
            config.optimization_metric.as_deref(),
            loaded.early_stopping,
            loaded.page.first_item_number(),
            sampled,
            best,
        );

        let Some(metric) = loaded.metric.as_deref() else {
            self.board.clear();
            return;
        };
        let runs = page_slice(&loaded.data.experiment_data, &range);
        let labels: Vec<String> = (range.start..range.start + runs.len())
            .map(|i| format!("Run {}", i + 1))
            .collect();
        let inputs: Vec<ChartSeries> = runs
            .iter()
            .zip(&labels)
            .map(|(run, label)| ChartSeries::new(label, run.series(metric)))
            .collect();
        let spec = build_chart(&inputs, metric, &self.style);
        self.board.redraw(SWEEP_PANEL, spec);
    }

    pub fn board(&self) -> &ChartBoard<S> {
        &self.board
    }

    pub fn snapshot(&self) -> SweepsSnapshot {
        let loaded = self.loaded.as_ref();
        SweepsSnapshot {
            placeholder: self.placeholder.map(str::to_string),
            sweep_ids: self.ids.clone(),
            selected: loaded.map(|l| l.id.clone()),
            summary: loaded.map(|l| l.summary.clone()),
            metrics: loaded
                .map(|l| l.store.known_metrics().iter().map(str::to_string).collect())
                .unwrap_or_default(),
            current_metric: loaded.and_then(|l| l.metric.clone()),
            early_stopping: loaded.is_some_and(|l| l.early_stopping),
            table: loaded.map(|l| l.table.clone()),
            table_html: loaded.map(|l| render::render_table_html(&l.table)),
            pager: loaded.map(|l| PagerSnapshot::from(&l.page)),
            chart: panels(&self.board).into_iter().next(),
            last_error: self.last_error.clone(),
        }
    }
}

/// `items[range]`, clipped to the slice length.
fn page_slice<'a, T>(items: &'a [T], range: &Range<usize>) -> &'a [T] {
    let end = range.end.min(items.len());
    let start = range.start.min(end);
    &items[start..end]
}

fn backfill(data: &mut SweepData, metric: &str) {
    let filled = data
        .experiment_data
        .iter_mut()
        .filter_map(|run| run.backfill(metric).then_some(()))
        .count();
    if filled > 0 {
        debug!(metric, runs = filled, "Backfilled missing sweep metric");
    }
}
