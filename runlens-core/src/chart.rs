//! Line chart datasets for metric panels.
//!
//! [`build_chart`] turns a list of labelled series into a [`ChartSpec`] with a
//! shared step axis `[0, max_step]`. Points are placed at their logged step,
//! so sparse step logs cost nothing extra. Each dataset keeps the raw
//! timestamps and steps of its source series so a hovered point can be
//! described from the original log.
//! [`ChartBoard`] owns the live chart instances, one per panel.

use crate::config::ChartsConfig;
use crate::keyed::OrderedMap;
use crate::series::MetricSeries;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::debug;
use uuid::Uuid;

/// Visual settings shared by every chart of one view.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub palette: Vec<String>,
    pub dense_step_threshold: u64,
    pub point_radius: u32,
    pub border_width: u32,
    pub animation_ms: u64,
}

impl ChartStyle {
    fn with_palette(config: &ChartsConfig, palette: &[String]) -> Self {
        Self {
            palette: palette.to_vec(),
            dense_step_threshold: config.dense_step_threshold,
            point_radius: config.point_radius,
            border_width: config.border_width,
            animation_ms: config.animation_ms,
        }
    }

    /// Style for experiment comparison charts.
    pub fn experiments(config: &ChartsConfig) -> Self {
        Self::with_palette(config, &config.experiment_palette)
    }

    /// Style for sweep run charts.
    pub fn sweeps(config: &ChartsConfig) -> Self {
        Self::with_palette(config, &config.sweep_palette)
    }

    /// Color for the dataset at `index`, cycling through the palette.
    pub fn color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return "black";
        }
        &self.palette[index % self.palette.len()]
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self::experiments(&ChartsConfig::default())
    }
}

/// One input line: legend label and the series, if the source logged it.
#[derive(Debug, Clone, Copy)]
pub struct ChartSeries<'a> {
    pub label: &'a str,
    pub series: Option<&'a MetricSeries>,
}

impl<'a> ChartSeries<'a> {
    pub fn new(label: &'a str, series: Option<&'a MetricSeries>) -> Self {
        Self { label, series }
    }
}

/// A single line in a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub border_color: String,
    pub border_width: u32,
    /// Source seconds-since-start per point.
    pub timestamps: Vec<f64>,
    /// Source step per point.
    pub steps: Vec<u64>,
}

impl ChartDataset {
    /// `(step, value)` pairs in logging order.
    pub fn points(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.steps.iter().copied().zip(self.data.iter().copied())
    }
}

/// Hover text for one point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tooltip {
    pub title: String,
    pub label: String,
    pub footer: String,
}

/// Line chart of one metric across several sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// Metric name; also the chart title.
    pub title: String,
    /// Largest last step across datasets; `None` for an empty chart.
    pub max_step: Option<u64>,
    pub datasets: Vec<ChartDataset>,
    pub point_radius: u32,
    pub animation_ms: u64,
}

impl ChartSpec {
    /// Shared x-axis domain, from step 0 to the largest last step.
    pub fn step_domain(&self) -> Option<RangeInclusive<u64>> {
        self.max_step.map(|max| 0..=max)
    }

    /// Describe the point at `data_index` of dataset `dataset_index`.
    pub fn tooltip(&self, dataset_index: usize, data_index: usize) -> Option<Tooltip> {
        let dataset = self.datasets.get(dataset_index)?;
        let value = *dataset.data.get(data_index)?;
        let time = *dataset.timestamps.get(data_index)?;
        let step = *dataset.steps.get(data_index)?;
        Some(Tooltip {
            title: format!("{}: {value:.3}", self.title),
            label: format!("{}  Step: {step}", format_elapsed(time)),
            footer: dataset.label.clone(),
        })
    }

    /// Tooltips for every point, grouped by dataset.
    pub fn tooltips(&self) -> Vec<Vec<Tooltip>> {
        self.datasets
            .iter()
            .enumerate()
            .map(|(d, ds)| {
                (0..ds.data.len())
                    .filter_map(|i| self.tooltip(d, i))
                    .collect()
            })
            .collect()
    }
}

/// Build the chart of `metric` from `inputs`, in input order.
///
/// An input without the metric is drawn as a single zero point so its legend
/// entry stays put.
pub fn build_chart(inputs: &[ChartSeries<'_>], metric: &str, style: &ChartStyle) -> ChartSpec {
    let placeholder = MetricSeries::placeholder();
    let datasets: Vec<ChartDataset> = inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let series = input.series.unwrap_or(&placeholder);
            ChartDataset {
                label: input.label.to_string(),
                data: series.values().to_vec(),
                border_color: style.color(index).to_string(),
                border_width: style.border_width,
                timestamps: series.timestamps().to_vec(),
                steps: series.steps().to_vec(),
            }
        })
        .collect();

    let max_step = datasets
        .iter()
        .filter_map(|ds| ds.steps.last().copied())
        .max();
    let point_radius = match max_step {
        Some(max) if max > style.dense_step_threshold => 0,
        _ => style.point_radius,
    };

    ChartSpec {
        title: metric.to_string(),
        max_step,
        datasets,
        point_radius,
        animation_ms: style.animation_ms,
    }
}

/// Format seconds since run start for a tooltip.
///
/// The value is first rounded to two decimals. Under a minute it keeps them
/// (`"4.25s"`); above that it is floored to whole seconds (`"2m 5s"`,
/// `"1h 0m 12s"`).
pub fn format_elapsed(seconds: f64) -> String {
    let rounded = format!("{seconds:.2}");
    let value: f64 = rounded.parse().unwrap_or(seconds);
    if value < 60.0 {
        return format!("{rounded}s");
    }
    let total = value.floor() as u64;
    if value < 3600.0 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        let rest = total % 3600;
        format!("{}h {}m {}s", total / 3600, rest / 60, rest % 60)
    }
}

/// Opaque id of a live chart instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChartHandle(pub Uuid);

impl ChartHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChartHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Something that can display charts.
pub trait ChartSurface: Send {
    /// Create a chart in `panel` and return its handle.
    fn create(&mut self, panel: &str, spec: &ChartSpec) -> ChartHandle;
    /// Release a chart. Unknown handles are ignored.
    fn destroy(&mut self, handle: ChartHandle);
}

/// In-memory surface that keeps the last spec drawn in each panel.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    live: HashMap<ChartHandle, (String, ChartSpec)>,
    created: usize,
    destroyed: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chart spec shown in `panel`, if a chart lives there.
    pub fn chart(&self, panel: &str) -> Option<&ChartSpec> {
        self.live
            .values()
            .find(|(p, _)| p == panel)
            .map(|(_, spec)| spec)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn created(&self) -> usize {
        self.created
    }

    pub fn destroyed(&self) -> usize {
        self.destroyed
    }
}

impl ChartSurface for RecordingSurface {
    fn create(&mut self, panel: &str, spec: &ChartSpec) -> ChartHandle {
        let handle = ChartHandle::new();
        self.live.insert(handle, (panel.to_string(), spec.clone()));
        self.created += 1;
        handle
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }
}

/// Live charts of a view, at most one per panel.
#[derive(Debug)]
pub struct ChartBoard<S: ChartSurface> {
    surface: S,
    panels: OrderedMap<(ChartHandle, ChartSpec)>,
}

impl<S: ChartSurface> ChartBoard<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            panels: OrderedMap::new(),
        }
    }

    /// Replace the chart in `panel`, destroying the previous instance first.
    pub fn redraw(&mut self, panel: &str, spec: ChartSpec) -> ChartHandle {
        if let Some((old, _)) = self.panels.get(panel) {
            self.surface.destroy(*old);
        }
        let handle = self.surface.create(panel, &spec);
        debug!(panel, datasets = spec.datasets.len(), "Chart redrawn");
        self.panels.insert(panel, (handle, spec));
        handle
    }

    /// Destroy every chart.
    pub fn clear(&mut self) {
        let panels = std::mem::take(&mut self.panels);
        for (_, (handle, _)) in panels {
            self.surface.destroy(handle);
        }
    }

    pub fn spec(&self, panel: &str) -> Option<&ChartSpec> {
        self.panels.get(panel).map(|(_, spec)| spec)
    }

    /// Panels in the order they were first drawn since the last clear.
    pub fn panels(&self) -> impl Iterator<Item = &str> {
        self.panels.keys()
    }

    /// Every live spec, in panel order.
    pub fn specs(&self) -> impl Iterator<Item = &ChartSpec> {
        self.panels.values().map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
