//! # runlens Core
//!
//! Viewer engine for logged ML experiments and hyperparameter sweeps.
//! Provides the metric series store, selection and paging state, best-value
//! resolution, chart and table builders, the backend client, configuration,
//! and the two page views that tie them together.

pub mod backend;
pub mod best_value;
pub mod chart;
pub mod config;
pub mod error;
pub mod keyed;
pub mod pagination;
pub mod render;
pub mod selection;
pub mod series;
pub mod sweep;
pub mod table;
pub mod view;

// Re-export commonly used types at the crate root.
pub use backend::{Backend, HttpBackend, MockBackend};
pub use best_value::BestValue;
pub use chart::{
    ChartBoard, ChartDataset, ChartHandle, ChartSeries, ChartSpec, ChartStyle, ChartSurface,
    RecordingSurface, Tooltip,
};
pub use config::{ViewerConfig, load_config};
pub use error::{ConfigError, FetchError, Result, ViewerError};
pub use keyed::OrderedMap;
pub use pagination::{PageDelta, PageState};
pub use selection::{SelectionEffect, SelectionMode, SelectionState, Transition};
pub use series::{ExperimentPayload, ExperimentRecord, MetricSample, MetricSeries, MetricStore};
pub use sweep::{OptimizationGoal, SweepConfig, SweepData, SweepRunLog, SweepSummary};
pub use table::TableSpec;
pub use view::{ExperimentsSnapshot, ExperimentsView, SweepsSnapshot, SweepsView};
