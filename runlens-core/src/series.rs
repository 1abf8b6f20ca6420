//! Metric series store.
//!
//! Normalizes raw per-metric log entries into column-aligned series and
//! tracks every metric name seen during the session.

use crate::keyed::OrderedMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One logged event: elapsed seconds since run start, step, value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub time: f64,
    pub step: u64,
    pub value: f64,
}

impl MetricSample {
    pub fn new(time: f64, step: u64, value: f64) -> Self {
        Self { time, step, value }
    }
}

/// Samples of one metric within one run, stored as three aligned columns.
///
/// On the wire this is a JSON array of `{time, step, value}` objects in
/// logging order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<MetricSample>", into = "Vec<MetricSample>")]
pub struct MetricSeries {
    timestamps: Vec<f64>,
    steps: Vec<u64>,
    values: Vec<f64>,
}

impl MetricSeries {
    /// The display-only stand-in for a metric a run never logged.
    pub fn placeholder() -> Self {
        Self::from(vec![MetricSample::new(0.0, 0, 0.0)])
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn steps(&self) -> &[u64] {
        &self.steps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_step(&self) -> Option<u64> {
        self.steps.last().copied()
    }

    pub fn sample(&self, index: usize) -> Option<MetricSample> {
        Some(MetricSample {
            time: *self.timestamps.get(index)?,
            step: *self.steps.get(index)?,
            value: *self.values.get(index)?,
        })
    }

    /// Whether steps never decrease along the series.
    pub fn is_step_monotonic(&self) -> bool {
        self.steps.windows(2).all(|w| w[0] <= w[1])
    }
}

impl From<Vec<MetricSample>> for MetricSeries {
    fn from(samples: Vec<MetricSample>) -> Self {
        let mut series = Self {
            timestamps: Vec::with_capacity(samples.len()),
            steps: Vec::with_capacity(samples.len()),
            values: Vec::with_capacity(samples.len()),
        };
        for s in samples {
            series.timestamps.push(s.time);
            series.steps.push(s.step);
            series.values.push(s.value);
        }
        series
    }
}

impl From<MetricSeries> for Vec<MetricSample> {
    fn from(series: MetricSeries) -> Self {
        series
            .timestamps
            .into_iter()
            .zip(series.steps)
            .zip(series.values)
            .map(|((time, step), value)| MetricSample { time, step, value })
            .collect()
    }
}

/// Raw `/get_experiment_data/{id}` payload: metric name -> samples.
pub type ExperimentPayload = OrderedMap<MetricSeries>;

/// Logged metrics of one experiment, keyed by metric name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub id: String,
    pub metrics: OrderedMap<MetricSeries>,
}

impl ExperimentRecord {
    /// The record handed back when the backend has nothing for `id`.
    pub fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            metrics: OrderedMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn metric(&self, name: &str) -> Option<&MetricSeries> {
        self.metrics.get(name)
    }
}

/// Grow-only, insertion-ordered set of metric names seen this session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KnownMetrics {
    names: Vec<String>,
}

impl KnownMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name. Returns `true` if it was not known before.
    pub fn register(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Turns backend payloads into records and feeds the known-metric set.
#[derive(Debug, Default)]
pub struct MetricStore {
    known: KnownMetrics,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn known_metrics(&self) -> &KnownMetrics {
        &self.known
    }

    /// Build a record for `id`, registering its metric names.
    pub fn ingest(&mut self, id: &str, payload: ExperimentPayload) -> ExperimentRecord {
        for (name, series) in payload.iter() {
            if self.known.register(name) {
                debug!(metric = name, "Registered new metric");
            }
            if !series.is_step_monotonic() {
                warn!(
                    experiment_id = id,
                    metric = name,
                    "Metric steps decrease within series; keeping logged order"
                );
            }
        }
        ExperimentRecord {
            id: id.to_string(),
            metrics: payload,
        }
    }

    /// Register names without building a record (sweep runs use this).
    pub fn register_names<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.known.register(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> ExperimentPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_series_columns_are_aligned() {
        let p = payload(
            r#"{"loss": [
                {"time": 0.5, "step": 0, "value": 2.0},
                {"time": 1.5, "step": 1, "value": 1.5},
                {"time": 2.5, "step": 2, "value": 1.1}
            ]}"#,
        );
        let loss = p.get("loss").unwrap();
        assert_eq!(loss.timestamps(), &[0.5, 1.5, 2.5]);
        assert_eq!(loss.steps(), &[0, 1, 2]);
        assert_eq!(loss.values(), &[2.0, 1.5, 1.1]);
        assert_eq!(loss.last_step(), Some(2));
        assert_eq!(loss.sample(1), Some(MetricSample::new(1.5, 1, 1.5)));
        assert_eq!(loss.sample(3), None);
    }

    #[test]
    fn test_series_serializes_as_sample_list() {
        let series = MetricSeries::from(vec![MetricSample::new(1.0, 0, 0.5)]);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"time": 1.0, "step": 0, "value": 0.5}])
        );
    }

    #[test]
    fn test_ingest_registers_metrics() {
        let mut store = MetricStore::new();
        let record = store.ingest(
            "exp-1",
            payload(r#"{"loss": [], "accuracy": [{"time": 1, "step": 0, "value": 0.3}]}"#),
        );
        assert_eq!(record.id, "exp-1");
        assert_eq!(record.metrics.len(), 2);
        let known: Vec<&str> = store.known_metrics().iter().collect();
        assert_eq!(known, vec!["loss", "accuracy"]);
    }

    #[test]
    fn test_known_metrics_only_grow() {
        let mut store = MetricStore::new();
        store.ingest("a", payload(r#"{"loss": []}"#));
        store.ingest("b", payload(r#"{"f1": [], "loss": []}"#));
        store.ingest("c", payload("{}"));
        let known: Vec<&str> = store.known_metrics().iter().collect();
        assert_eq!(known, vec!["loss", "f1"]);
    }

    #[test]
    fn test_empty_record() {
        let record = ExperimentRecord::empty("missing");
        assert!(record.is_empty());
        assert!(record.metric("loss").is_none());
    }

    #[test]
    fn test_non_monotonic_steps_are_kept() {
        let mut store = MetricStore::new();
        let record = store.ingest(
            "exp",
            payload(
                r#"{"loss": [
                    {"time": 0, "step": 3, "value": 1},
                    {"time": 1, "step": 1, "value": 2}
                ]}"#,
            ),
        );
        let loss = record.metric("loss").unwrap();
        assert!(!loss.is_step_monotonic());
        assert_eq!(loss.steps(), &[3, 1]);
    }

    #[test]
    fn test_placeholder_series() {
        let p = MetricSeries::placeholder();
        assert_eq!(p.len(), 1);
        assert_eq!(p.values(), &[0.0]);
        assert_eq!(p.last_step(), Some(0));
    }
}
