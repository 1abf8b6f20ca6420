//! Hyperparameter sweep payloads.
//!
//! A sweep is served as its configuration (schema, optimization target,
//! sampled values per run) plus one metric log per run. Runs are free to
//! skip any metric, and the optimization fields carry the `"/"` marker when
//! the sweep ran without early stopping.

use crate::keyed::OrderedMap;
use crate::series::MetricSeries;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Wire marker for "not configured" in sweep configs and for unavailable values.
pub const NOT_APPLICABLE: &str = "/";

/// Shown in the sweep description in place of an unset optimization field.
pub const NO_EARLY_STOPPING: &str = "No early stopping was performed.";

/// Whether higher or lower values of the optimization metric are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationGoal {
    Max,
    Min,
}

impl OptimizationGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationGoal::Max => "max",
            OptimizationGoal::Min => "min",
        }
    }
}

impl std::fmt::Display for OptimizationGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a hyperparameter was sampled.
///
/// Anything other than `uniform` (including `null` from samplers that never
/// set a type) is treated as categorical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HyperparamKind {
    Uniform,
    #[default]
    Categorical,
}

impl<'de> Deserialize<'de> for HyperparamKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            Some(kind) if kind.eq_ignore_ascii_case("uniform") => HyperparamKind::Uniform,
            _ => HyperparamKind::Categorical,
        })
    }
}

impl HyperparamKind {
    /// Label used in the sweep description table.
    pub fn label(&self) -> &'static str {
        match self {
            HyperparamKind::Uniform => "Continuous",
            HyperparamKind::Categorical => "Discrete",
        }
    }
}

/// Schema entry for one sampled hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparamSpec {
    #[serde(default)]
    pub hyp_type: HyperparamKind,
    /// Human-readable sampler, e.g. `Uniform(0.0001, 0.1)` or `Choice[16, 32]`.
    pub hyp_desc: String,
}

/// Hyperparameter names (in declaration order) and their sampling specs.
pub type HyperparamSchema = OrderedMap<HyperparamSpec>;

/// Values drawn for one run, keyed by hyperparameter name.
pub type SampledHyperparams = OrderedMap<serde_json::Value>;

/// Sweep configuration as written next to the run logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub main_script_name: String,
    pub max_runs: u64,
    #[serde(
        default,
        deserialize_with = "deserialize_marker_metric",
        serialize_with = "serialize_marker_metric"
    )]
    pub optimization_metric: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_marker_goal",
        serialize_with = "serialize_marker_goal"
    )]
    pub optimization_goal: Option<OptimizationGoal>,
    pub hyperparameters: HyperparamSchema,
    #[serde(default)]
    pub sampled_hyperparameters: Vec<SampledHyperparams>,
}

fn deserialize_marker_metric<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|m| m != NOT_APPLICABLE && !m.is_empty()))
}

fn serialize_marker_metric<S: Serializer>(
    metric: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(metric.as_deref().unwrap_or(NOT_APPLICABLE))
}

fn deserialize_marker_goal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<OptimizationGoal>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("") | Some(NOT_APPLICABLE) => Ok(None),
        Some("max") => Ok(Some(OptimizationGoal::Max)),
        Some("min") => Ok(Some(OptimizationGoal::Min)),
        Some(other) => {
            warn!(goal = other, "Unknown optimization goal, minimizing");
            Ok(Some(OptimizationGoal::Min))
        }
    }
}

fn serialize_marker_goal<S: Serializer>(
    goal: &Option<OptimizationGoal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(goal.map(|g| g.as_str()).unwrap_or(NOT_APPLICABLE))
}

/// One metric as logged by a sweep run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunMetric {
    /// Regular `{time, step, value}` samples.
    Series(MetricSeries),
    /// A bare final value (number, marker string, or a one-element list of one).
    Scalar(serde_json::Value),
}

impl RunMetric {
    pub fn as_series(&self) -> Option<&MetricSeries> {
        match self {
            RunMetric::Series(s) => Some(s),
            RunMetric::Scalar(_) => None,
        }
    }

    /// Number of logged values.
    pub fn value_count(&self) -> usize {
        match self {
            RunMetric::Series(s) => s.len(),
            RunMetric::Scalar(serde_json::Value::Array(items)) => items.len(),
            RunMetric::Scalar(_) => 1,
        }
    }
}

/// Metric log of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepRunLog {
    metrics: OrderedMap<RunMetric>,
}

impl SweepRunLog {
    pub fn new(metrics: OrderedMap<RunMetric>) -> Self {
        Self { metrics }
    }

    pub fn metric(&self, name: &str) -> Option<&RunMetric> {
        self.metrics.get(name)
    }

    pub fn series(&self, name: &str) -> Option<&MetricSeries> {
        self.metric(name).and_then(RunMetric::as_series)
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys()
    }

    /// Fill an absent metric with the zero placeholder series. Returns `true`
    /// if the run was missing the metric.
    pub fn backfill(&mut self, name: &str) -> bool {
        if self.metrics.contains_key(name) {
            return false;
        }
        self.metrics
            .insert(name, RunMetric::Series(MetricSeries::placeholder()));
        true
    }
}

/// Raw `/get_sweep_data/{id}` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepData {
    pub sweep_config: SweepConfig,
    #[serde(default)]
    pub experiment_data: Vec<SweepRunLog>,
}

/// One row of the hyperparameter description table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HyperparamRow {
    pub name: String,
    pub kind: String,
    pub description: String,
}

/// Display form of a sweep configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepSummary {
    pub main_script_name: String,
    pub max_runs: String,
    pub optimization_metric: String,
    pub optimization_goal: String,
    pub hyperparameters: Vec<HyperparamRow>,
}

impl SweepSummary {
    pub fn from_config(config: &SweepConfig) -> Self {
        let hyperparameters = config
            .hyperparameters
            .iter()
            .map(|(name, spec)| HyperparamRow {
                name: name.to_string(),
                kind: spec.hyp_type.label().to_string(),
                description: spec.hyp_desc.clone(),
            })
            .collect();
        Self {
            main_script_name: config.main_script_name.clone(),
            max_runs: config.max_runs.to_string(),
            optimization_metric: config
                .optimization_metric
                .clone()
                .unwrap_or_else(|| NO_EARLY_STOPPING.to_string()),
            optimization_goal: config
                .optimization_goal
                .map(|g| g.to_string())
                .unwrap_or_else(|| NO_EARLY_STOPPING.to_string()),
            hyperparameters,
        }
    }
}
