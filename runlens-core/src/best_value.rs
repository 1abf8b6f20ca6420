//! Best observed value of a sweep's optimization metric.

use crate::sweep::{OptimizationGoal, RunMetric, SweepRunLog};
use serde::{Serialize, Serializer};

/// Outcome of [`resolve`]: a number, or nothing usable for this run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BestValue {
    Value(f64),
    Unavailable,
}

impl BestValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BestValue::Value(v) => Some(*v),
            BestValue::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, BestValue::Value(_))
    }
}

impl Serialize for BestValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BestValue::Value(v) => serializer.serialize_f64(*v),
            BestValue::Unavailable => serializer.serialize_str(crate::sweep::NOT_APPLICABLE),
        }
    }
}

/// Best value of `metric` in one run under `goal`.
///
/// An unset goal picks the minimum, as does `Min`.
pub fn resolve(run: &SweepRunLog, metric: &str, goal: Option<OptimizationGoal>) -> BestValue {
    match run.metric(metric) {
        None => BestValue::Unavailable,
        Some(RunMetric::Scalar(value)) => scalar_value(value),
        Some(RunMetric::Series(series)) => {
            let values = series.values();
            match values {
                [] => BestValue::Unavailable,
                [only] => BestValue::Value(*only),
                _ => {
                    let best = if goal == Some(OptimizationGoal::Max) {
                        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                    } else {
                        values.iter().copied().fold(f64::INFINITY, f64::min)
                    };
                    BestValue::Value(best)
                }
            }
        }
    }
}

fn scalar_value(value: &serde_json::Value) -> BestValue {
    match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(BestValue::Value)
            .unwrap_or(BestValue::Unavailable),
        serde_json::Value::Array(items) if items.len() == 1 => scalar_value(&items[0]),
        _ => BestValue::Unavailable,
    }
}

/// Early stopping is considered active for a sweep iff some run logged more
/// than one value of the optimization metric.
pub fn early_stopping_active(runs: &[SweepRunLog], metric: Option<&str>) -> bool {
    let Some(metric) = metric else {
        return false;
    };
    runs.iter()
        .filter_map(|run| run.metric(metric))
        .any(|m| matches!(m, RunMetric::Series(s) if s.len() > 1))
}
