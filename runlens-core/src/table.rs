//! Run table for the current sweep page.

use crate::best_value::BestValue;
use crate::sweep::{HyperparamSchema, NOT_APPLICABLE, SampledHyperparams};
use serde::{Deserialize, Serialize};

/// Header plus rows of display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableSpec {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }
}

/// Build the table for one page of runs.
///
/// `first_run_number` is the 1-based number of `page_runs[0]` within the
/// whole sweep. `best_values` is indexed like `page_runs`; the best column
/// only appears when early stopping ran and a metric is set.
pub fn build_run_table(
    schema: &HyperparamSchema,
    optimization_metric: Option<&str>,
    early_stopping: bool,
    first_run_number: usize,
    page_runs: &[SampledHyperparams],
    best_values: &[BestValue],
) -> TableSpec {
    let best_metric = optimization_metric.filter(|_| early_stopping);

    let mut headers = vec!["Run number".to_string()];
    if let Some(metric) = best_metric {
        headers.push(format!("Best {metric}"));
    }
    headers.extend(schema.keys().map(str::to_string));

    let rows = page_runs
        .iter()
        .enumerate()
        .map(|(i, sampled)| {
            let mut row = vec![format!("Run {}", first_run_number + i)];
            if best_metric.is_some() {
                let best = best_values.get(i).copied().unwrap_or(BestValue::Unavailable);
                row.push(format_best_value(best));
            }
            row.extend(schema.keys().map(|name| {
                sampled
                    .get(name)
                    .map_or_else(|| NOT_APPLICABLE.to_string(), format_hyperparam)
            }));
            row
        })
        .collect();

    TableSpec { headers, rows }
}

/// Display a sampled hyperparameter value.
///
/// Anything that reads as a number prints as an integer when that loses
/// nothing, else in exponential form with five fractional digits. Other
/// values print as-is.
pub fn format_hyperparam(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return i.to_string();
            }
            if let Some(u) = n.as_u64() {
                return u.to_string();
            }
            n.as_f64().map_or_else(|| n.to_string(), format_number)
        }
        serde_json::Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) => format_number(v),
            Err(_) => s.clone(),
        },
        serde_json::Value::Null => NOT_APPLICABLE.to_string(),
        other => other.to_string(),
    }
}

fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        to_exponential(v, 5)
    }
}

/// Best value cell: three fractional digits in exponential form, or `/`.
pub fn format_best_value(best: BestValue) -> String {
    match best {
        BestValue::Value(v) => to_exponential(v, 3),
        BestValue::Unavailable => NOT_APPLICABLE.to_string(),
    }
}

/// Exponential notation with an explicitly signed exponent: `1.23450e-3`,
/// `4.200e+1`.
pub fn to_exponential(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let formatted = format!("{value:.digits$e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => formatted,
    }
}
