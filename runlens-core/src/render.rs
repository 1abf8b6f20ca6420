//! Server-side rendering of chart and table specs.
//!
//! Charts become Chart.js line configs; tables become escaped HTML.

use crate::chart::ChartSpec;
use crate::table::TableSpec;
use serde_json::json;

/// Chart.js config for a line chart.
///
/// Points are `{x: step, y: value}` on a linear x-axis spanning
/// `[0, max_step]`. Tooltip text is pre-resolved under `options.plugins.tooltip.text`,
/// indexed `[dataset][point]`, so the page needs no formatting logic.
pub fn chart_config(spec: &ChartSpec) -> serde_json::Value {
    let datasets: Vec<serde_json::Value> = spec
        .datasets
        .iter()
        .map(|ds| {
            let points: Vec<serde_json::Value> = ds
                .points()
                .map(|(step, value)| json!({ "x": step, "y": value }))
                .collect();
            json!({
                "label": ds.label,
                "data": points,
                "borderColor": ds.border_color,
                "backgroundColor": ds.border_color,
                "borderWidth": ds.border_width,
            })
        })
        .collect();

    json!({
        "type": "line",
        "data": {
            "datasets": datasets,
        },
        "options": {
            "animation": { "duration": spec.animation_ms },
            "scales": {
                "x": {
                    "type": "linear",
                    "min": 0,
                    "max": spec.max_step,
                },
                "y": { "beginAtZero": true },
            },
            "elements": {
                "point": { "radius": spec.point_radius },
            },
            "plugins": {
                "title": {
                    "display": true,
                    "text": spec.title,
                },
                "legend": { "display": true },
                "tooltip": {
                    "displayColors": false,
                    "titleAlign": "center",
                    "footerFontStyle": "normal",
                    "text": spec.tooltips(),
                },
            },
        },
    })
}

/// [`chart_config`] as a pretty-printed JSON string.
pub fn render_chart_config(spec: &ChartSpec) -> String {
    serde_json::to_string_pretty(&chart_config(spec)).unwrap_or_else(|_| "{}".into())
}

/// Render a TableSpec to an HTML table string.
pub fn render_table_html(spec: &TableSpec) -> String {
    let mut html = String::from("<table class=\"runs-table\">\n<thead><tr>\n");
    for header in &spec.headers {
        html.push_str(&format!("  <th>{}</th>\n", escape_html(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &spec.rows {
        html.push_str("<tr>\n");
        for cell in row {
            html.push_str(&format!("  <td>{}</td>\n", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
