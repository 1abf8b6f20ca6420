//! Integration tests for the dashboard REST API.

use axum::body::Body;
use pretty_assertions::assert_eq;
use runlens_core::backend::MockBackend;
use runlens_core::config::ViewerConfig;
use runlens_ui::{Dashboard, SharedDashboard, router};
use std::sync::Arc;
use tower::ServiceExt;

fn mock_backend() -> MockBackend {
    MockBackend::new()
        .with_experiment(
            "exp-a",
            serde_json::from_str(
                r#"{"loss": [{"time": 1, "step": 0, "value": 0.5}, {"time": 65, "step": 1, "value": 0.25}]}"#,
            )
            .unwrap(),
        )
        .with_experiment(
            "exp-b",
            serde_json::from_str(r#"{"acc": [{"time": 2, "step": 0, "value": 0.7}]}"#).unwrap(),
        )
        .with_sweep(
            "sweep-1",
            serde_json::from_str(
                r#"{
                    "sweep_config": {
                        "main_script_name": "train.py",
                        "max_runs": 6,
                        "optimization_metric": "val_loss",
                        "optimization_goal": "min",
                        "hyperparameters": {
                            "lr": {"hyp_type": "uniform", "hyp_desc": "Uniform(0.0001, 0.1)"},
                            "optimizer": {"hyp_type": "choice", "hyp_desc": "Choice[adam, sgd]"}
                        },
                        "sampled_hyperparameters": [
                            {"lr": 0.01, "optimizer": "adam"},
                            {"lr": 0.02, "optimizer": "sgd"},
                            {"lr": 0.03, "optimizer": "adam"},
                            {"lr": 0.04, "optimizer": "sgd"},
                            {"lr": 0.05, "optimizer": "adam"},
                            {"lr": 0.06, "optimizer": "sgd"}
                        ]
                    },
                    "experiment_data": [
                        {"val_loss": [{"time": 1, "step": 0, "value": 0.9}, {"time": 2, "step": 1, "value": 0.4}]},
                        {"val_loss": [{"time": 1, "step": 0, "value": 0.8}]},
                        {"val_loss": [{"time": 1, "step": 0, "value": 0.7}]},
                        {"val_loss": [{"time": 1, "step": 0, "value": 0.6}]},
                        {"val_loss": [{"time": 1, "step": 0, "value": 0.5}]},
                        {"train_loss": [{"time": 1, "step": 0, "value": 1.5}]}
                    ]
                }"#,
            )
            .unwrap(),
        )
}

fn make_dashboard() -> SharedDashboard {
    Dashboard::new(Arc::new(mock_backend()), &ViewerConfig::default()).shared()
}

fn make_request(uri: &str) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn make_post_request(uri: &str, body: serde_json::Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn send(
    dashboard: SharedDashboard,
    request: axum::http::Request<Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    let app = router(dashboard);
    let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(app, request)
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

async fn post(
    dashboard: &SharedDashboard,
    uri: &str,
    body: serde_json::Value,
) -> (axum::http::StatusCode, serde_json::Value) {
    send(dashboard.clone(), make_post_request(uri, body)).await
}

// --- /health ---

#[tokio::test]
async fn test_health() {
    let (status, json) = send(make_dashboard(), make_request("/health")).await;
    assert_eq!(status, 200);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["experiment_charts"], 0);
}

// --- /api/experiments ---

#[tokio::test]
async fn test_open_experiments_selects_first() {
    let dashboard = make_dashboard();
    let (status, json) = post(
        &dashboard,
        "/api/experiments/open",
        serde_json::json!({"ids": ["exp-a", "exp-b"]}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["mode"], "single");
    assert_eq!(json["selected_ids"], serde_json::json!(["exp-a"]));
    assert_eq!(json["controls"][0]["radio"], true);
    assert_eq!(json["controls"][1]["checkbox"], false);
    assert_eq!(json["charts"][0]["panel"], "loss");

    let tooltip = &json["charts"][0]["config"]["options"]["plugins"]["tooltip"]["text"][0][1];
    assert_eq!(tooltip["label"], "1m 5s  Step: 1");
    assert_eq!(tooltip["title"], "loss: 0.250");
}

#[tokio::test]
async fn test_open_experiments_empty_shows_placeholder() {
    let dashboard = make_dashboard();
    let (_, json) = post(&dashboard, "/api/experiments/open", serde_json::json!({"ids": []})).await;
    assert_eq!(json["placeholder"], "No experiment logs available.");
    assert_eq!(json["charts"], serde_json::json!([]));
}

#[tokio::test]
async fn test_toggle_into_compare_and_back() {
    let dashboard = make_dashboard();
    post(
        &dashboard,
        "/api/experiments/open",
        serde_json::json!({"ids": ["exp-a", "exp-b"]}),
    )
    .await;

    let (_, json) = post(
        &dashboard,
        "/api/experiments/toggle",
        serde_json::json!({"id": "exp-b", "checked": true}),
    )
    .await;
    assert_eq!(json["mode"], "compare");
    assert_eq!(json["metrics"], serde_json::json!(["loss", "acc"]));
    assert_eq!(json["controls"][0]["radio"], false);
    let acc = &json["charts"][1]["config"]["data"]["datasets"];
    assert_eq!(acc[0]["label"], "exp-a");
    assert_eq!(acc[0]["data"], serde_json::json!([{"x": 0, "y": 0.0}]));
    assert_eq!(acc[1]["data"], serde_json::json!([{"x": 0, "y": 0.7}]));

    let (_, json) = post(
        &dashboard,
        "/api/experiments/toggle",
        serde_json::json!({"id": "exp-a", "checked": false}),
    )
    .await;
    assert_eq!(json["mode"], "single");
    assert_eq!(json["selected_ids"], serde_json::json!(["exp-b"]));
    assert_eq!(json["controls"][1]["radio"], true);

    let (_, json) = post(
        &dashboard,
        "/api/experiments/toggle",
        serde_json::json!({"id": "exp-b", "checked": false}),
    )
    .await;
    assert_eq!(json["selected_ids"], serde_json::json!([]));
    assert_eq!(json["charts"], serde_json::json!([]));
}

#[tokio::test]
async fn test_choose_experiment() {
    let dashboard = make_dashboard();
    post(
        &dashboard,
        "/api/experiments/open",
        serde_json::json!({"ids": ["exp-a", "exp-b"]}),
    )
    .await;
    let (_, json) = post(
        &dashboard,
        "/api/experiments/choose",
        serde_json::json!({"id": "exp-b"}),
    )
    .await;
    assert_eq!(json["selected_ids"], serde_json::json!(["exp-b"]));

    let (status, json) = send(dashboard, make_request("/api/experiments")).await;
    assert_eq!(status, 200);
    assert_eq!(json["selected_ids"], serde_json::json!(["exp-b"]));
}

// --- /api/sweeps ---

#[tokio::test]
async fn test_open_sweep_builds_table_and_chart() {
    let dashboard = make_dashboard();
    let (status, json) = post(
        &dashboard,
        "/api/sweeps/open",
        serde_json::json!({"ids": ["sweep-1"]}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["selected"], "sweep-1");
    assert_eq!(json["early_stopping"], true);
    assert_eq!(
        json["table"]["headers"],
        serde_json::json!(["Run number", "Best val_loss", "lr", "optimizer"])
    );
    assert_eq!(
        json["table"]["rows"][0],
        serde_json::json!(["Run 1", "4.000e-1", "1.00000e-2", "adam"])
    );
    assert_eq!(json["pager"]["max_page"], 2);
    assert_eq!(json["summary"]["optimization_goal"], "min");
    assert_eq!(json["summary"]["hyperparameters"][1]["kind"], "Discrete");
    assert_eq!(json["chart"]["config"]["data"]["datasets"][0]["label"], "Run 1");
    assert!(json["table_html"].as_str().unwrap().contains("<th>Best val_loss</th>"));
}

#[tokio::test]
async fn test_sweep_paging() {
    let dashboard = make_dashboard();
    post(&dashboard, "/api/sweeps/open", serde_json::json!({"ids": ["sweep-1"]})).await;

    let (_, json) = post(&dashboard, "/api/sweeps/page", serde_json::json!({"delta": "next"})).await;
    assert_eq!(json["pager"]["current_page"], 2);
    assert_eq!(json["pager"]["next_disabled"], true);
    assert_eq!(json["table"]["rows"][0][0], "Run 6");
    assert_eq!(json["table"]["rows"][0][1], "/");
    let datasets = &json["chart"]["config"]["data"]["datasets"];
    assert_eq!(datasets[0]["label"], "Run 6");
    assert_eq!(datasets[0]["data"], serde_json::json!([{"x": 0, "y": 0.0}]));

    let (_, json) = post(&dashboard, "/api/sweeps/page", serde_json::json!({"delta": "next"})).await;
    assert_eq!(json["pager"]["current_page"], 2);

    let (_, json) = post(
        &dashboard,
        "/api/sweeps/page",
        serde_json::json!({"delta": "previous"}),
    )
    .await;
    assert_eq!(json["pager"]["current_page"], 1);
    assert_eq!(json["pager"]["prev_disabled"], true);
}

#[tokio::test]
async fn test_sweep_metric_switch() {
    let dashboard = make_dashboard();
    post(&dashboard, "/api/sweeps/open", serde_json::json!({"ids": ["sweep-1"]})).await;

    let (status, json) = post(
        &dashboard,
        "/api/sweeps/metric",
        serde_json::json!({"metric": "train_loss"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(json["current_metric"], "train_loss");
    assert_eq!(json["chart"]["config"]["options"]["plugins"]["title"]["text"], "train_loss");

    let (status, json) = post(
        &dashboard,
        "/api/sweeps/metric",
        serde_json::json!({"metric": "bogus"}),
    )
    .await;
    assert_eq!(status, 400);
    assert!(json["error"].as_str().unwrap().contains("bogus"));
}

#[tokio::test]
async fn test_select_missing_sweep() {
    let dashboard = make_dashboard();
    post(
        &dashboard,
        "/api/sweeps/open",
        serde_json::json!({"ids": ["sweep-1", "sweep-gone"]}),
    )
    .await;
    let (status, json) = post(
        &dashboard,
        "/api/sweeps/select",
        serde_json::json!({"id": "sweep-gone"}),
    )
    .await;
    assert_eq!(status, 200);
    assert!(json["selected"].is_null());
    assert!(json["last_error"].as_str().is_some());

    let (_, json) = send(dashboard, make_request("/api/sweeps")).await;
    assert_eq!(json["sweep_ids"], serde_json::json!(["sweep-1", "sweep-gone"]));
}
