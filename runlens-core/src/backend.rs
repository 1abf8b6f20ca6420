//! Backend collaborator serving experiment and sweep logs.
//!
//! [`HttpBackend`] talks to the log server over HTTP; [`MockBackend`] serves
//! canned payloads for tests and offline demos.

use crate::config::BackendConfig;
use crate::error::FetchError;
use crate::series::ExperimentPayload;
use crate::sweep::SweepData;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Read-only source of logged runs.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Metric map of one experiment.
    async fn experiment_data(&self, id: &str) -> Result<ExperimentPayload, FetchError>;

    /// Configuration and run logs of one sweep.
    async fn sweep_data(&self, id: &str) -> Result<SweepData, FetchError>;
}

/// HTTP client for `GET /get_experiment_data/{id}` and `GET /get_sweep_data/{id}`.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| FetchError::Connection {
            message: format!("Invalid backend URL '{}': {}", config.base_url, e),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| FetchError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/{route}/{percent-encoded id}`.
    pub fn endpoint(&self, route: &str, id: &str) -> Result<Url, FetchError> {
        let path = format!("{}/{}", route, urlencoding::encode(id));
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(&path).map_err(|e| FetchError::Connection {
            message: format!("Failed to build URL for '{}': {}", id, e),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, route: &str, id: &str) -> Result<T, FetchError> {
        let url = self.endpoint(route, id)?;
        debug!(url = %url, "Fetching logs");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { id: id.to_string() });
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                id: id.to_string(),
                status: status.as_u16(),
            });
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        serde_json::from_str(&body_text).map_err(|e| FetchError::Decode {
            id: id.to_string(),
            message: e.to_string(),
        })
    }

    fn map_transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            FetchError::Connection {
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn experiment_data(&self, id: &str) -> Result<ExperimentPayload, FetchError> {
        self.get_json("get_experiment_data", id).await
    }

    async fn sweep_data(&self, id: &str) -> Result<SweepData, FetchError> {
        self.get_json("get_sweep_data", id).await
    }
}

/// In-memory backend. Unknown ids answer `NotFound`.
#[derive(Default)]
pub struct MockBackend {
    experiments: Mutex<HashMap<String, ExperimentPayload>>,
    sweeps: Mutex<HashMap<String, SweepData>>,
    requests: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_experiment(self, id: &str, payload: ExperimentPayload) -> Self {
        lock(&self.experiments).insert(id.to_string(), payload);
        self
    }

    pub fn with_sweep(self, id: &str, data: SweepData) -> Self {
        lock(&self.sweeps).insert(id.to_string(), data);
        self
    }

    /// Ids requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Backend for MockBackend {
    async fn experiment_data(&self, id: &str) -> Result<ExperimentPayload, FetchError> {
        lock(&self.requests).push(id.to_string());
        lock(&self.experiments)
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound { id: id.to_string() })
    }

    async fn sweep_data(&self, id: &str) -> Result<SweepData, FetchError> {
        lock(&self.requests).push(id.to_string());
        lock(&self.sweeps)
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base_url: &str) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url: base_url.to_string(),
            ..BackendConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_encodes_id() {
        let b = backend("http://127.0.0.1:5000");
        let url = b.endpoint("get_experiment_data", "run 1/a").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/get_experiment_data/run%201%2Fa"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let b = backend("http://logs.internal/tracking");
        let url = b.endpoint("get_sweep_data", "sweep-3").unwrap();
        assert_eq!(url.as_str(), "http://logs.internal/tracking/get_sweep_data/sweep-3");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpBackend::new(&BackendConfig {
            base_url: "::nope".to_string(),
            ..BackendConfig::default()
        });
        assert!(matches!(result, Err(FetchError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_mock_backend() {
        let payload: ExperimentPayload = serde_json::from_str(r#"{"loss": []}"#).unwrap();
        let mock = MockBackend::new().with_experiment("a", payload);

        let got = mock.experiment_data("a").await.unwrap();
        assert!(got.contains_key("loss"));
        let err = mock.experiment_data("b").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(mock.sweep_data("a").await.is_err());
        assert_eq!(mock.requests(), vec!["a", "b", "a"]);
    }
}
